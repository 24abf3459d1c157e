use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    PendingStaff,
    PendingUser,
    Closed,
    WithSupervisor,
    Escalated,
    Deleted,
}

impl TicketStatus {
    pub fn level(self) -> i64 {
        match self {
            TicketStatus::New => 0,
            TicketStatus::PendingStaff => 1,
            TicketStatus::PendingUser => 2,
            TicketStatus::Closed => 3,
            TicketStatus::WithSupervisor => 4,
            TicketStatus::Escalated => 5,
            TicketStatus::Deleted => 6,
        }
    }

    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(TicketStatus::New),
            1 => Some(TicketStatus::PendingStaff),
            2 => Some(TicketStatus::PendingUser),
            3 => Some(TicketStatus::Closed),
            4 => Some(TicketStatus::WithSupervisor),
            5 => Some(TicketStatus::Escalated),
            6 => Some(TicketStatus::Deleted),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TicketStatus::New => "New",
            TicketStatus::PendingStaff => "Pending Staff Response",
            TicketStatus::PendingUser => "Pending User Response",
            TicketStatus::Closed => "Resolved/Closed",
            TicketStatus::WithSupervisor => "With Supervisor",
            TicketStatus::Escalated => "Escalated/Urgent",
            TicketStatus::Deleted => "Deleted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
    VeryHigh,
    Severe,
    Critical,
}

impl Urgency {
    pub fn level(self) -> i64 {
        match self {
            Urgency::Low => 0,
            Urgency::Medium => 1,
            Urgency::High => 2,
            Urgency::VeryHigh => 3,
            Urgency::Severe => 4,
            Urgency::Critical => 5,
        }
    }

    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(Urgency::Low),
            1 => Some(Urgency::Medium),
            2 => Some(Urgency::High),
            3 => Some(Urgency::VeryHigh),
            4 => Some(Urgency::Severe),
            5 => Some(Urgency::Critical),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Urgency::Low => "Low",
            Urgency::Medium => "Medium",
            Urgency::High => "High",
            Urgency::VeryHigh => "Very High",
            Urgency::Severe => "Severe",
            Urgency::Critical => "Critical",
        }
    }

    /// Anything above High is flagged for the renderer.
    pub fn is_highlighted(self) -> bool {
        self > Urgency::High
    }
}

/// One ticket as selected for a listing block.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TicketRecord {
    pub id: i64,
    pub dept_id: i64,
    pub dept_name: String,
    pub subject: String,
    pub status: i64,
    pub urgency: i64,
    pub private: bool,
    pub member_started: i64,
    pub member_updated: i64,
    pub member_assigned: i64,
    pub starter_name: String,
    pub respondent_name: String,
    pub num_replies: i64,
    pub deleted_replies: i64,
    pub last_msg_id: i64,
    pub last_read_msg_id: i64,
    pub last_updated: String,
}

/// Fields needed to insert a ticket.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub dept_id: i64,
    pub subject: String,
    pub status: TicketStatus,
    pub urgency: Urgency,
    pub private: bool,
    pub member_started: i64,
    pub member_updated: i64,
    pub member_assigned: i64,
    pub starter_name: String,
    pub respondent_name: String,
    pub num_replies: i64,
    pub deleted_replies: i64,
    pub last_msg_id: i64,
    pub last_updated: String,
}

impl NewTicket {
    pub fn new(dept_id: i64, subject: &str, status: TicketStatus, member_started: i64) -> Self {
        NewTicket {
            dept_id,
            subject: subject.to_string(),
            status,
            urgency: Urgency::Low,
            private: false,
            member_started,
            member_updated: member_started,
            member_assigned: 0,
            starter_name: String::new(),
            respondent_name: String::new(),
            num_replies: 0,
            deleted_replies: 0,
            last_msg_id: 1,
            last_updated: "2024-01-01T00:00:00".to_string(),
        }
    }
}

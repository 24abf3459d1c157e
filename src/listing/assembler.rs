use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use super::actions::{ActionContext, TicketAction, permitted_actions};
use super::prefix::PrefixLink;
use crate::models::member::Identity;
use crate::models::ticket::{TicketRecord, TicketStatus, Urgency};

pub const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    /// Profile link, only for members the directory knows.
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelLabel {
    pub level: i64,
    pub label: String,
    pub highlight: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeptTag {
    pub id: i64,
    pub name: String,
}

/// A listed ticket, decorated for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketRow {
    pub id: i64,
    pub display_id: String,
    pub dept: Option<DeptTag>,
    pub subject: String,
    /// Subject without any custom field prefix.
    pub raw_subject: String,
    pub prefix_links: Vec<PrefixLink>,
    pub status: LevelLabel,
    pub urgency: LevelLabel,
    pub starter: Person,
    pub assigned: Person,
    pub respondent: Person,
    pub is_unread: bool,
    pub private: bool,
    pub actions: Vec<TicketAction>,
    pub num_replies: i64,
    pub all_replies: i64,
    pub last_updated: String,
}

pub fn display_id(id: i64, zerofill: usize) -> String {
    format!("{id:0zerofill$}")
}

/// Human-readable timestamp; unparseable values pass through untouched.
pub fn format_updated(raw: &str) -> String {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.format("%B %d, %Y, %I:%M:%S %p").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn status_label(level: i64) -> LevelLabel {
    let label = TicketStatus::from_level(level).map(|s| s.label()).unwrap_or("Unknown");
    LevelLabel { level, label: label.to_string(), highlight: false }
}

fn urgency_label(level: i64) -> LevelLabel {
    match Urgency::from_level(level) {
        Some(u) => LevelLabel { level, label: u.label().to_string(), highlight: u.is_highlighted() },
        None => LevelLabel { level, label: "Unknown".to_string(), highlight: false },
    }
}

/// Settings that shape every row of a listing.
pub struct RowOptions {
    pub zerofill: usize,
    /// Tag rows with their department (multi-department mode with no department selected).
    pub show_dept: bool,
}

/// Build a row from cached names; identities are applied afterwards in one batch.
pub fn decorate(record: &TicketRecord, opts: &RowOptions, actions: &ActionContext<'_>) -> TicketRow {
    TicketRow {
        id: record.id,
        display_id: display_id(record.id, opts.zerofill),
        dept: opts.show_dept.then(|| DeptTag { id: record.dept_id, name: record.dept_name.clone() }),
        subject: record.subject.clone(),
        raw_subject: record.subject.clone(),
        prefix_links: vec![],
        status: status_label(record.status),
        urgency: urgency_label(record.urgency),
        starter: Person { id: record.member_started, name: record.starter_name.clone(), link: None },
        assigned: Person { id: record.member_assigned, name: String::new(), link: None },
        respondent: Person { id: record.member_updated, name: record.respondent_name.clone(), link: None },
        is_unread: record.last_msg_id > record.last_read_msg_id,
        private: record.private,
        actions: permitted_actions(actions, record),
        num_replies: record.num_replies,
        all_replies: record.num_replies + record.deleted_replies,
        last_updated: format_updated(&record.last_updated),
    }
}

/// Every member id worth resolving, deduplicated.
pub fn member_ids<'a>(rows: impl IntoIterator<Item = &'a TicketRow>) -> Vec<i64> {
    let mut ids = BTreeSet::new();
    for row in rows {
        ids.extend([row.starter.id, row.assigned.id, row.respondent.id]);
    }
    ids.remove(&0);
    ids.into_iter().collect()
}

/// Swap cached names for directory identities where the directory knows the member.
pub fn apply_identities(row: &mut TicketRow, identities: &HashMap<i64, Identity>) {
    if let Some(found) = identities.get(&row.starter.id) {
        row.starter.name = found.name.clone();
        row.starter.link = Some(found.profile_link.clone());
    }

    match identities.get(&row.assigned.id).filter(|_| row.assigned.id != 0) {
        Some(found) => {
            row.assigned.name = found.name.clone();
            row.assigned.link = Some(found.profile_link.clone());
        }
        None => {
            row.assigned.name = UNASSIGNED.to_string();
            row.assigned.link = None;
        }
    }

    if row.respondent.id != 0 {
        if let Some(found) = identities.get(&row.respondent.id) {
            row.respondent.name = found.name.clone();
            row.respondent.link = Some(found.profile_link.clone());
        }
    }
}

use serde::Serialize;
use std::str::FromStr;

use super::ListingContext;
use crate::errors::AppError;
use crate::models::ticket::{BlockPredicate, TicketStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKey {
    Assigned,
    New,
    Staff,
    User,
    Closed,
    Recycle,
    WithDeleted,
}

impl BlockKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKey::Assigned => "assigned",
            BlockKey::New => "new",
            BlockKey::Staff => "staff",
            BlockKey::User => "user",
            BlockKey::Closed => "closed",
            BlockKey::Recycle => "recycle",
            BlockKey::WithDeleted => "withdeleted",
        }
    }
}

impl FromStr for BlockKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assigned" => Ok(BlockKey::Assigned),
            "new" => Ok(BlockKey::New),
            "staff" => Ok(BlockKey::Staff),
            "user" => Ok(BlockKey::User),
            "closed" => Ok(BlockKey::Closed),
            "recycle" => Ok(BlockKey::Recycle),
            "withdeleted" => Ok(BlockKey::WithDeleted),
            _ => Err(AppError::NotFound(format!("Block '{s}'"))),
        }
    }
}

/// Grid columns, in the order a block shows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    TicketId,
    TicketName,
    StartingUser,
    Replies,
    AllReplies,
    Assigned,
    Status,
    Urgency,
    Updated,
    LastReply,
    Actions,
}

/// A block before counting and planning.
#[derive(Debug, Clone)]
pub struct BlockDefinition {
    pub key: BlockKey,
    pub icon: &'static str,
    pub title: &'static str,
    pub predicate: BlockPredicate,
    pub display: bool,
    /// Shown even when it holds no tickets.
    pub required: bool,
    pub collapsed: bool,
    pub viewing_as_block: bool,
    pub columns: Vec<Column>,
}

impl BlockDefinition {
    fn new(key: BlockKey, icon: &'static str, title: &'static str, predicate: BlockPredicate) -> Self {
        BlockDefinition {
            key,
            icon,
            title,
            predicate,
            display: true,
            required: true,
            collapsed: false,
            viewing_as_block: false,
            columns: vec![],
        }
    }
}

pub fn columns_for(key: BlockKey, is_staff: bool) -> Vec<Column> {
    use Column::*;
    match key {
        BlockKey::Assigned => vec![TicketId, TicketName, StartingUser, Replies, Status, Urgency, Updated, Actions],
        BlockKey::New => vec![TicketId, TicketName, StartingUser, Assigned, Urgency, Updated, Actions],
        BlockKey::Staff => vec![TicketId, TicketName, StartingUser, Replies, Assigned, Urgency, Updated, Actions],
        BlockKey::User if is_staff => {
            vec![TicketId, TicketName, StartingUser, LastReply, Replies, Urgency, Updated, Actions]
        }
        BlockKey::User => vec![TicketId, TicketName, LastReply, Replies, Urgency, Updated, Actions],
        BlockKey::Closed => vec![TicketId, TicketName, StartingUser, Replies, Updated, Actions],
        BlockKey::Recycle | BlockKey::WithDeleted => {
            vec![TicketId, TicketName, StartingUser, AllReplies, Assigned, Updated, Actions]
        }
    }
}

fn home_blocks(is_staff: bool) -> Vec<BlockDefinition> {
    let staff_predicate = if is_staff {
        BlockPredicate::StatusNotAssignedToViewer(TicketStatus::PendingStaff)
    } else {
        // End users see new and pending-staff tickets together.
        BlockPredicate::StatusIn(vec![TicketStatus::New, TicketStatus::PendingStaff])
    };
    let user_predicate = if is_staff {
        BlockPredicate::StatusNotAssignedToViewer(TicketStatus::PendingUser)
    } else {
        BlockPredicate::StatusIn(vec![TicketStatus::PendingUser])
    };

    vec![
        BlockDefinition {
            display: is_staff,
            required: is_staff,
            ..BlockDefinition::new(BlockKey::Assigned, "assign.png", "Assigned to me", BlockPredicate::AssignedToViewer)
        },
        BlockDefinition {
            display: is_staff,
            required: false,
            ..BlockDefinition::new(
                BlockKey::New,
                "status.png",
                "New tickets",
                BlockPredicate::StatusNotAssignedToViewer(TicketStatus::New),
            )
        },
        BlockDefinition::new(BlockKey::Staff, "staff.png", "Pending staff response", staff_predicate),
        BlockDefinition::new(BlockKey::User, "user.png", "Pending user response", user_predicate),
    ]
}

/// Block layout for a listing context, with columns filled in.
pub fn blocks_for(context: ListingContext, is_staff: bool) -> Vec<BlockDefinition> {
    let mut blocks = match context {
        ListingContext::Home => home_blocks(is_staff),
        ListingContext::ViewBlock(target) => home_blocks(is_staff)
            .into_iter()
            .map(|mut block| {
                if block.key == target {
                    block.viewing_as_block = true;
                } else {
                    block.collapsed = true;
                }
                block
            })
            .collect(),
        ListingContext::Closed => vec![BlockDefinition::new(
            BlockKey::Closed,
            "resolved.png",
            "Resolved tickets",
            BlockPredicate::StatusIn(vec![TicketStatus::Closed]),
        )],
        ListingContext::RecycleBin => vec![
            BlockDefinition::new(
                BlockKey::Recycle,
                "recycle.png",
                "Deleted tickets",
                BlockPredicate::StatusIn(vec![TicketStatus::Deleted]),
            ),
            BlockDefinition::new(
                BlockKey::WithDeleted,
                "recycle.png",
                "Tickets with deleted replies",
                BlockPredicate::WithDeletedReplies,
            ),
        ],
    };
    for block in &mut blocks {
        block.columns = columns_for(block.key, is_staff);
    }
    blocks
}

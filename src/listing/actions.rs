use serde::Serialize;

use crate::auth::capability::{Capability, CapabilityChecker};
use crate::models::ticket::{TicketRecord, TicketStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketAction {
    MoveDept,
    Unresolve,
    Restore,
    PermaDelete,
    Assign,
    Reassign,
    AssignSelf,
    Unassign,
    Resolve,
    TicketToTopic,
    Delete,
}

/// Who is looking, and the site switches that gate some actions.
pub struct ActionContext<'a> {
    pub checker: &'a dyn CapabilityChecker,
    pub viewer: i64,
    pub multi_department: bool,
    pub helpdesk_only: bool,
}

impl ActionContext<'_> {
    fn can(&self, cap: Capability, dept: i64) -> bool {
        self.checker.has_capability(cap, Some(dept))
    }

    /// The "any" capability, or the "own" one on a ticket the viewer started.
    fn can_any_or_own(&self, any: Capability, own: Capability, dept: i64, is_own: bool) -> bool {
        self.can(any, dept) || (is_own && self.can(own, dept))
    }
}

/// Actions offered on a listed ticket, in display order.
pub fn permitted_actions(ctx: &ActionContext<'_>, ticket: &TicketRecord) -> Vec<TicketAction> {
    let dept = ticket.dept_id;
    let is_own = ticket.member_started == ctx.viewer;
    let mut actions = vec![];

    if ctx.multi_department
        && ctx.can_any_or_own(Capability::MoveDeptAny, Capability::MoveDeptOwn, dept, is_own)
    {
        actions.push(TicketAction::MoveDept);
    }

    match TicketStatus::from_level(ticket.status) {
        Some(TicketStatus::Closed) => {
            if ctx.can_any_or_own(Capability::UnresolveAny, Capability::UnresolveOwn, dept, is_own) {
                actions.push(TicketAction::Unresolve);
            }
        }
        Some(TicketStatus::Deleted) => {
            if ctx.can_any_or_own(Capability::RestoreAny, Capability::RestoreOwn, dept, is_own) {
                actions.push(TicketAction::Restore);
            }
            if ctx.can(Capability::DeleteRecycling, dept) {
                actions.push(TicketAction::PermaDelete);
            }
        }
        _ => {
            let assigned = ticket.member_assigned;
            if ctx.can(Capability::AssignAny, dept) {
                actions.push(if assigned == 0 { TicketAction::Assign } else { TicketAction::Reassign });
            } else if ctx.can(Capability::AssignOwn, dept) && (assigned == 0 || assigned == ctx.viewer) {
                actions.push(if assigned == ctx.viewer {
                    TicketAction::Unassign
                } else {
                    TicketAction::AssignSelf
                });
            }

            if ctx.can_any_or_own(Capability::ResolveAny, Capability::ResolveOwn, dept, is_own) {
                actions.push(TicketAction::Resolve);
            }

            let replies_visible = ticket.deleted_replies == 0
                || ctx.checker.has_capability(Capability::AccessRecycleBin, None);
            if !ctx.helpdesk_only && ctx.can(Capability::TicketToTopic, dept) && replies_visible {
                actions.push(TicketAction::TicketToTopic);
            }

            if ctx.can(Capability::DeleteAny, dept)
                || (is_own && ctx.checker.has_capability(Capability::DeleteOwn, None))
            {
                actions.push(TicketAction::Delete);
            }
        }
    }
    actions
}

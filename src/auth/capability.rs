use super::session::Permissions;

/// Helpdesk capabilities consulted by the listing and admin screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    AccessHelpdesk,
    Staff,
    Admin,
    ViewTicketAny,
    ViewClosedOwn,
    ViewClosedAny,
    AccessRecycleBin,
    MoveDeptAny,
    MoveDeptOwn,
    UnresolveAny,
    UnresolveOwn,
    RestoreAny,
    RestoreOwn,
    DeleteRecycling,
    AssignAny,
    AssignOwn,
    ResolveAny,
    ResolveOwn,
    TicketToTopic,
    DeleteAny,
    DeleteOwn,
}

impl Capability {
    pub fn code(self) -> &'static str {
        match self {
            Capability::AccessHelpdesk => "helpdesk.access",
            Capability::Staff => "helpdesk.staff",
            Capability::Admin => "helpdesk.admin",
            Capability::ViewTicketAny => "helpdesk.view_ticket_any",
            Capability::ViewClosedOwn => "helpdesk.view_closed_own",
            Capability::ViewClosedAny => "helpdesk.view_closed_any",
            Capability::AccessRecycleBin => "helpdesk.access_recyclebin",
            Capability::MoveDeptAny => "helpdesk.move_dept_any",
            Capability::MoveDeptOwn => "helpdesk.move_dept_own",
            Capability::UnresolveAny => "helpdesk.unresolve_any",
            Capability::UnresolveOwn => "helpdesk.unresolve_own",
            Capability::RestoreAny => "helpdesk.restore_any",
            Capability::RestoreOwn => "helpdesk.restore_own",
            Capability::DeleteRecycling => "helpdesk.delete_recycling",
            Capability::AssignAny => "helpdesk.assign_any",
            Capability::AssignOwn => "helpdesk.assign_own",
            Capability::ResolveAny => "helpdesk.resolve_any",
            Capability::ResolveOwn => "helpdesk.resolve_own",
            Capability::TicketToTopic => "helpdesk.ticket_to_topic",
            Capability::DeleteAny => "helpdesk.delete_any",
            Capability::DeleteOwn => "helpdesk.delete_own",
        }
    }
}

/// Answers "may the viewer do X (in department D)?".
pub trait CapabilityChecker {
    fn has_capability(&self, cap: Capability, dept: Option<i64>) -> bool;
}

impl CapabilityChecker for Permissions {
    fn has_capability(&self, cap: Capability, dept: Option<i64>) -> bool {
        self.has_in(cap.code(), dept)
    }
}

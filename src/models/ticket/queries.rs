use super::types::{NewTicket, TicketRecord, TicketStatus};
use crate::db::{DbPool, placeholders};
use crate::errors::AppError;

/// Row-selection rule of a listing block, relative to the viewing member.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockPredicate {
    /// Open tickets assigned to the viewer.
    AssignedToViewer,
    /// Tickets in `status` that someone other than the viewer holds.
    StatusNotAssignedToViewer(TicketStatus),
    StatusIn(Vec<TicketStatus>),
    /// Live tickets that had replies moved to the recycle bin.
    WithDeletedReplies,
}

#[derive(Debug, Clone, PartialEq)]
enum Param {
    Int(i64),
    Text(String),
}

impl BlockPredicate {
    fn to_sql(&self, viewer: i64) -> (String, Vec<Param>) {
        match self {
            BlockPredicate::AssignedToViewer => (
                "t.member_assigned = ? AND t.status NOT IN (?, ?)".to_string(),
                vec![
                    Param::Int(viewer),
                    Param::Int(TicketStatus::Closed.level()),
                    Param::Int(TicketStatus::Deleted.level()),
                ],
            ),
            BlockPredicate::StatusNotAssignedToViewer(status) => (
                "t.member_assigned != ? AND t.status = ?".to_string(),
                vec![Param::Int(viewer), Param::Int(status.level())],
            ),
            BlockPredicate::StatusIn(statuses) => (
                format!("t.status IN ({})", placeholders(statuses.len())),
                statuses.iter().map(|s| Param::Int(s.level())).collect(),
            ),
            BlockPredicate::WithDeletedReplies => (
                "t.status != ? AND t.deleted_replies > 0".to_string(),
                vec![Param::Int(TicketStatus::Deleted.level())],
            ),
        }
    }
}

/// Resolved ORDER BY for a block. `expr` comes from a fixed registry, never from input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TicketOrder {
    pub expr: &'static str,
    pub descending: bool,
}

/// Everything that narrows the ticket set for one block.
#[derive(Debug, Clone)]
pub struct TicketQuery<'a> {
    pub predicate: &'a BlockPredicate,
    pub viewer: i64,
    /// Without this the viewer only sees tickets they started.
    pub see_any: bool,
    pub dept: Option<i64>,
    /// (field id, raw value) equality on an active custom field.
    pub filter: Option<(i64, &'a str)>,
}

impl TicketQuery<'_> {
    fn where_clause(&self) -> (String, Vec<Param>) {
        let (predicate, mut params) = self.predicate.to_sql(self.viewer);
        let mut parts = vec![predicate];

        if !self.see_any {
            parts.push("t.member_started = ?".to_string());
            params.push(Param::Int(self.viewer));
        }
        if let Some(dept) = self.dept {
            parts.push("t.dept_id = ?".to_string());
            params.push(Param::Int(dept));
        }
        if let Some((field_id, value)) = self.filter {
            parts.push(
                "EXISTS (SELECT 1 FROM custom_field_values v \
                 JOIN custom_fields f ON f.id = v.field_id AND f.active = 1 \
                 WHERE v.ticket_id = t.id AND v.field_id = ? AND v.value = ?)"
                    .to_string(),
            );
            params.push(Param::Int(field_id));
            params.push(Param::Text(value.to_string()));
        }
        (parts.join(" AND "), params)
    }
}

pub async fn count(pool: &DbPool, query: &TicketQuery<'_>) -> Result<i64, AppError> {
    let (where_sql, params) = query.where_clause();
    let sql = format!("SELECT COUNT(*) FROM tickets t WHERE {where_sql}");
    let mut q = sqlx::query_scalar::<_, i64>(&sql);
    for p in params {
        q = match p {
            Param::Int(v) => q.bind(v),
            Param::Text(v) => q.bind(v),
        };
    }
    Ok(q.fetch_one(pool).await?)
}

/// One page of a block, joined with department name and the viewer's read marker.
pub async fn find_block_rows(
    pool: &DbPool,
    query: &TicketQuery<'_>,
    order: TicketOrder,
    start: i64,
    per_page: i64,
) -> Result<Vec<TicketRecord>, AppError> {
    let (where_sql, params) = query.where_clause();
    let dir = if order.descending { "DESC" } else { "ASC" };
    let sql = format!(
        "SELECT t.id, t.dept_id, d.name AS dept_name, t.subject, t.status, t.urgency, t.private, \
                t.member_started, t.member_updated, t.member_assigned, t.starter_name, \
                t.respondent_name, t.num_replies, t.deleted_replies, t.last_msg_id, \
                COALESCE(r.last_msg_id, 0) AS last_read_msg_id, t.last_updated \
         FROM tickets t \
         JOIN departments d ON d.id = t.dept_id \
         LEFT JOIN ticket_reads r ON r.ticket_id = t.id AND r.member_id = ? \
         LEFT JOIN members m_started ON m_started.id = t.member_started \
         LEFT JOIN members m_assigned ON m_assigned.id = t.member_assigned \
         LEFT JOIN members m_updated ON m_updated.id = t.member_updated \
         WHERE {where_sql} \
         ORDER BY {expr} {dir}, t.id {dir} \
         LIMIT ? OFFSET ?",
        expr = order.expr,
    );

    let mut q = sqlx::query_as::<_, TicketRecord>(&sql).bind(query.viewer);
    for p in params {
        q = match p {
            Param::Int(v) => q.bind(v),
            Param::Text(v) => q.bind(v),
        };
    }
    let rows = q.bind(per_page).bind(start).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn create(pool: &DbPool, ticket: &NewTicket) -> Result<i64, AppError> {
    let id = sqlx::query(
        "INSERT INTO tickets (dept_id, subject, status, urgency, private, member_started, \
             member_updated, member_assigned, starter_name, respondent_name, num_replies, \
             deleted_replies, last_msg_id, last_updated) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(ticket.dept_id)
    .bind(&ticket.subject)
    .bind(ticket.status.level())
    .bind(ticket.urgency.level())
    .bind(ticket.private)
    .bind(ticket.member_started)
    .bind(ticket.member_updated)
    .bind(ticket.member_assigned)
    .bind(&ticket.starter_name)
    .bind(&ticket.respondent_name)
    .bind(ticket.num_replies)
    .bind(ticket.deleted_replies)
    .bind(ticket.last_msg_id)
    .bind(&ticket.last_updated)
    .execute(pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

/// Record that `member_id` has read up to `last_msg_id`.
pub async fn mark_read(pool: &DbPool, ticket_id: i64, member_id: i64, last_msg_id: i64) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO ticket_reads (ticket_id, member_id, last_msg_id) VALUES (?, ?, ?) \
         ON CONFLICT(ticket_id, member_id) DO UPDATE SET last_msg_id = excluded.last_msg_id",
    )
    .bind(ticket_id)
    .bind(member_id)
    .bind(last_msg_id)
    .execute(pool)
    .await?;
    Ok(())
}

use serde::Serialize;
use serde_json::Value;

use crate::db::DbPool;
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: i64,
    pub action: String,
    pub target_type: String,
    pub target_id: i64,
    pub details: String,
    pub created_at: String,
}

/// Append an audit row. Failures are logged and swallowed so they never fail the caller.
pub async fn log(
    pool: &DbPool,
    user_id: i64,
    action: &str,
    target_type: &str,
    target_id: i64,
    details: Value,
) {
    let result = sqlx::query(
        "INSERT INTO audit_log (user_id, action, target_type, target_id, details) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(action)
    .bind(target_type)
    .bind(target_id)
    .bind(details.to_string())
    .execute(pool)
    .await;

    if let Err(e) = result {
        log::warn!("Failed to write audit entry {action} {target_type}#{target_id}: {e}");
    }
}

pub async fn find_for_target(
    pool: &DbPool,
    target_type: &str,
    target_id: i64,
) -> Result<Vec<AuditEntry>, AppError> {
    let entries = sqlx::query_as::<_, AuditEntry>(
        "SELECT id, user_id, action, target_type, target_id, details, created_at \
         FROM audit_log WHERE target_type = ? AND target_id = ? ORDER BY id",
    )
    .bind(target_type)
    .bind(target_id)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

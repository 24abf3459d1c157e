use sqlx::{Executor, Sqlite};
use std::collections::HashMap;

use crate::db::{DbPool, placeholders};
use crate::errors::AppError;

/// Raw values per ticket, keyed by field id.
pub type TicketValues = HashMap<i64, HashMap<i64, String>>;

pub async fn get(pool: &DbPool, ticket_id: i64, field_id: i64) -> Result<Option<String>, AppError> {
    let value = sqlx::query_scalar(
        "SELECT value FROM custom_field_values WHERE ticket_id = ? AND field_id = ?",
    )
    .bind(ticket_id)
    .bind(field_id)
    .fetch_optional(pool)
    .await?;
    Ok(value)
}

/// Insert or overwrite a value. Multi-select values are comma-joined keys.
pub async fn set(pool: &DbPool, ticket_id: i64, field_id: i64, value: &str) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO custom_field_values (ticket_id, field_id, value) VALUES (?, ?, ?) \
         ON CONFLICT(ticket_id, field_id) DO UPDATE SET value = excluded.value",
    )
    .bind(ticket_id)
    .bind(field_id)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// Fetch the values of `field_ids` for all `ticket_ids` in one query.
pub async fn batch_get(
    pool: &DbPool,
    ticket_ids: &[i64],
    field_ids: &[i64],
) -> Result<TicketValues, AppError> {
    let mut values = TicketValues::new();
    if ticket_ids.is_empty() || field_ids.is_empty() {
        return Ok(values);
    }
    let sql = format!(
        "SELECT ticket_id, field_id, value FROM custom_field_values \
         WHERE ticket_id IN ({}) AND field_id IN ({})",
        placeholders(ticket_ids.len()),
        placeholders(field_ids.len()),
    );
    let mut query = sqlx::query_as::<_, (i64, i64, String)>(&sql);
    for id in ticket_ids.iter().chain(field_ids) {
        query = query.bind(*id);
    }
    for (ticket_id, field_id, value) in query.fetch_all(pool).await? {
        values.entry(ticket_id).or_default().insert(field_id, value);
    }
    Ok(values)
}

/// Every recorded (field id, value) pair for the given fields, across all tickets.
pub async fn recorded_values(pool: &DbPool, field_ids: &[i64]) -> Result<Vec<(i64, String)>, AppError> {
    if field_ids.is_empty() {
        return Ok(vec![]);
    }
    let sql = format!(
        "SELECT DISTINCT field_id, value FROM custom_field_values WHERE field_id IN ({})",
        placeholders(field_ids.len()),
    );
    let mut query = sqlx::query_as::<_, (i64, String)>(&sql);
    for id in field_ids {
        query = query.bind(*id);
    }
    Ok(query.fetch_all(pool).await?)
}

/// Drop every value recorded for a field. Takes any executor so a caller's
/// transaction can include it.
pub async fn delete_for_field<'e, E>(executor: E, field_id: i64) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM custom_field_values WHERE field_id = ?")
        .bind(field_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

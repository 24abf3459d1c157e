use std::collections::HashMap;

use crate::db::DbPool;
use crate::errors::AppError;

/// Per-member listing preferences, keyed the same way they are stored.
#[derive(Debug, Clone, Default)]
pub struct Preferences(pub HashMap<String, String>);

impl Preferences {
    pub fn block_count_key(block: &str) -> String {
        format!("blocks_{block}_count")
    }

    pub fn block_order_key(block: &str) -> String {
        format!("block_order_{block}_block")
    }

    /// Preferred page size for a block, ignoring zero or garbage values.
    pub fn block_page_size(&self, block: &str) -> Option<i64> {
        self.0
            .get(&Self::block_count_key(block))
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|n| *n > 0)
    }

    pub fn block_sort(&self, block: &str) -> Option<&str> {
        self.0
            .get(&Self::block_order_key(block))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

pub async fn load(pool: &DbPool, member_id: i64) -> Result<Preferences, AppError> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT key, value FROM member_preferences WHERE member_id = ?")
            .bind(member_id)
            .fetch_all(pool)
            .await?;
    Ok(Preferences(rows.into_iter().collect()))
}

pub async fn save(pool: &DbPool, member_id: i64, key: &str, value: &str) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO member_preferences (member_id, key, value) VALUES (?, ?, ?) \
         ON CONFLICT(member_id, key) DO UPDATE SET value = excluded.value",
    )
    .bind(member_id)
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

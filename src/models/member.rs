use serde::Serialize;
use std::collections::HashMap;

use crate::db::{DbPool, placeholders};
use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    pub profile_link: String,
}

pub fn profile_link(id: i64) -> String {
    format!("/profile/{id}")
}

/// Batch lookup of display names. Unknown ids are simply absent from the result.
#[allow(async_fn_in_trait)]
pub trait IdentityResolver {
    async fn resolve(&self, ids: &[i64]) -> Result<HashMap<i64, Identity>, AppError>;
}

/// Resolves identities from the `members` table.
pub struct MemberDirectory<'a> {
    pool: &'a DbPool,
}

impl<'a> MemberDirectory<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        MemberDirectory { pool }
    }
}

impl IdentityResolver for MemberDirectory<'_> {
    async fn resolve(&self, ids: &[i64]) -> Result<HashMap<i64, Identity>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT id, real_name FROM members WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, (i64, String)>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| (id, Identity { id, name, profile_link: profile_link(id) }))
            .collect())
    }
}

pub async fn create(pool: &DbPool, id: i64, real_name: &str) -> Result<(), AppError> {
    sqlx::query("INSERT INTO members (id, real_name) VALUES (?, ?)")
        .bind(id)
        .bind(real_name)
        .execute(pool)
        .await?;
    Ok(())
}

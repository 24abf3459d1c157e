use serde::Serialize;

use crate::db::DbPool;
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub dept_order: i64,
}

pub async fn find_all(pool: &DbPool) -> Result<Vec<Department>, AppError> {
    let depts = sqlx::query_as::<_, Department>(
        "SELECT id, name, dept_order FROM departments ORDER BY dept_order, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(depts)
}

pub async fn create(pool: &DbPool, name: &str, dept_order: i64) -> Result<i64, AppError> {
    let id = sqlx::query("INSERT INTO departments (name, dept_order) VALUES (?, ?)")
        .bind(name)
        .bind(dept_order)
        .execute(pool)
        .await?
        .last_insert_rowid();
    Ok(id)
}

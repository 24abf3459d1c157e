//! Shared test infrastructure for the store and listing tests.
//!
//! Every test gets its own in-memory SQLite database with the migrations applied.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};

use helpdesk::config::Config;
use helpdesk::db::{DbPool, MIGRATOR};
use helpdesk::errors::AppError;
use helpdesk::models::custom_field::{self, FieldForm};
use helpdesk::models::member::{self, Identity, IdentityResolver, MemberDirectory};
use helpdesk::models::ticket::{self, NewTicket, TicketStatus};
use helpdesk::models::{department, field_value};
use sqlx::sqlite::SqlitePoolOptions;

// ============================================================================
// DATABASE SETUP
// ============================================================================

pub struct TestDb {
    pool: DbPool,
}

impl TestDb {
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Fresh in-memory database. One connection, so every query sees the same data.
pub async fn setup_test_db() -> TestDb {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    MIGRATOR.run(&pool).await.expect("Failed to run migrations");
    TestDb { pool }
}

pub fn test_config() -> Config {
    Config {
        items_per_page: 10,
        ticket_zerofill: 5,
        multi_department: true,
        helpdesk_only: false,
        ..Config::default()
    }
}

// ============================================================================
// SEED HELPERS
// ============================================================================

pub async fn seed_department(pool: &DbPool, name: &str) -> i64 {
    let order = department::find_all(pool).await.expect("list departments").len() as i64;
    department::create(pool, name, order).await.expect("create department")
}

pub async fn seed_member(pool: &DbPool, id: i64, name: &str) {
    member::create(pool, id, name).await.expect("create member");
}

pub async fn seed_ticket(pool: &DbPool, dept: i64, subject: &str, status: TicketStatus, starter: i64) -> i64 {
    ticket::create(pool, &NewTicket::new(dept, subject, status, starter))
        .await
        .expect("create ticket")
}

/// `n` tickets with ascending `last_updated`, so the default sort lists them in creation order.
pub async fn seed_tickets(pool: &DbPool, dept: i64, n: usize, status: TicketStatus, starter: i64) -> Vec<i64> {
    let mut ids = vec![];
    for i in 0..n {
        let mut t = NewTicket::new(dept, &format!("Ticket {i}"), status, starter);
        t.last_updated = format!("2024-01-01T00:{:02}:{:02}", i / 60, i % 60);
        ids.push(ticket::create(pool, &t).await.expect("create ticket"));
    }
    ids
}

pub fn field_form(value: serde_json::Value) -> FieldForm {
    serde_json::from_value(value).expect("valid field form")
}

/// Creates a field from a JSON form body, going through normalisation like the handler does.
pub async fn seed_field(pool: &DbPool, value: serde_json::Value) -> i64 {
    let field = custom_field::normalize(&field_form(value)).expect("normalize");
    custom_field::create(pool, &field).await.expect("create field")
}

pub async fn seed_value(pool: &DbPool, ticket_id: i64, field_id: i64, value: &str) {
    field_value::set(pool, ticket_id, field_id, value).await.expect("set value");
}

pub async fn field_orders(pool: &DbPool) -> BTreeMap<i64, i64> {
    sqlx::query_as::<_, (i64, i64)>("SELECT id, field_order FROM custom_fields")
        .fetch_all(pool)
        .await
        .expect("read orders")
        .into_iter()
        .collect()
}

// ============================================================================
// IDENTITY RESOLVER
// ============================================================================

/// Delegates to the member directory and counts how often it is asked.
pub struct CountingResolver<'a> {
    inner: MemberDirectory<'a>,
    pub calls: Cell<usize>,
}

impl<'a> CountingResolver<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        CountingResolver { inner: MemberDirectory::new(pool), calls: Cell::new(0) }
    }
}

impl IdentityResolver for CountingResolver<'_> {
    async fn resolve(&self, ids: &[i64]) -> Result<HashMap<i64, Identity>, AppError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.resolve(ids).await
    }
}

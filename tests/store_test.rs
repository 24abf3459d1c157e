/// Store-level tests for field values, member preferences, the member
/// directory and the audit trail.
mod common;

use common::*;
use helpdesk::audit;
use helpdesk::models::member::{IdentityResolver, MemberDirectory};
use helpdesk::models::ticket::TicketStatus;
use helpdesk::models::{field_value, preference};
use serde_json::json;

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_set_overwrites_existing_value() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = seed_department(pool, "General").await;
    let field = seed_field(pool, json!({ "name": "Version", "field_type": "text" })).await;
    let ticket = seed_ticket(pool, dept, "Broken", TicketStatus::New, 1).await;

    field_value::set(pool, ticket, field, "1.0").await.unwrap();
    field_value::set(pool, ticket, field, "2.0").await.unwrap();

    assert_eq!(field_value::get(pool, ticket, field).await.unwrap(), Some("2.0".to_string()));
}

#[tokio::test]
async fn test_batch_get_groups_by_ticket() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = seed_department(pool, "General").await;
    let version = seed_field(pool, json!({ "name": "Version", "field_type": "text" })).await;
    let os = seed_field(pool, json!({ "name": "OS", "field_type": "text" })).await;
    let first = seed_ticket(pool, dept, "First", TicketStatus::New, 1).await;
    let second = seed_ticket(pool, dept, "Second", TicketStatus::New, 1).await;
    let third = seed_ticket(pool, dept, "Third", TicketStatus::New, 1).await;
    seed_value(pool, first, version, "1.0").await;
    seed_value(pool, first, os, "Linux").await;
    seed_value(pool, second, os, "Mac").await;
    seed_value(pool, third, os, "BSD").await;

    let values = field_value::batch_get(pool, &[first, second], &[version, os]).await.unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values[&first][&version], "1.0");
    assert_eq!(values[&first][&os], "Linux");
    assert_eq!(values[&second].len(), 1);
    assert!(!values.contains_key(&third));

    assert!(field_value::batch_get(pool, &[], &[os]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_recorded_values_are_distinct() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = seed_department(pool, "General").await;
    let field = seed_field(
        pool,
        json!({ "name": "Priority", "field_type": "select", "options": { "1": "Low", "2": "High" } }),
    )
    .await;
    for _ in 0..3 {
        let t = seed_ticket(pool, dept, "Same", TicketStatus::New, 1).await;
        seed_value(pool, t, field, "2").await;
    }

    let recorded = field_value::recorded_values(pool, &[field]).await.unwrap();
    assert_eq!(recorded, vec![(field, "2".to_string())]);
    assert!(field_value::recorded_values(pool, &[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_for_field_leaves_other_fields() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = seed_department(pool, "General").await;
    let version = seed_field(pool, json!({ "name": "Version", "field_type": "text" })).await;
    let os = seed_field(pool, json!({ "name": "OS", "field_type": "text" })).await;
    let first = seed_ticket(pool, dept, "First", TicketStatus::New, 1).await;
    let second = seed_ticket(pool, dept, "Second", TicketStatus::New, 1).await;
    seed_value(pool, first, version, "1.0").await;
    seed_value(pool, second, version, "2.0").await;
    seed_value(pool, first, os, "Linux").await;

    assert_eq!(field_value::delete_for_field(pool, version).await.unwrap(), 2);
    assert_eq!(field_value::get(pool, first, version).await.unwrap(), None);
    assert_eq!(field_value::get(pool, first, os).await.unwrap(), Some("Linux".to_string()));
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_preferences_are_per_member() {
    let db = setup_test_db().await;
    let pool = db.pool();

    preference::save(pool, 1, "blocks_staff_count", "15").await.unwrap();
    preference::save(pool, 1, "blocks_staff_count", "25").await.unwrap();
    preference::save(pool, 1, "block_order_staff_block", "ticketid_asc").await.unwrap();
    preference::save(pool, 2, "blocks_staff_count", "5").await.unwrap();

    let prefs = preference::load(pool, 1).await.unwrap();
    assert_eq!(prefs.block_page_size("staff"), Some(25));
    assert_eq!(prefs.block_sort("staff"), Some("ticketid_asc"));
    assert_eq!(prefs.block_sort("user"), None);

    let other = preference::load(pool, 2).await.unwrap();
    assert_eq!(other.block_page_size("staff"), Some(5));
    assert!(preference::load(pool, 3).await.unwrap().0.is_empty());
}

// ---------------------------------------------------------------------------
// Member directory
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_directory_skips_unknown_members() {
    let db = setup_test_db().await;
    let pool = db.pool();
    seed_member(pool, 1, "Sam Staff").await;
    seed_member(pool, 5, "Ada").await;

    let found = MemberDirectory::new(pool).resolve(&[1, 5, 42]).await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[&5].name, "Ada");
    assert_eq!(found[&5].profile_link, "/profile/5");
    assert!(!found.contains_key(&42));
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_audit_entries_are_recorded_per_target() {
    let db = setup_test_db().await;
    let pool = db.pool();

    audit::log(pool, 1, "custom_field.created", "custom_field", 7, json!({ "name": "Priority" })).await;
    audit::log(pool, 1, "custom_field.deleted", "custom_field", 7, json!({})).await;
    audit::log(pool, 1, "custom_field.created", "custom_field", 8, json!({})).await;

    let entries = audit::find_for_target(pool, "custom_field", 7).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().any(|e| e.action == "custom_field.deleted"));
}

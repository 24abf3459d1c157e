mod common;

use std::collections::HashMap;

use common::*;
use helpdesk::auth::session::Permissions;
use helpdesk::db::DbPool;
use helpdesk::errors::AppError;
use helpdesk::listing::blocks::BlockKey;
use helpdesk::listing::planner::{SortColumn, SortDirection};
use helpdesk::listing::service::Viewer;
use helpdesk::listing::{Listing, ListingContext, ListingRequest, build_listing};
use helpdesk::models::member::{IdentityResolver, MemberDirectory};
use helpdesk::models::preference;
use helpdesk::models::ticket::{self, NewTicket, TicketStatus};
use serde_json::json;

const STAFF: i64 = 1;
const CUSTOMER: i64 = 5;

fn staff() -> Permissions {
    Permissions::from_csv("helpdesk.staff,helpdesk.view_closed_any,helpdesk.access_recyclebin")
}

fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

async fn listing_with<R: IdentityResolver>(
    pool: &DbPool,
    resolver: &R,
    perms: &Permissions,
    viewer: i64,
    context: ListingContext,
    pairs: &[(&str, &str)],
) -> Result<Listing, AppError> {
    let preferences = preference::load(pool, viewer).await?;
    let viewer = Viewer { id: viewer, checker: perms, preferences: &preferences };
    let request = ListingRequest::from_query(&query(pairs));
    build_listing(pool, &test_config(), &viewer, resolver, context, &request).await
}

async fn listing(
    pool: &DbPool,
    perms: &Permissions,
    viewer: i64,
    context: ListingContext,
    pairs: &[(&str, &str)],
) -> Result<Listing, AppError> {
    listing_with(pool, &MemberDirectory::new(pool), perms, viewer, context, pairs).await
}

async fn base(pool: &DbPool) -> i64 {
    seed_member(pool, STAFF, "Sam Staff").await;
    seed_member(pool, CUSTOMER, "Ada").await;
    seed_department(pool, "General").await
}

#[tokio::test]
async fn test_start_past_end_snaps_to_last_page() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = base(pool).await;
    let ids = seed_tickets(pool, dept, 23, TicketStatus::PendingStaff, CUSTOMER).await;

    let result = listing(pool, &staff(), STAFF, ListingContext::Home, &[("st_staff", "25")])
        .await
        .unwrap();

    let block = result.block(BlockKey::Staff).unwrap();
    assert_eq!(block.count, 23);
    assert_eq!(block.plan.start, 20);
    assert_eq!(block.plan.per_page, 10);
    assert_eq!(block.tickets.iter().map(|t| t.id).collect::<Vec<_>>(), ids[20..].to_vec());
    assert_eq!(result.canonical.get("st_staff"), Some("20"));
}

#[tokio::test]
async fn test_zero_start_is_not_echoed() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = base(pool).await;
    seed_tickets(pool, dept, 4, TicketStatus::PendingStaff, CUSTOMER).await;

    let result = listing(pool, &staff(), STAFF, ListingContext::Home, &[("st_staff", "3")])
        .await
        .unwrap();
    assert_eq!(result.block(BlockKey::Staff).unwrap().plan.start, 0);
    assert_eq!(result.canonical.get("st_staff"), None);
}

#[tokio::test]
async fn test_page_size_comes_from_member_preference() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = base(pool).await;
    seed_tickets(pool, dept, 12, TicketStatus::PendingStaff, CUSTOMER).await;
    preference::save(pool, STAFF, "blocks_staff_count", "5").await.unwrap();

    let result = listing(pool, &staff(), STAFF, ListingContext::Home, &[("st_staff", "7")])
        .await
        .unwrap();
    let block = result.block(BlockKey::Staff).unwrap();
    assert_eq!((block.plan.start, block.plan.per_page), (5, 5));
    assert_eq!(block.tickets.len(), 5);
}

#[tokio::test]
async fn test_sort_tokens_are_sanitised() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = base(pool).await;
    let ids = seed_tickets(pool, dept, 3, TicketStatus::PendingStaff, CUSTOMER).await;

    let result = listing(pool, &staff(), STAFF, ListingContext::Home, &[("so_staff", "ticketid_desc")])
        .await
        .unwrap();
    let block = result.block(BlockKey::Staff).unwrap();
    assert_eq!(block.tickets[0].id, ids[2]);
    assert_eq!(result.canonical.get("so_staff"), Some("ticketid_desc"));

    let result = listing(pool, &staff(), STAFF, ListingContext::Home, &[("so_staff", "bogus_desc")])
        .await
        .unwrap();
    let sort = result.block(BlockKey::Staff).unwrap().plan.sort;
    assert_eq!((sort.column, sort.direction), (SortColumn::Updated, SortDirection::Desc));
    assert_eq!(result.canonical.get("so_staff"), None);
}

#[tokio::test]
async fn test_closed_tickets_default_to_newest_first() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = base(pool).await;
    let ids = seed_tickets(pool, dept, 3, TicketStatus::Closed, CUSTOMER).await;

    let result = listing(pool, &staff(), STAFF, ListingContext::Closed, &[]).await.unwrap();
    let block = result.block(BlockKey::Closed).unwrap();
    assert_eq!(block.plan.sort.direction, SortDirection::Desc);
    assert_eq!(block.tickets.iter().map(|t| t.id).collect::<Vec<_>>(), vec![ids[2], ids[1], ids[0]]);
}

#[tokio::test]
async fn test_closed_and_recycle_bin_need_capabilities() {
    let db = setup_test_db().await;
    let pool = db.pool();
    base(pool).await;
    let nobody = Permissions::from_csv("helpdesk.access");

    assert!(matches!(
        listing(pool, &nobody, CUSTOMER, ListingContext::Closed, &[]).await,
        Err(AppError::PermissionDenied(_))
    ));
    assert!(matches!(
        listing(pool, &nobody, CUSTOMER, ListingContext::RecycleBin, &[]).await,
        Err(AppError::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn test_end_users_see_only_their_own_tickets() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = base(pool).await;
    let own = seed_ticket(pool, dept, "Mine", TicketStatus::New, CUSTOMER).await;
    seed_ticket(pool, dept, "Someone else's", TicketStatus::PendingStaff, 9).await;

    let perms = Permissions::from_csv("helpdesk.access");
    let result = listing(pool, &perms, CUSTOMER, ListingContext::Home, &[]).await.unwrap();

    assert_eq!(result.home_view, "user");
    assert!(result.block(BlockKey::Assigned).is_none());
    assert!(result.block(BlockKey::New).is_none());
    let waiting = result.block(BlockKey::Staff).unwrap();
    assert_eq!(waiting.count, 1);
    assert_eq!(waiting.tickets[0].id, own);
    // Required even though empty.
    assert_eq!(result.block(BlockKey::User).unwrap().count, 0);
}

#[tokio::test]
async fn test_empty_optional_blocks_are_dropped() {
    let db = setup_test_db().await;
    let pool = db.pool();
    base(pool).await;

    let result = listing(pool, &staff(), STAFF, ListingContext::Home, &[]).await.unwrap();
    let keys: Vec<BlockKey> = result.blocks.iter().map(|b| b.key).collect();
    assert_eq!(keys, vec![BlockKey::Assigned, BlockKey::Staff, BlockKey::User]);
}

#[tokio::test]
async fn test_identities_resolved_in_one_batch() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = base(pool).await;
    seed_tickets(pool, dept, 2, TicketStatus::PendingStaff, CUSTOMER).await;
    let mut assigned = NewTicket::new(dept, "Assigned", TicketStatus::PendingUser, 9);
    assigned.member_assigned = CUSTOMER;
    assigned.starter_name = "Guest".to_string();
    ticket::create(pool, &assigned).await.unwrap();

    let resolver = CountingResolver::new(pool);
    let result = listing_with(pool, &resolver, &staff(), STAFF, ListingContext::Home, &[])
        .await
        .unwrap();
    assert_eq!(resolver.calls.get(), 1);

    let row = &result.block(BlockKey::Staff).unwrap().tickets[0];
    assert_eq!(row.starter.name, "Ada");
    assert_eq!(row.starter.link.as_deref(), Some("/profile/5"));
    assert_eq!(row.assigned.name, "Unassigned");
    assert_eq!(row.assigned.link, None);

    let row = &result.block(BlockKey::User).unwrap().tickets[0];
    assert_eq!(row.starter.name, "Guest");
    assert_eq!(row.starter.link, None);
    assert_eq!(row.assigned.name, "Ada");
}

#[tokio::test]
async fn test_no_rows_means_no_identity_lookup() {
    let db = setup_test_db().await;
    let pool = db.pool();
    base(pool).await;

    let resolver = CountingResolver::new(pool);
    listing_with(pool, &resolver, &staff(), STAFF, ListingContext::Home, &[]).await.unwrap();
    assert_eq!(resolver.calls.get(), 0);
}

#[tokio::test]
async fn test_guest_ticket_without_members_shows_unassigned() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = base(pool).await;
    let mut guest = NewTicket::new(dept, "From a guest", TicketStatus::PendingStaff, 0);
    guest.starter_name = "Visitor".to_string();
    ticket::create(pool, &guest).await.unwrap();

    let resolver = CountingResolver::new(pool);
    let result = listing_with(pool, &resolver, &staff(), STAFF, ListingContext::Home, &[])
        .await
        .unwrap();
    assert_eq!(resolver.calls.get(), 0);

    let row = &result.block(BlockKey::Staff).unwrap().tickets[0];
    assert_eq!(row.assigned.name, "Unassigned");
    assert_eq!(row.assigned.link, None);
    assert_eq!(row.starter.name, "Visitor");
    assert_eq!(row.starter.link, None);
}

async fn priority_field(pool: &DbPool, dept: i64) -> i64 {
    seed_field(
        pool,
        json!({
            "name": "Priority",
            "field_type": "select",
            "placement": "subject_prefix_filterable",
            "options": { "1": "Low", "2": "High", "3": "Blocker" },
            "see_users": true,
            "see_staff": true,
            "departments": { dept.to_string(): {} },
        }),
    )
    .await
}

#[tokio::test]
async fn test_filter_narrows_counts_before_clamping() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = base(pool).await;
    let field = priority_field(pool, dept).await;
    let ids = seed_tickets(pool, dept, 15, TicketStatus::PendingStaff, CUSTOMER).await;
    for (i, id) in ids.iter().enumerate() {
        seed_value(pool, *id, field, if i % 5 == 0 { "2" } else { "1" }).await;
    }

    let field_id = field.to_string();
    let result = listing(
        pool,
        &staff(),
        STAFF,
        ListingContext::Home,
        &[("field", &field_id), ("filter", "2"), ("st_staff", "10")],
    )
    .await
    .unwrap();

    let block = result.block(BlockKey::Staff).unwrap();
    assert_eq!(block.count, 3);
    assert_eq!(block.plan.start, 0);
    assert_eq!(block.tickets.len(), 3);
    assert!(block.tickets.iter().all(|t| t.subject.starts_with("[High] ")));
    assert_eq!(result.canonical.get("field"), Some(field_id.as_str()));
    assert_eq!(result.canonical.get("filter"), Some("2"));
}

#[tokio::test]
async fn test_prefixes_and_filter_in_use() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = base(pool).await;
    let priority = priority_field(pool, dept).await;
    let platform = seed_field(
        pool,
        json!({
            "name": "Platform",
            "field_type": "multi_select",
            "placement": "subject_prefix",
            "options": { "1": "Mac", "2": "Linux" },
            "see_users": true,
            "see_staff": true,
            "departments": { dept.to_string(): {} },
        }),
    )
    .await;
    let t = seed_ticket(pool, dept, "Crash on start", TicketStatus::PendingStaff, CUSTOMER).await;
    seed_value(pool, t, priority, "2").await;
    seed_value(pool, t, platform, "1,2").await;

    let result = listing(pool, &staff(), STAFF, ListingContext::Home, &[]).await.unwrap();
    let row = &result.block(BlockKey::Staff).unwrap().tickets[0];
    assert_eq!(row.subject, "[High] [Mac Linux] Crash on start");
    assert_eq!(row.raw_subject, "Crash on start");
    assert_eq!(row.prefix_links.len(), 1);
    assert_eq!(row.prefix_links[0].href, format!("/helpdesk?field={priority}&filter=2"));

    assert_eq!(result.filter_fields.len(), 1);
    let filter = &result.filter_fields[0];
    assert_eq!(filter.id, priority);
    assert_eq!(filter.options.keys().copied().collect::<Vec<_>>(), vec![2]);
}

#[tokio::test]
async fn test_hidden_prefix_fields_are_not_shown_to_users() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = base(pool).await;
    let secret = seed_field(
        pool,
        json!({
            "name": "Internal",
            "field_type": "text",
            "placement": "subject_prefix",
            "see_users": false,
            "see_staff": true,
            "departments": { dept.to_string(): {} },
        }),
    )
    .await;
    let t = seed_ticket(pool, dept, "Question", TicketStatus::New, CUSTOMER).await;
    seed_value(pool, t, secret, "vip").await;

    let user = listing(pool, &Permissions::from_csv("helpdesk.access"), CUSTOMER, ListingContext::Home, &[])
        .await
        .unwrap();
    assert_eq!(user.block(BlockKey::Staff).unwrap().tickets[0].subject, "Question");

    let staff_view = listing(pool, &staff(), STAFF, ListingContext::Home, &[]).await.unwrap();
    assert_eq!(staff_view.block(BlockKey::New).unwrap().tickets[0].subject, "[vip] Question");
}

#[tokio::test]
async fn test_view_block_shows_the_whole_block() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = base(pool).await;
    seed_tickets(pool, dept, 14, TicketStatus::PendingUser, CUSTOMER).await;
    seed_tickets(pool, dept, 2, TicketStatus::PendingStaff, CUSTOMER).await;

    let result = listing(pool, &staff(), STAFF, ListingContext::ViewBlock(BlockKey::User), &[("st_user", "10")])
        .await
        .unwrap();
    let user = result.block(BlockKey::User).unwrap();
    assert!(user.viewing_as_block);
    assert_eq!((user.plan.start, user.plan.per_page), (0, 14));
    assert_eq!(user.tickets.len(), 14);

    let staff_block = result.block(BlockKey::Staff).unwrap();
    assert!(staff_block.collapsed);
    assert!(staff_block.tickets.is_empty());
}

#[tokio::test]
async fn test_view_block_of_empty_or_hidden_block_is_not_found() {
    let db = setup_test_db().await;
    let pool = db.pool();
    base(pool).await;

    assert!(matches!(
        listing(pool, &staff(), STAFF, ListingContext::ViewBlock(BlockKey::New), &[]).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        listing(pool, &Permissions::from_csv("helpdesk.access"), CUSTOMER, ListingContext::ViewBlock(BlockKey::Assigned), &[]).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_recycle_bin_lists_deleted_and_partially_deleted() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = base(pool).await;
    let deleted = seed_ticket(pool, dept, "Spam", TicketStatus::Deleted, CUSTOMER).await;
    let mut partial = NewTicket::new(dept, "Has deleted replies", TicketStatus::PendingStaff, CUSTOMER);
    partial.deleted_replies = 2;
    partial.num_replies = 1;
    let partial = ticket::create(pool, &partial).await.unwrap();

    let perms = Permissions::from_csv("helpdesk.staff,helpdesk.access_recyclebin,helpdesk.delete_recycling");
    let result = listing(pool, &perms, STAFF, ListingContext::RecycleBin, &[]).await.unwrap();

    let recycle = result.block(BlockKey::Recycle).unwrap();
    assert_eq!(recycle.tickets[0].id, deleted);
    assert_eq!(
        recycle.tickets[0].actions,
        vec![helpdesk::listing::actions::TicketAction::PermaDelete]
    );
    let with_deleted = result.block(BlockKey::WithDeleted).unwrap();
    assert_eq!(with_deleted.tickets[0].id, partial);
    assert_eq!(with_deleted.tickets[0].all_replies, 3);
}

#[tokio::test]
async fn test_unread_flag_follows_read_marker() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let dept = base(pool).await;
    let read = seed_ticket(pool, dept, "Read", TicketStatus::PendingStaff, CUSTOMER).await;
    let unread = seed_ticket(pool, dept, "Unread", TicketStatus::PendingStaff, CUSTOMER).await;
    ticket::mark_read(pool, read, STAFF, 1).await.unwrap();

    let result = listing(pool, &staff(), STAFF, ListingContext::Home, &[]).await.unwrap();
    let rows = &result.block(BlockKey::Staff).unwrap().tickets;
    let flag = |id| rows.iter().find(|t| t.id == id).map(|t| t.is_unread);
    assert_eq!(flag(read), Some(false));
    assert_eq!(flag(unread), Some(true));
}

use actix_session::Session;
use actix_web::{HttpResponse, web};
use std::collections::HashMap;

use crate::auth::session::{get_permissions, require_user};
use crate::config::Config;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::listing::blocks::BlockKey;
use crate::listing::service::Viewer;
use crate::listing::{ListingContext, ListingRequest, build_listing};
use crate::models::member::MemberDirectory;
use crate::models::preference;

async fn render(
    pool: &DbPool,
    config: &Config,
    session: &Session,
    context: ListingContext,
    query: &HashMap<String, String>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user(session)?;
    let permissions = get_permissions(session).map_err(AppError::Session)?;
    let preferences = preference::load(pool, user_id).await?;
    let viewer = Viewer { id: user_id, checker: &permissions, preferences: &preferences };
    let request = ListingRequest::from_query(query);

    let listing = build_listing(pool, config, &viewer, &MemberDirectory::new(pool), context, &request).await?;
    Ok(HttpResponse::Ok().json(listing))
}

/// GET /helpdesk
pub async fn home(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    session: Session,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    render(&pool, &config, &session, ListingContext::Home, &query).await
}

/// GET /helpdesk/closed
pub async fn closed(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    session: Session,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    render(&pool, &config, &session, ListingContext::Closed, &query).await
}

/// GET /helpdesk/recyclebin
pub async fn recycle_bin(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    session: Session,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    render(&pool, &config, &session, ListingContext::RecycleBin, &query).await
}

/// GET /helpdesk/block/{block}
///
/// Unknown, hidden or empty blocks send the viewer back to the home listing.
pub async fn view_block(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    session: Session,
    path: web::Path<String>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let result = match path.parse::<BlockKey>() {
        Ok(key) => render(&pool, &config, &session, ListingContext::ViewBlock(key), &query).await,
        Err(e) => Err(e),
    };

    match result {
        Err(AppError::NotFound(what)) => {
            log::debug!("view block fell back to home: {what}");
            let location = match ListingRequest::from_query(&query).dept {
                Some(dept) => format!("/helpdesk?dept={dept}"),
                None => "/helpdesk".to_string(),
            };
            Ok(HttpResponse::SeeOther().insert_header(("Location", location)).finish())
        }
        other => other,
    }
}

use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::session::require_user;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::listing::blocks::BlockKey;
use crate::listing::planner::{SortDirection, parse_sort};
use crate::models::preference::{self, Preferences};

pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct BlockPreferenceForm {
    pub block: String,
    #[serde(default)]
    pub page_size: Option<i64>,
    #[serde(default)]
    pub sort: Option<String>,
}

/// POST /helpdesk/preferences
pub async fn save(
    pool: web::Data<DbPool>,
    session: Session,
    body: web::Json<BlockPreferenceForm>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user(&session)?;
    let block: BlockKey = body
        .block
        .parse()
        .map_err(|_| AppError::Validation(format!("Unknown block '{}'", body.block)))?;
    let key = block.as_str();

    if let Some(size) = body.page_size {
        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(AppError::Validation(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        preference::save(&pool, user_id, &Preferences::block_count_key(key), &size.to_string()).await?;
    }

    if let Some(token) = body.sort.as_deref() {
        let sort = parse_sort(Some(token), SortDirection::Asc);
        if !sort.explicit {
            return Err(AppError::Validation(format!("Unknown sort '{token}'")));
        }
        preference::save(&pool, user_id, &Preferences::block_order_key(key), &sort.token()).await?;
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "saved" })))
}

use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Serialize;
use std::collections::HashMap;

use crate::audit;
use crate::auth::capability::Capability;
use crate::auth::session::{require_permission, require_user};
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::custom_field::{self, FieldDefinition, FieldForm, FieldType, MoveDirection};
use crate::models::department::{self, Department};

#[derive(Serialize)]
struct FieldEditor {
    field: Option<FieldDefinition>,
    /// Types the field may be saved as.
    allowed_types: Vec<FieldType>,
    departments: Vec<Department>,
}

fn require_admin(session: &Session) -> Result<i64, AppError> {
    let user_id = require_user(session)?;
    require_permission(session, Capability::Admin.code())?;
    Ok(user_id)
}

/// GET /admin/custom-fields
pub async fn list(pool: web::Data<DbPool>, session: Session) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let fields = custom_field::list(&pool).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "fields": fields })))
}

/// GET /admin/custom-fields/new
pub async fn new_form(pool: web::Data<DbPool>, session: Session) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let editor = FieldEditor {
        field: None,
        allowed_types: custom_field::compatible_types(None),
        departments: department::find_all(&pool).await?,
    };
    Ok(HttpResponse::Ok().json(editor))
}

/// GET /admin/custom-fields/{id}
pub async fn read(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let field = custom_field::get(&pool, path.into_inner()).await?;
    let editor = FieldEditor {
        allowed_types: custom_field::compatible_types(Some(field.field_type)),
        field: Some(field),
        departments: department::find_all(&pool).await?,
    };
    Ok(HttpResponse::Ok().json(editor))
}

/// POST /admin/custom-fields
pub async fn create(
    pool: web::Data<DbPool>,
    session: Session,
    body: web::Json<FieldForm>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_admin(&session)?;
    if body.cancel {
        return Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "cancelled" })));
    }

    let field = custom_field::normalize(&body)?;
    let id = custom_field::create(&pool, &field).await?;
    log::info!("Custom field {id} '{}' created by {user_id}", field.name);
    audit::log(
        &pool,
        user_id,
        "custom_field.created",
        "custom_field",
        id,
        serde_json::json!({ "name": field.name, "type": field.field_type.as_str() }),
    )
    .await;

    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

/// POST /admin/custom-fields/{id}
///
/// The same save path handles the editor's cancel and delete buttons.
pub async fn update(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<FieldForm>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_admin(&session)?;
    let id = path.into_inner();
    if body.cancel {
        return Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "cancelled" })));
    }
    if body.delete {
        return remove(&pool, user_id, id).await;
    }

    let field = custom_field::normalize(&body)?;
    custom_field::update(&pool, id, &field).await?;
    log::info!("Custom field {id} updated by {user_id}");
    audit::log(
        &pool,
        user_id,
        "custom_field.updated",
        "custom_field",
        id,
        serde_json::json!({ "name": field.name, "type": field.field_type.as_str() }),
    )
    .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id, "status": "saved" })))
}

/// POST /admin/custom-fields/{id}/delete
pub async fn delete(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_admin(&session)?;
    remove(&pool, user_id, path.into_inner()).await
}

async fn remove(pool: &DbPool, user_id: i64, id: i64) -> Result<HttpResponse, AppError> {
    custom_field::delete(pool, id).await?;
    log::info!("Custom field {id} deleted by {user_id}");
    audit::log(pool, user_id, "custom_field.deleted", "custom_field", id, serde_json::json!({})).await;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id, "status": "deleted" })))
}

/// POST /admin/custom-fields/{id}/move?direction=up|down
pub async fn move_field(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_admin(&session)?;
    let id = path.into_inner();
    let direction: MoveDirection = query
        .get("direction")
        .ok_or_else(|| AppError::Operation("No direction given".to_string()))?
        .parse()?;

    custom_field::reorder(&pool, id, direction).await?;
    log::info!("Custom field {id} moved {direction:?} by {user_id}");
    audit::log(
        &pool,
        user_id,
        "custom_field.moved",
        "custom_field",
        id,
        serde_json::json!({ "direction": direction }),
    )
    .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id, "status": "moved" })))
}

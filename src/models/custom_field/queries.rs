use std::collections::{BTreeMap, BTreeSet};

use sqlx::{Sqlite, Transaction};

use super::compat::{can_change, compatible_types};
use super::options;
use super::types::*;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::field_value;

const SELECT_FIELD: &str = "\
    SELECT id, field_order, name, description, active, location, icon, field_type, \
           field_length, options, bbc, default_value, user_see, staff_see, user_edit, \
           staff_edit, display_empty, placement \
    FROM custom_fields";

#[derive(sqlx::FromRow)]
struct FieldRow {
    id: i64,
    field_order: i64,
    name: String,
    description: String,
    active: bool,
    location: String,
    icon: String,
    field_type: String,
    field_length: i64,
    options: String,
    bbc: bool,
    default_value: String,
    user_see: bool,
    staff_see: bool,
    user_edit: bool,
    staff_edit: bool,
    display_empty: bool,
    placement: String,
}

#[derive(sqlx::FromRow)]
struct DeptRow {
    field_id: i64,
    dept_id: i64,
    required: i64,
}

fn encode_default(default: &DefaultValue) -> String {
    match default {
        DefaultValue::None => String::new(),
        DefaultValue::Checked(on) => if *on { "1" } else { "0" }.to_string(),
        DefaultValue::Option(k) => k.to_string(),
        DefaultValue::Options(keys) => keys.iter().map(u32::to_string).collect::<Vec<_>>().join(","),
        DefaultValue::Dimensions { rows, cols } => format!("{rows},{cols}"),
    }
}

fn decode_default(field_type: FieldType, raw: &str) -> DefaultValue {
    let raw = raw.trim();
    match field_type {
        FieldType::Checkbox => DefaultValue::Checked(raw == "1"),
        FieldType::LargeText => {
            let mut parts = raw.split(',').map(|p| p.trim().parse::<u32>().unwrap_or(0));
            DefaultValue::Dimensions {
                rows: parts.next().unwrap_or(0),
                cols: parts.next().unwrap_or(0),
            }
        }
        FieldType::Select | FieldType::Radio => match raw.parse() {
            Ok(k) => DefaultValue::Option(k),
            Err(_) => DefaultValue::None,
        },
        FieldType::MultiSelect => DefaultValue::Options(
            raw.split(',').filter_map(|p| p.trim().parse().ok()).collect(),
        ),
        FieldType::Text | FieldType::Int | FieldType::Float => DefaultValue::None,
    }
}

fn encode_requirement(req: DeptRequirement) -> i64 {
    match req {
        DeptRequirement::NotApplicable | DeptRequirement::Optional => 0,
        DeptRequirement::Required => 1,
        DeptRequirement::AtLeast(n) => i64::from(n),
    }
}

fn decode_requirement(field_type: FieldType, required: i64) -> DeptRequirement {
    if field_type == FieldType::MultiSelect {
        DeptRequirement::AtLeast(required.max(0) as u32)
    } else if required != 0 {
        DeptRequirement::Required
    } else {
        DeptRequirement::Optional
    }
}

fn row_to_definition(row: FieldRow, depts: &[DeptRow]) -> Result<FieldDefinition, AppError> {
    let field_type: FieldType = row.field_type.parse()?;
    let departments = depts
        .iter()
        .filter(|d| d.field_id == row.id)
        .map(|d| (d.dept_id, decode_requirement(field_type, d.required)))
        .collect();
    Ok(FieldDefinition {
        id: row.id,
        order: row.field_order,
        name: row.name,
        description: row.description,
        active: row.active,
        location: row.location.parse()?,
        icon: row.icon,
        field_type,
        length: row.field_length,
        options: options::decode(&row.options)?,
        bbc: row.bbc,
        default: decode_default(field_type, &row.default_value),
        visibility: Visibility::new(row.user_see, row.staff_see, row.user_edit, row.staff_edit),
        display_empty: row.display_empty,
        placement: row.placement.parse()?,
        departments,
    })
}

/// Admin list in display order, with first/last markers for the move controls.
pub async fn list(pool: &DbPool) -> Result<Vec<FieldListItem>, AppError> {
    let defs = list_definitions(pool).await?;
    let last = defs.len().saturating_sub(1);
    Ok(defs
        .into_iter()
        .enumerate()
        .map(|(i, d)| FieldListItem {
            id: d.id,
            order: d.order,
            name: d.name,
            description: d.description,
            active: d.active,
            location: d.location,
            icon: d.icon,
            field_type: d.field_type,
            visibility: d.visibility,
            placement: d.placement,
            is_first: i == 0,
            is_last: i == last,
        })
        .collect())
}

/// Every definition with its department requirements, ordered by `order`.
pub async fn list_definitions(pool: &DbPool) -> Result<Vec<FieldDefinition>, AppError> {
    let rows = sqlx::query_as::<_, FieldRow>(&format!("{SELECT_FIELD} ORDER BY field_order, id"))
        .fetch_all(pool)
        .await?;
    let depts = sqlx::query_as::<_, DeptRow>(
        "SELECT field_id, dept_id, required FROM custom_field_depts ORDER BY field_id, dept_id",
    )
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(|r| row_to_definition(r, &depts)).collect()
}

pub async fn get(pool: &DbPool, id: i64) -> Result<FieldDefinition, AppError> {
    let row = sqlx::query_as::<_, FieldRow>(&format!("{SELECT_FIELD} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("custom field {id}")))?;
    let depts = sqlx::query_as::<_, DeptRow>(
        "SELECT field_id, dept_id, required FROM custom_field_depts WHERE field_id = ? ORDER BY dept_id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;
    row_to_definition(row, &depts)
}

/// Replace the department rows of a field, keeping only departments that exist.
async fn replace_departments(
    tx: &mut Transaction<'_, Sqlite>,
    field_id: i64,
    departments: &BTreeMap<i64, DeptRequirement>,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM custom_field_depts WHERE field_id = ?")
        .bind(field_id)
        .execute(&mut **tx)
        .await?;

    let known: BTreeSet<i64> = sqlx::query_scalar::<_, i64>("SELECT id FROM departments")
        .fetch_all(&mut **tx)
        .await?
        .into_iter()
        .collect();

    for (dept_id, req) in departments {
        if !req.is_applicable() || !known.contains(dept_id) {
            continue;
        }
        sqlx::query("INSERT INTO custom_field_depts (field_id, dept_id, required) VALUES (?, ?, ?)")
            .bind(field_id)
            .bind(*dept_id)
            .bind(encode_requirement(*req))
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Append a new definition at the end of the display order.
pub async fn create(pool: &DbPool, field: &NewField) -> Result<i64, AppError> {
    if field.name.trim().is_empty() {
        return Err(AppError::Validation("Field name is required".to_string()));
    }
    if !compatible_types(None).contains(&field.field_type) {
        return Err(AppError::Validation(format!("Invalid field type {}", field.field_type)));
    }
    let encoded_options = options::encode(&field.options)?;

    let mut tx = pool.begin().await?;
    let order: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM custom_fields")
        .fetch_one(&mut *tx)
        .await?;

    let id = sqlx::query(
        "INSERT INTO custom_fields \
             (field_order, name, description, active, location, icon, field_type, field_length, \
              options, bbc, default_value, user_see, staff_see, user_edit, staff_edit, \
              display_empty, placement) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(order)
    .bind(&field.name)
    .bind(&field.description)
    .bind(field.active)
    .bind(field.location.as_str())
    .bind(&field.icon)
    .bind(field.field_type.as_str())
    .bind(field.length)
    .bind(&encoded_options)
    .bind(field.bbc)
    .bind(encode_default(&field.default))
    .bind(field.visibility.user_see)
    .bind(field.visibility.staff_see)
    .bind(field.visibility.user_edit)
    .bind(field.visibility.staff_edit)
    .bind(field.display_empty)
    .bind(field.placement.as_str())
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    replace_departments(&mut tx, id, &field.departments).await?;
    tx.commit().await?;
    Ok(id)
}

/// Save over an existing definition.
///
/// The new type must be reachable from the stored one. Within the choice
/// family the submitted options are overlaid on the stored ones so retired
/// keys survive as inactive.
pub async fn update(pool: &DbPool, id: i64, field: &NewField) -> Result<(), AppError> {
    if field.name.trim().is_empty() {
        return Err(AppError::Validation("Field name is required".to_string()));
    }

    let mut tx = pool.begin().await?;
    let stored: Option<(String, String)> =
        sqlx::query_as("SELECT field_type, options FROM custom_fields WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let (stored_type, stored_options) =
        stored.ok_or_else(|| AppError::NotFound(format!("custom field {id}")))?;
    let stored_type: FieldType = stored_type.parse()?;

    if !can_change(stored_type, field.field_type) {
        return Err(AppError::Validation(format!(
            "A {stored_type} field cannot become a {}",
            field.field_type
        )));
    }

    let old_options = options::decode(&stored_options)?;
    let new_options = if stored_type.has_options() && !old_options.is_empty() {
        options::migrate(&old_options, &field.options.active_map())
    } else {
        field.options.clone()
    };
    let encoded_options = options::encode(&new_options)?;

    sqlx::query(
        "UPDATE custom_fields SET \
             name = ?, description = ?, active = ?, location = ?, icon = ?, field_type = ?, \
             field_length = ?, options = ?, bbc = ?, default_value = ?, user_see = ?, \
             staff_see = ?, user_edit = ?, staff_edit = ?, display_empty = ?, placement = ? \
         WHERE id = ?",
    )
    .bind(&field.name)
    .bind(&field.description)
    .bind(field.active)
    .bind(field.location.as_str())
    .bind(&field.icon)
    .bind(field.field_type.as_str())
    .bind(field.length)
    .bind(&encoded_options)
    .bind(field.bbc)
    .bind(encode_default(&field.default))
    .bind(field.visibility.user_see)
    .bind(field.visibility.staff_see)
    .bind(field.visibility.user_edit)
    .bind(field.visibility.staff_edit)
    .bind(field.display_empty)
    .bind(field.placement.as_str())
    .bind(id)
    .execute(&mut *tx)
    .await?;

    replace_departments(&mut tx, id, &field.departments).await?;
    tx.commit().await?;
    Ok(())
}

/// Remove a definition, its values and department rows, and close the gap in
/// the display order. All in one transaction.
pub async fn delete(pool: &DbPool, id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    let position: i64 = sqlx::query_scalar("SELECT field_order FROM custom_fields WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("custom field {id}")))?;

    sqlx::query("DELETE FROM custom_fields WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE custom_fields SET field_order = field_order - 1 WHERE field_order > ?")
        .bind(position)
        .execute(&mut *tx)
        .await?;
    field_value::delete_for_field(&mut *tx, id).await?;
    sqlx::query("DELETE FROM custom_field_depts WHERE field_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Swap a definition with its neighbour in the given direction.
pub async fn reorder(pool: &DbPool, id: i64, direction: MoveDirection) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    let positions: Vec<(i64, i64)> =
        sqlx::query_as("SELECT id, field_order FROM custom_fields ORDER BY field_order")
            .fetch_all(&mut *tx)
            .await?;

    let current = positions
        .iter()
        .find(|(fid, _)| *fid == id)
        .map(|(_, order)| *order)
        .ok_or_else(|| AppError::NotFound(format!("custom field {id}")))?;
    let destination = match direction {
        MoveDirection::Up => current - 1,
        MoveDirection::Down => current + 1,
    };
    let other = positions
        .iter()
        .find(|(_, order)| *order == destination)
        .map(|(fid, _)| *fid)
        .ok_or_else(|| {
            AppError::Operation(match direction {
                MoveDirection::Up => "Field is already first".to_string(),
                MoveDirection::Down => "Field is already last".to_string(),
            })
        })?;

    sqlx::query("UPDATE custom_fields SET field_order = ? WHERE id = ?")
        .bind(destination)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE custom_fields SET field_order = ? WHERE id = ?")
        .bind(current)
        .bind(other)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

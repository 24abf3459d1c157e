use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

use super::types::*;
use crate::errors::AppError;

pub const MAX_FIELD_LENGTH: i64 = 32000;
pub const MAX_REQUIRED_SELECTIONS: i64 = 100;

fn default_true() -> bool {
    true
}

/// Admin save payload for a custom field.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub location: FieldLocation,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub field_type: String,
    #[serde(default)]
    pub length: i64,
    #[serde(default)]
    pub bbc: bool,
    #[serde(default)]
    pub display_empty: bool,
    #[serde(default)]
    pub placement: Option<String>,
    #[serde(default)]
    pub see_users: bool,
    #[serde(default)]
    pub see_staff: bool,
    #[serde(default)]
    pub edit_users: bool,
    #[serde(default)]
    pub edit_staff: bool,
    /// Submitted option labels; blank labels are dropped.
    #[serde(default)]
    pub options: BTreeMap<u32, String>,
    #[serde(default)]
    pub default_option: Option<u32>,
    #[serde(default)]
    pub default_options: BTreeSet<u32>,
    #[serde(default)]
    pub default_checked: bool,
    #[serde(default)]
    pub rows: Option<u32>,
    #[serde(default)]
    pub cols: Option<u32>,
    /// Departments the field is present in. Absent departments are not applicable.
    #[serde(default)]
    pub departments: BTreeMap<i64, DeptForm>,
    #[serde(default)]
    pub cancel: bool,
    #[serde(default)]
    pub delete: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeptForm {
    #[serde(default)]
    pub required: bool,
    /// Multi-select only.
    #[serde(default)]
    pub min_selected: i64,
}

fn valid_icon(icon: &str) -> bool {
    !icon.is_empty()
        && icon
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// Turn a submitted form into a definition that can be written as-is.
pub fn normalize(form: &FieldForm) -> Result<NewField, AppError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Field name is required".to_string()));
    }
    let field_type: FieldType = form.field_type.trim().parse()?;

    let placement = form
        .placement
        .as_deref()
        .and_then(|p| p.parse::<Placement>().ok())
        .unwrap_or(Placement::Details);
    if placement == Placement::SubjectPrefixFilterable
        && !matches!(field_type, FieldType::Select | FieldType::Radio)
    {
        return Err(AppError::Validation(format!(
            "A {field_type} field cannot be a filterable prefix"
        )));
    }

    let options: BTreeMap<u32, String> = if field_type.has_options() {
        form.options
            .iter()
            .map(|(k, v)| (*k, v.trim().to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect()
    } else {
        BTreeMap::new()
    };

    let default = match field_type {
        FieldType::Checkbox => DefaultValue::Checked(form.default_checked),
        FieldType::LargeText => DefaultValue::Dimensions {
            rows: form.rows.unwrap_or(0),
            cols: form.cols.unwrap_or(0),
        },
        FieldType::Select | FieldType::Radio => match form.default_option {
            Some(k) if options.contains_key(&k) => DefaultValue::Option(k),
            _ => DefaultValue::None,
        },
        FieldType::MultiSelect => DefaultValue::Options(
            form.default_options
                .iter()
                .filter(|k| options.contains_key(k))
                .copied()
                .collect(),
        ),
        FieldType::Text | FieldType::Int | FieldType::Float => DefaultValue::None,
    };

    let option_count = options.len() as i64;
    let departments = form
        .departments
        .iter()
        .map(|(dept, d)| {
            let requirement = if field_type == FieldType::MultiSelect {
                let min = d.min_selected.clamp(0, MAX_REQUIRED_SELECTIONS).min(option_count);
                DeptRequirement::AtLeast(min as u32)
            } else if d.required {
                DeptRequirement::Required
            } else {
                DeptRequirement::Optional
            };
            (*dept, requirement)
        })
        .collect();

    Ok(NewField {
        name: name.to_string(),
        description: form.description.trim().to_string(),
        active: form.active,
        location: form.location,
        icon: if valid_icon(&form.icon) { form.icon.clone() } else { String::new() },
        field_type,
        length: form.length.clamp(0, MAX_FIELD_LENGTH),
        options: FieldOptions { labels: options, inactive: BTreeSet::new() },
        bbc: form.bbc && field_type.is_text(),
        default,
        visibility: Visibility::new(form.see_users, form.see_staff, form.edit_users, form.edit_staff),
        display_empty: form.display_empty,
        placement,
        departments,
    })
}

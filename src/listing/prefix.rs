use serde::Serialize;
use std::collections::HashMap;

use crate::models::custom_field::{FieldDefinition, FieldOptions, FieldType, Placement};

/// A custom field that decorates ticket subjects.
#[derive(Debug, Clone)]
pub struct PrefixField {
    pub id: i64,
    pub name: String,
    pub field_type: FieldType,
    pub filterable: bool,
    pub options: FieldOptions,
}

impl PrefixField {
    /// `None` unless the field is placed in the subject prefix.
    pub fn from_definition(def: &FieldDefinition) -> Option<Self> {
        let filterable = match def.placement {
            Placement::SubjectPrefixFilterable => true,
            Placement::SubjectPrefix => false,
            Placement::Details | Placement::Info => return None,
        };
        Some(PrefixField {
            id: def.id,
            name: def.name.clone(),
            field_type: def.field_type,
            filterable,
            options: def.options.clone(),
        })
    }

    /// Rendered text for a stored value, if it has one.
    fn render(&self, raw: &str) -> Option<String> {
        match self.field_type {
            FieldType::Checkbox => Some(if raw.trim() == "0" { "No" } else { "Yes" }.to_string()),
            FieldType::Select | FieldType::Radio => self.options.label_for(raw).map(str::to_string),
            FieldType::MultiSelect => {
                let labels: Vec<&str> = raw
                    .split(',')
                    .filter_map(|key| self.options.label_for(key))
                    .collect();
                (!labels.is_empty()).then(|| labels.join(" "))
            }
            FieldType::Text | FieldType::LargeText | FieldType::Int | FieldType::Float => {
                Some(raw.to_string())
            }
        }
    }
}

/// Clickable quick-filter label in front of a subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrefixLink {
    pub field_id: i64,
    pub value: String,
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedSubject {
    pub subject: String,
    pub links: Vec<PrefixLink>,
}

/// Link that narrows the current listing to one field value.
pub fn filter_href(base_path: &str, dept: Option<i64>, field_id: i64, value: &str) -> String {
    let mut params = vec![];
    if let Some(dept) = dept {
        params.push(("dept", dept.to_string()));
    }
    params.push(("field", field_id.to_string()));
    params.push(("filter", value.to_string()));
    format!("{base_path}?{}", serde_urlencoded::to_string(&params).unwrap_or_default())
}

/// Prefix a subject with `[filter label] ` links first, then one `[a b] ` group
/// for the plain prefix fields, in field order.
pub fn compose(
    subject: &str,
    values: Option<&HashMap<i64, String>>,
    fields: &[PrefixField],
    base_path: &str,
    dept: Option<i64>,
) -> ComposedSubject {
    let mut links = vec![];
    let mut plain = vec![];

    for field in fields {
        let Some(raw) = values.and_then(|v| v.get(&field.id)) else {
            continue;
        };
        if raw.trim().is_empty() {
            continue;
        }
        if field.filterable {
            let Some(label) = field.options.active_label(raw) else {
                continue;
            };
            links.push(PrefixLink {
                field_id: field.id,
                value: raw.clone(),
                label: label.to_string(),
                href: filter_href(base_path, dept, field.id, raw),
            });
        } else if let Some(text) = field.render(raw) {
            plain.push(text);
        }
    }

    let mut prefixed = String::new();
    for link in &links {
        prefixed.push_str(&format!("[{}] ", link.label));
    }
    if !plain.is_empty() {
        prefixed.push_str(&format!("[{}] ", plain.join(" ").trim()));
    }
    prefixed.push_str(subject);
    ComposedSubject { subject: prefixed, links }
}

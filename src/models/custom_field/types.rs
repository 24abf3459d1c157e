use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    LargeText,
    Int,
    Float,
    Select,
    Checkbox,
    Radio,
    MultiSelect,
}

impl FieldType {
    pub const ALL: [FieldType; 8] = [
        FieldType::Text,
        FieldType::LargeText,
        FieldType::Int,
        FieldType::Float,
        FieldType::Select,
        FieldType::Checkbox,
        FieldType::Radio,
        FieldType::MultiSelect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::LargeText => "large_text",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Select => "select",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::MultiSelect => "multi_select",
        }
    }

    /// Types whose values are keys into the option map.
    pub fn has_options(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio | FieldType::MultiSelect)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, FieldType::Text | FieldType::LargeText)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown field type '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Details,
    Info,
    SubjectPrefix,
    SubjectPrefixFilterable,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Details => "details",
            Placement::Info => "info",
            Placement::SubjectPrefix => "subject_prefix",
            Placement::SubjectPrefixFilterable => "subject_prefix_filterable",
        }
    }

    pub fn is_prefix(&self) -> bool {
        matches!(self, Placement::SubjectPrefix | Placement::SubjectPrefixFilterable)
    }
}

impl FromStr for Placement {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "details" => Ok(Placement::Details),
            "info" => Ok(Placement::Info),
            "subject_prefix" => Ok(Placement::SubjectPrefix),
            "subject_prefix_filterable" => Ok(Placement::SubjectPrefixFilterable),
            _ => Err(AppError::Validation(format!("Unknown placement '{s}'"))),
        }
    }
}

/// Where the field is collected: on the opening post, on replies, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldLocation {
    #[default]
    Ticket,
    Reply,
    Both,
}

impl FieldLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldLocation::Ticket => "ticket",
            FieldLocation::Reply => "reply",
            FieldLocation::Both => "both",
        }
    }

    pub fn on_ticket(&self) -> bool {
        matches!(self, FieldLocation::Ticket | FieldLocation::Both)
    }
}

impl FromStr for FieldLocation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ticket" => Ok(FieldLocation::Ticket),
            "reply" => Ok(FieldLocation::Reply),
            "both" => Ok(FieldLocation::Both),
            _ => Err(AppError::Validation(format!("Unknown field location '{s}'"))),
        }
    }
}

/// See/edit flags for end users and staff. Edit implies see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub user_see: bool,
    pub staff_see: bool,
    pub user_edit: bool,
    pub staff_edit: bool,
}

impl Visibility {
    pub fn new(user_see: bool, staff_see: bool, user_edit: bool, staff_edit: bool) -> Self {
        Visibility {
            user_see,
            staff_see,
            user_edit: user_see && user_edit,
            staff_edit: staff_see && staff_edit,
        }
    }

    /// Admins see everything; otherwise the flag for the viewer's side applies.
    pub fn visible_to(&self, is_staff: bool, is_admin: bool) -> bool {
        is_admin || if is_staff { self.staff_see } else { self.user_see }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::new(true, true, false, false)
    }
}

/// Option labels keyed by small integers, plus the keys retired from selection.
///
/// Retired keys keep their labels so historical values still render.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldOptions {
    pub labels: BTreeMap<u32, String>,
    pub inactive: BTreeSet<u32>,
}

impl FieldOptions {
    pub fn from_active<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        FieldOptions {
            labels: entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
            inactive: BTreeSet::new(),
        }
    }

    /// Options still offered for new selection, in key order.
    pub fn active(&self) -> impl Iterator<Item = (u32, &str)> {
        self.labels
            .iter()
            .filter(|(k, _)| !self.inactive.contains(k))
            .map(|(k, v)| (*k, v.as_str()))
    }

    pub fn active_map(&self) -> BTreeMap<u32, String> {
        self.active().map(|(k, v)| (k, v.to_string())).collect()
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Label for a stored raw value, including retired options.
    pub fn label_for(&self, raw: &str) -> Option<&str> {
        let key: u32 = raw.trim().parse().ok()?;
        self.labels.get(&key).map(String::as_str)
    }

    /// Label for a raw value only while its option is still active.
    pub fn active_label(&self, raw: &str) -> Option<&str> {
        let key: u32 = raw.trim().parse().ok()?;
        if self.inactive.contains(&key) {
            return None;
        }
        self.labels.get(&key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Type-dependent default for new tickets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    #[default]
    None,
    Checked(bool),
    Option(u32),
    Options(BTreeSet<u32>),
    /// Text area size for large text fields.
    Dimensions { rows: u32, cols: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "min", rename_all = "snake_case")]
pub enum DeptRequirement {
    NotApplicable,
    Optional,
    Required,
    /// Multi-select only: at least this many options must be chosen.
    AtLeast(u32),
}

impl DeptRequirement {
    pub fn is_applicable(&self) -> bool {
        !matches!(self, DeptRequirement::NotApplicable)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDefinition {
    pub id: i64,
    pub order: i64,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub location: FieldLocation,
    pub icon: String,
    pub field_type: FieldType,
    pub length: i64,
    pub options: FieldOptions,
    pub bbc: bool,
    pub default: DefaultValue,
    pub visibility: Visibility,
    pub display_empty: bool,
    pub placement: Placement,
    /// Departments the field applies to; absent departments are not applicable.
    pub departments: BTreeMap<i64, DeptRequirement>,
}

impl FieldDefinition {
    pub fn requirement_for(&self, dept_id: i64) -> DeptRequirement {
        self.departments
            .get(&dept_id)
            .copied()
            .unwrap_or(DeptRequirement::NotApplicable)
    }
}

/// A validated definition ready to be written; produced by `form::normalize`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewField {
    pub name: String,
    pub description: String,
    pub active: bool,
    pub location: FieldLocation,
    pub icon: String,
    pub field_type: FieldType,
    pub length: i64,
    pub options: FieldOptions,
    pub bbc: bool,
    pub default: DefaultValue,
    pub visibility: Visibility,
    pub display_empty: bool,
    pub placement: Placement,
    pub departments: BTreeMap<i64, DeptRequirement>,
}

/// Row for the admin field list.
#[derive(Debug, Clone, Serialize)]
pub struct FieldListItem {
    pub id: i64,
    pub order: i64,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub location: FieldLocation,
    pub icon: String,
    pub field_type: FieldType,
    pub visibility: Visibility,
    pub placement: Placement,
    pub is_first: bool,
    pub is_last: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
}

impl FromStr for MoveDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(MoveDirection::Up),
            "down" => Ok(MoveDirection::Down),
            _ => Err(AppError::Operation(format!("Cannot move a field '{s}'"))),
        }
    }
}

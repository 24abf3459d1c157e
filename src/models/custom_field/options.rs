use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::types::FieldOptions;
use crate::errors::AppError;

const OPTIONS_VERSION: u32 = 1;

/// Stored shape of the option map. Only this module reads or writes it.
#[derive(Serialize, Deserialize)]
struct StoredOptions {
    version: u32,
    #[serde(default)]
    labels: BTreeMap<u32, String>,
    #[serde(default)]
    inactive: BTreeSet<u32>,
}

pub fn encode(options: &FieldOptions) -> Result<String, AppError> {
    if options.is_empty() {
        return Ok(String::new());
    }
    let stored = StoredOptions {
        version: OPTIONS_VERSION,
        labels: options.labels.clone(),
        inactive: options.inactive.clone(),
    };
    Ok(serde_json::to_string(&stored)?)
}

pub fn decode(raw: &str) -> Result<FieldOptions, AppError> {
    if raw.trim().is_empty() {
        return Ok(FieldOptions::default());
    }
    let stored: StoredOptions = serde_json::from_str(raw)?;
    if stored.version != OPTIONS_VERSION {
        return Err(AppError::Validation(format!(
            "Unsupported option encoding version {}",
            stored.version
        )));
    }
    Ok(FieldOptions { labels: stored.labels, inactive: stored.inactive })
}

/// Overlay a newly submitted option set on the stored one.
///
/// Keys missing from the submission are retired into `inactive` (their labels
/// stay, values may still reference them). Submitted labels win on key
/// collisions and re-activate a retired key.
pub fn migrate(old: &FieldOptions, submitted: &BTreeMap<u32, String>) -> FieldOptions {
    let mut labels = old.labels.clone();
    let inactive: BTreeSet<u32> = old
        .labels
        .keys()
        .filter(|k| !submitted.contains_key(k))
        .copied()
        .collect();
    for (k, v) in submitted {
        labels.insert(*k, v.clone());
    }
    FieldOptions { labels, inactive }
}

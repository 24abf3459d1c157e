use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A quick-filter field with the options a renderer may offer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterField {
    pub id: i64,
    pub name: String,
    pub options: BTreeMap<u32, String>,
}

/// Keep only options that some ticket actually holds; drop fields left with none.
pub fn reduce_in_use(candidates: Vec<FilterField>, recorded: &[(i64, String)]) -> Vec<FilterField> {
    let mut in_use: HashMap<i64, HashSet<&str>> = HashMap::new();
    for (field_id, value) in recorded {
        in_use.entry(*field_id).or_default().insert(value.trim());
    }

    candidates
        .into_iter()
        .filter_map(|mut field| {
            let values = in_use.get(&field.id)?;
            field.options.retain(|key, _| values.contains(key.to_string().as_str()));
            (!field.options.is_empty()).then_some(field)
        })
        .collect()
}

use super::types::FieldType;

/// Types a field may be changed to.
///
/// `None` lists every type (used when creating a field). The graph only widens:
/// int becomes float but never the reverse, single-choice types are
/// interchangeable and may grow into multi-select, and multi-select is terminal.
pub fn compatible_types(from: Option<FieldType>) -> Vec<FieldType> {
    use FieldType::*;
    match from {
        None => FieldType::ALL.to_vec(),
        Some(Text) | Some(LargeText) => vec![Text, LargeText],
        Some(Int) => vec![Int, Float],
        Some(Float) => vec![Float],
        Some(Select) | Some(Radio) => vec![Select, Radio, MultiSelect],
        Some(Checkbox) => vec![Checkbox],
        Some(MultiSelect) => vec![MultiSelect],
    }
}

pub fn can_change(from: FieldType, to: FieldType) -> bool {
    compatible_types(Some(from)).contains(&to)
}

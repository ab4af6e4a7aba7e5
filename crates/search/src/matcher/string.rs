//! String matching against document values.

use serde_json::Value;

/// Collects every string nested anywhere inside `value`.
///
/// Complex types like HumanName and Address index all of their string
/// sub-fields, so the analyzed-search approximation considers each one.
fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => {
            for item in items {
                collect_strings(item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_strings(item, out);
            }
        }
        _ => {}
    }
}

/// Matches a string search value against one document value.
///
/// The default search approximates an analyzed match with
/// case-insensitive equality. `:exact` is case-sensitive equality and
/// `:contains` is a case-insensitive substring test.
pub fn string_match(search_value: &str, modifier: Option<&str>, resource_value: &Value) -> bool {
    let mut candidates = Vec::new();
    collect_strings(resource_value, &mut candidates);

    match modifier {
        Some("exact") => candidates.iter().any(|s| *s == search_value),
        Some("contains") => {
            let needle = search_value.to_lowercase();
            candidates.iter().any(|s| s.to_lowercase().contains(&needle))
        }
        _ => {
            let needle = search_value.to_lowercase();
            candidates.iter().any(|s| s.to_lowercase() == needle)
        }
    }
}

//! Token matching against document values.
//!
//! Handles the same document shapes the compiled query reaches:
//! Coding, CodeableConcept, Identifier, ContactPoint and bare code or
//! boolean primitives.

use serde_json::Value;

use crate::values::TokenSearchValue;

fn primitive_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Matches one Coding/Identifier-shaped object or primitive.
fn single_match(search_value: &TokenSearchValue, resource_value: &Value) -> bool {
    let doc_system = resource_value.get("system").and_then(Value::as_str);

    if search_value.explicit_no_system && doc_system.is_some() {
        return false;
    }
    if let Some(system) = &search_value.system {
        if doc_system != Some(system.as_str()) {
            return false;
        }
    }

    let Some(code) = &search_value.code else {
        // A system-only search constrains nothing further.
        return true;
    };
    match resource_value {
        Value::Object(map) => ["code", "value"]
            .iter()
            .filter_map(|field| map.get(*field))
            .filter_map(primitive_as_string)
            .any(|doc_code| doc_code == *code),
        _ => primitive_as_string(resource_value).is_some_and(|doc_code| doc_code == *code),
    }
}

/// Matches a token search value against one document value.
pub fn token_match(search_value: &TokenSearchValue, resource_value: &Value) -> bool {
    // CodeableConcept: any of its codings (or its text) may match.
    if let Some(codings) = resource_value.get("coding").and_then(Value::as_array) {
        if codings.iter().any(|coding| single_match(search_value, coding)) {
            return true;
        }
        if let (None, Some(code), Some(text)) = (
            &search_value.system,
            &search_value.code,
            resource_value.get("text").and_then(Value::as_str),
        ) {
            return code == text;
        }
        return false;
    }
    single_match(search_value, resource_value)
}

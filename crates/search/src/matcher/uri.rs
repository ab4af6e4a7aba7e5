//! URI matching against document values.

use serde_json::Value;

/// Matches a URI search value with strict string equality.
pub fn uri_match(search_value: &str, resource_value: &Value) -> bool {
    resource_value.as_str() == Some(search_value)
}

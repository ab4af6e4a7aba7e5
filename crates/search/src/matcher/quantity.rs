//! Quantity matching against document values.

use serde_json::Value;

use crate::matcher::number::compare;
use crate::values::QuantitySearchValue;

/// Matches a quantity search value against one Quantity-shaped value.
pub fn quantity_match(search_value: &QuantitySearchValue, resource_value: &Value) -> bool {
    let Some(value) = resource_value.get("value").and_then(Value::as_f64) else {
        return false;
    };
    if !compare(
        search_value.prefix,
        search_value.number,
        search_value.implicit_range.start,
        search_value.implicit_range.end,
        value,
    ) {
        return false;
    }

    let doc_system = resource_value.get("system").and_then(Value::as_str);
    let doc_code = resource_value.get("code").and_then(Value::as_str);
    let doc_unit = resource_value.get("unit").and_then(Value::as_str);

    match (&search_value.system, &search_value.code) {
        (Some(system), Some(code)) => {
            doc_system == Some(system.as_str()) && doc_code == Some(code.as_str())
        }
        (None, Some(code)) => {
            doc_code == Some(code.as_str()) || doc_unit == Some(code.as_str())
        }
        (Some(system), None) => doc_system == Some(system.as_str()),
        (None, None) => true,
    }
}

//! Number matching against document values.

use serde_json::Value;

use crate::values::{NumberSearchValue, Prefix};

pub(crate) fn compare(prefix: Prefix, number: f64, start: f64, end: f64, value: f64) -> bool {
    match prefix {
        Prefix::Eq => value >= start && value <= end,
        Prefix::Ne => value < start || value > end,
        Prefix::Gt | Prefix::Sa => value > number,
        Prefix::Ge => value >= number,
        Prefix::Lt | Prefix::Eb => value < number,
        Prefix::Le => value <= number,
    }
}

/// Matches a number search value against one document value.
pub fn number_match(search_value: &NumberSearchValue, resource_value: &Value) -> bool {
    let Some(value) = resource_value.as_f64() else {
        return false;
    };
    compare(
        search_value.prefix,
        search_value.number,
        search_value.implicit_range.start,
        search_value.implicit_range.end,
        value,
    )
}

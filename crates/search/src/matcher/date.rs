//! Date matching against document values.

use serde_json::Value;

use crate::ranges::parse_date_range;
use crate::values::{DateSearchValue, Prefix};

/// Matches a date search value against one document value.
///
/// Scalar date strings are parsed at their own precision and compared
/// as intervals. Period objects need both `start` and `end`; a
/// half-open Period cannot be ordered against the searched interval.
pub fn date_match(search_value: &DateSearchValue, resource_value: &Value) -> bool {
    let s = search_value.range.start;
    let e = search_value.range.end;

    match resource_value {
        Value::String(literal) => {
            let Ok(range) = parse_date_range(literal) else {
                return false;
            };
            match search_value.prefix {
                Prefix::Eq => range.start >= s && range.end <= e,
                Prefix::Ne => range.end < s || range.start > e,
                Prefix::Gt => range.start > s,
                Prefix::Ge => range.start >= s,
                Prefix::Lt => range.end < e,
                Prefix::Le => range.end <= e,
                Prefix::Sa => range.start > e,
                Prefix::Eb => range.end < s,
            }
        }
        Value::Object(map) => {
            let (Some(Value::String(start)), Some(Value::String(end))) =
                (map.get("start"), map.get("end"))
            else {
                return false;
            };
            let (Ok(start), Ok(end)) = (parse_date_range(start), parse_date_range(end)) else {
                return false;
            };
            let period_start = start.start;
            let period_end = end.end;
            match search_value.prefix {
                Prefix::Eq => period_start >= s && period_end <= e,
                Prefix::Ne => !(period_start >= s && period_end <= e),
                Prefix::Gt | Prefix::Ge => period_end >= s,
                Prefix::Lt | Prefix::Le => period_start <= e,
                Prefix::Sa => period_start > e,
                Prefix::Eb => period_end < s,
            }
        }
        _ => false,
    }
}

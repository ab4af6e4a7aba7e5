//! Date search value parser.

use crate::error::Result;
use crate::ranges::parse_date_range;
use crate::values::{DateSearchValue, Prefix};

/// Parses `[prefix]date-literal` at year through millisecond precision.
pub fn parse_date_search_value(raw: &str) -> Result<DateSearchValue> {
    let (prefix, literal) = Prefix::extract(raw);
    Ok(DateSearchValue {
        prefix,
        range: parse_date_range(literal)?,
    })
}

//! Quantity search value parser.

use std::sync::LazyLock;

use crate::error::{InvalidSearchParameter, Result};
use crate::ranges::implicit_number_range;
use crate::values::{Prefix, QuantitySearchValue};

static QUANTITY_NUMBER_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[+-]?\d+(\.\d+)?([eE][+-]?\d+)?$").expect("quantity number regex is valid")
});

/// Parses `[prefix]number[|system|code]`.
///
/// System and code are independently omittable: `5.4`, `5.4||mg`,
/// `5.4|http://unitsofmeasure.org|`, and the full form are all valid. The
/// precision tolerance is computed from the numeric part only.
pub fn parse_quantity_search_value(raw: &str) -> Result<QuantitySearchValue> {
    let invalid = || InvalidSearchParameter::new(format!("Invalid quantity search value: {}", raw));

    let (prefix, rest) = Prefix::extract(raw);
    let parts: Vec<&str> = rest.split('|').collect();
    let (literal, system, code) = match parts[..] {
        [literal] => (literal, None, None),
        [literal, system, code] => (literal, non_empty(system), non_empty(code)),
        _ => return Err(invalid()),
    };

    if !QUANTITY_NUMBER_REGEX.is_match(literal) {
        return Err(invalid());
    }
    let number: f64 = literal.parse().map_err(|_| invalid())?;

    Ok(QuantitySearchValue {
        prefix,
        number,
        implicit_range: implicit_number_range(number, literal),
        system,
        code,
    })
}

fn non_empty(part: &str) -> Option<String> {
    if part.is_empty() {
        None
    } else {
        Some(part.to_string())
    }
}

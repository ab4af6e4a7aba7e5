//! Number search value parser.

use std::sync::LazyLock;

use crate::error::{InvalidSearchParameter, Result};
use crate::ranges::implicit_number_range;
use crate::values::{NumberSearchValue, Prefix};

static NUMBER_LITERAL_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[+-]?\d+(\.\d+)?([eE][+-]?\d+)?$").expect("number literal regex is valid")
});

/// Parses `[prefix]decimal-or-exponential-literal`.
///
/// Trailing garbage, embedded `|system|code`, and non-numeric text are
/// rejected.
pub fn parse_number_search_value(raw: &str) -> Result<NumberSearchValue> {
    let (prefix, literal) = Prefix::extract(raw);
    if !NUMBER_LITERAL_REGEX.is_match(literal) {
        return Err(InvalidSearchParameter::new(format!(
            "Invalid number search value: {}",
            raw
        )));
    }
    let number: f64 = literal.parse().map_err(|_| {
        InvalidSearchParameter::new(format!("Invalid number search value: {}", raw))
    })?;
    Ok(NumberSearchValue {
        prefix,
        number,
        implicit_range: implicit_number_range(number, literal),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_integer() {
        let value = parse_number_search_value("10").unwrap();
        assert_eq!(value.prefix, Prefix::Eq);
        assert_eq!(value.number, 10.0);
        assert_eq!(value.implicit_range.start, 9.5);
        assert_eq!(value.implicit_range.end, 10.5);
    }

    #[test]
    fn test_prefixed() {
        let value = parse_number_search_value("lt10").unwrap();
        assert_eq!(value.prefix, Prefix::Lt);
        assert_eq!(value.number, 10.0);
    }

    #[test]
    fn test_negative_decimal() {
        let value = parse_number_search_value("-8.2").unwrap();
        assert_eq!(value.number, -8.2);
        assert_eq!(value.implicit_range.start, -8.25);
        assert_eq!(value.implicit_range.end, -8.149999999999999);
    }

    #[test]
    fn test_exponential() {
        let value = parse_number_search_value("ge8e-1").unwrap();
        assert_eq!(value.prefix, Prefix::Ge);
        assert_eq!(value.number, 0.8);
        assert_eq!(value.implicit_range.start, 0.75);
        assert_eq!(value.implicit_range.end, 0.8500000000000001);
    }

    #[test]
    fn test_invalid_inputs() {
        for raw in [
            "This is not a number at all",
            "badPrefix100",
            "100someSuffix",
            "100|system|code",
            "",
        ] {
            assert!(parse_number_search_value(raw).is_err(), "{}", raw);
        }
    }
}

//! Typed search values.
//!
//! Every incoming search value is parsed into one [`SearchValue`] variant
//! according to its parameter's declared data type. The structures here are
//! immutable, built once per query and shared by both the query-DSL
//! compiler and the in-memory matcher so the two cannot drift apart on
//! what a value means.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ranges::{DateRange, NumberRange};

/// Comparison prefixes for number, date, and quantity values.
///
/// See: https://build.fhir.org/search.html#prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Prefix {
    /// Equal (default when no prefix is given).
    #[default]
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Greater than or equal.
    Ge,
    /// Less than or equal.
    Le,
    /// Starts after.
    Sa,
    /// Ends before.
    Eb,
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Eq => write!(f, "eq"),
            Prefix::Ne => write!(f, "ne"),
            Prefix::Gt => write!(f, "gt"),
            Prefix::Lt => write!(f, "lt"),
            Prefix::Ge => write!(f, "ge"),
            Prefix::Le => write!(f, "le"),
            Prefix::Sa => write!(f, "sa"),
            Prefix::Eb => write!(f, "eb"),
        }
    }
}

impl FromStr for Prefix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Prefix::Eq),
            "ne" => Ok(Prefix::Ne),
            "gt" => Ok(Prefix::Gt),
            "lt" => Ok(Prefix::Lt),
            "ge" => Ok(Prefix::Ge),
            "le" => Ok(Prefix::Le),
            "sa" => Ok(Prefix::Sa),
            "eb" => Ok(Prefix::Eb),
            _ => Err(format!("unknown search prefix: {}", s)),
        }
    }
}

impl Prefix {
    /// Extracts a prefix from the beginning of a value literal.
    ///
    /// Returns the prefix and the remainder; a literal without a
    /// recognized prefix behaves as `eq`.
    pub fn extract(value: &str) -> (Self, &str) {
        if let Some(head) = value.get(..2) {
            if let Ok(prefix) = head.parse() {
                return (prefix, &value[2..]);
            }
        }
        (Prefix::Eq, value)
    }
}

/// A parsed number search value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumberSearchValue {
    /// Comparison prefix (`eq` when absent).
    pub prefix: Prefix,
    /// The literal's numeric value.
    pub number: f64,
    /// Tolerance interval implied by the literal's precision.
    pub implicit_range: NumberRange,
}

/// A parsed date search value.
///
/// The range is always a closed interval; a bare instant parses to the
/// floor/ceiling of the literal at its stated precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSearchValue {
    /// Comparison prefix (`eq` when absent).
    pub prefix: Prefix,
    /// Precision interval of the literal, in UTC.
    pub range: DateRange,
}

/// A parsed quantity search value: `[prefix]number[|system|code]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitySearchValue {
    /// Comparison prefix (`eq` when absent).
    pub prefix: Prefix,
    /// The literal's numeric value.
    pub number: f64,
    /// Tolerance interval implied by the numeric part's precision.
    pub implicit_range: NumberRange,
    /// Code system URI, when given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Unit code, when given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A parsed token search value: `[system]|code` or a bare `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSearchValue {
    /// Code system URI. `None` for the bare-code form (any system) and
    /// for the `|code` form, where `explicit_no_system` forbids one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// The code. Absent for the `system|` form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// True only for `|code` input: the matched element must carry no
    /// system at all.
    pub explicit_no_system: bool,
}

/// A classified reference search value.
///
/// Parsing never fails; values that fit no recognized shape are preserved
/// verbatim as [`ReferenceSearchValue::Unparseable`] for literal matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reference_type", rename_all = "camelCase")]
pub enum ReferenceSearchValue {
    /// A bare id; candidate types come from the parameter's targets.
    IdOnly {
        id: String,
    },
    /// `Type/id`.
    Relative {
        resource_type: String,
        id: String,
    },
    /// `<url>/Type/id`.
    Absolute {
        fhir_service_base_url: String,
        resource_type: String,
        id: String,
    },
    /// Anything else, kept verbatim.
    Unparseable {
        raw_value: String,
    },
}

/// A typed search value, one variant per FHIR search data type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchValue {
    String(String),
    Number(NumberSearchValue),
    Date(DateSearchValue),
    Quantity(QuantitySearchValue),
    Token(TokenSearchValue),
    Reference(ReferenceSearchValue),
    Uri(String),
}

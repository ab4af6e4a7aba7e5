//! Error type for search parameter parsing and query compilation.
//!
//! Malformed search input is a client error: it is reported synchronously
//! through [`InvalidSearchParameter`] and never retried. Anything else
//! (e.g. a registry handing back inconsistent data) is a programming error
//! and is allowed to panic.

use thiserror::Error;

/// A search parameter, modifier, or value that cannot be understood.
///
/// The message identifies the offending input so it can be surfaced to the
/// client as-is (FHIR maps this to a `400 Bad Request` OperationOutcome).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct InvalidSearchParameter {
    /// Human-readable description of what was invalid.
    pub message: String,
}

impl InvalidSearchParameter {
    /// Creates an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, InvalidSearchParameter>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_the_message() {
        let err = InvalidSearchParameter::new("Unsupported string search modifier: fuzzy");
        assert_eq!(
            err.to_string(),
            "Unsupported string search modifier: fuzzy"
        );
    }
}

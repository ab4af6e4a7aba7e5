//! Token search value parser.

use crate::error::{InvalidSearchParameter, Result};
use crate::values::TokenSearchValue;

/// Parses `[system]|[code]` or a bare `code`.
///
/// `|code` means "the element must carry no system"; a bare code with no
/// `|` at all leaves the system unconstrained. `system|` constrains the
/// system only.
pub fn parse_token_search_value(raw: &str) -> Result<TokenSearchValue> {
    let parts: Vec<&str> = raw.split('|').collect();
    match parts[..] {
        [code] => Ok(TokenSearchValue {
            system: None,
            code: Some(code.to_string()),
            explicit_no_system: false,
        }),
        [system, code] => {
            if system.is_empty() && code.is_empty() {
                return Err(InvalidSearchParameter::new(format!(
                    "Invalid token search value: {}",
                    raw
                )));
            }
            Ok(TokenSearchValue {
                system: non_empty(system),
                code: non_empty(code),
                explicit_no_system: system.is_empty(),
            })
        }
        _ => Err(InvalidSearchParameter::new(format!(
            "Invalid token search value: {}",
            raw
        ))),
    }
}

fn non_empty(part: &str) -> Option<String> {
    if part.is_empty() {
        None
    } else {
        Some(part.to_string())
    }
}

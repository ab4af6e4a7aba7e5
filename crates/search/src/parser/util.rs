//! Shared parsing helpers: `name:modifier` splitting and escape-aware
//! comma splitting.

/// A query parameter key split into name and modifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchModifiers<'a> {
    /// The parameter name before the first colon.
    pub parameter_name: &'a str,
    /// The modifier after the first colon. `None` when no colon is
    /// present; the empty string when the key ends with a bare colon.
    pub modifier: Option<&'a str>,
}

/// Splits a parameter key on its first colon. Never fails.
pub fn parse_search_modifiers(param_key: &str) -> SearchModifiers<'_> {
    match param_key.split_once(':') {
        Some((parameter_name, modifier)) => SearchModifiers {
            parameter_name,
            modifier: Some(modifier),
        },
        None => SearchModifiers {
            parameter_name: param_key,
            modifier: None,
        },
    }
}

/// Splits a raw value on unescaped commas (OR branches).
///
/// A comma preceded by a backslash is literal: `John\,Doe` is one branch
/// containing `John,Doe`. Implemented as an explicit scan with an escape
/// flag so backslash handling stays auditable for non-ASCII input; any
/// other escaped character keeps its backslash verbatim.
pub fn split_escaped_commas(value: &str) -> Vec<String> {
    let mut branches = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for c in value.chars() {
        if escaped {
            if c != ',' {
                current.push('\\');
            }
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ',' {
            branches.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if escaped {
        current.push('\\');
    }
    branches.push(current);
    branches
}

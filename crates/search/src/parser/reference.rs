//! Reference search value parser.

use std::sync::LazyLock;

use crate::values::ReferenceSearchValue;

static ID_REGEX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[A-Za-z0-9\-\.]{1,64}$").expect("id regex is valid"));

static RESOURCE_TYPE_REGEX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[A-Z][a-zA-Z]+$").expect("resource type regex is valid"));

/// Classifies a reference value as id-only, relative (`Type/id`), absolute
/// (`<url>/Type/id`, split at the last two path segments), or unparseable.
///
/// Never fails: values matching no recognized shape are preserved verbatim
/// so they can still be matched literally downstream.
pub fn parse_reference_search_value(raw: &str) -> ReferenceSearchValue {
    let parts: Vec<&str> = raw.split('/').collect();
    match parts[..] {
        [id] if ID_REGEX.is_match(id) => ReferenceSearchValue::IdOnly { id: id.to_string() },
        [resource_type, id]
            if RESOURCE_TYPE_REGEX.is_match(resource_type) && ID_REGEX.is_match(id) =>
        {
            ReferenceSearchValue::Relative {
                resource_type: resource_type.to_string(),
                id: id.to_string(),
            }
        }
        [.., resource_type, id]
            if parts.len() > 2
                && RESOURCE_TYPE_REGEX.is_match(resource_type)
                && ID_REGEX.is_match(id) =>
        {
            let base_url = parts[..parts.len() - 2].join("/");
            if base_url.starts_with("http://") || base_url.starts_with("https://") {
                ReferenceSearchValue::Absolute {
                    fhir_service_base_url: base_url,
                    resource_type: resource_type.to_string(),
                    id: id.to_string(),
                }
            } else {
                ReferenceSearchValue::Unparseable {
                    raw_value: raw.to_string(),
                }
            }
        }
        _ => ReferenceSearchValue::Unparseable {
            raw_value: raw.to_string(),
        },
    }
}

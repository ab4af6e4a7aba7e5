//! Reference matching against document values.

use serde_json::Value;

use crate::values::ReferenceSearchValue;

/// Expands a reference value into the candidate strings it may be
/// stored as, without requiring a service base URL.
fn candidates(
    search_value: &ReferenceSearchValue,
    base_url: Option<&str>,
    target: &[String],
) -> Vec<String> {
    match search_value {
        ReferenceSearchValue::IdOnly { id } => target
            .iter()
            .flat_map(|target_type| {
                let mut forms = Vec::new();
                if let Some(base_url) = base_url {
                    forms.push(format!("{}/{}/{}", base_url, target_type, id));
                }
                forms.push(format!("{}/{}", target_type, id));
                forms
            })
            .collect(),
        ReferenceSearchValue::Relative { resource_type, id } => {
            let mut forms = vec![format!("{}/{}", resource_type, id)];
            if let Some(base_url) = base_url {
                forms.push(format!("{}/{}/{}", base_url, resource_type, id));
            }
            forms
        }
        ReferenceSearchValue::Absolute {
            fhir_service_base_url,
            resource_type,
            id,
        } => {
            let mut forms = Vec::new();
            if base_url == Some(fhir_service_base_url.as_str()) {
                forms.push(format!("{}/{}", resource_type, id));
            }
            forms.push(format!("{}/{}/{}", fhir_service_base_url, resource_type, id));
            forms
        }
        ReferenceSearchValue::Unparseable { raw_value } => vec![raw_value.clone()],
    }
}

/// Matches a reference search value against one document value, either
/// a Reference-shaped object or a plain string.
pub fn reference_match(
    search_value: &ReferenceSearchValue,
    base_url: Option<&str>,
    target: &[String],
    resource_value: &Value,
) -> bool {
    let stored = match resource_value {
        Value::Object(map) => map.get("reference").and_then(Value::as_str),
        Value::String(s) => Some(s.as_str()),
        _ => None,
    };
    let Some(stored) = stored else {
        return false;
    };
    candidates(search_value, base_url, target)
        .iter()
        .any(|candidate| candidate == stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::reference::parse_reference_search_value;
    use serde_json::json;

    #[test]
    fn test_relative_reference() {
        let search = parse_reference_search_value("Organization/111");
        let reference = json!({ "reference": "Organization/111" });
        assert!(reference_match(&search, None, &[], &reference));
    }

    #[test]
    fn test_absolute_stored_form_needs_base_url() {
        let search = parse_reference_search_value("Organization/111");
        let reference = json!({ "reference": "https://base-url.com/Organization/111" });
        assert!(!reference_match(&search, None, &[], &reference));
        assert!(reference_match(
            &search,
            Some("https://base-url.com"),
            &[],
            &reference
        ));
    }

    #[test]
    fn test_id_only_uses_targets() {
        let search = parse_reference_search_value("111");
        let reference = json!({ "reference": "Organization/111" });
        assert!(!reference_match(&search, None, &[], &reference));
        assert!(reference_match(
            &search,
            None,
            &["Organization".to_string()],
            &reference
        ));
    }

    #[test]
    fn test_plain_string_value() {
        let search = parse_reference_search_value("Patient/abc");
        assert!(reference_match(&search, None, &[], &json!("Patient/abc")));
    }

    #[test]
    fn test_foreign_absolute_reference() {
        let search = parse_reference_search_value("https://other.com/Organization/111");
        let reference = json!({ "reference": "https://other.com/Organization/111" });
        assert!(reference_match(
            &search,
            Some("https://base-url.com"),
            &[],
            &reference
        ));
        assert!(!reference_match(
            &search,
            Some("https://base-url.com"),
            &[],
            &json!({ "reference": "Organization/111" })
        ));
    }
}

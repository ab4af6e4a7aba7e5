//! Reference search compilation.
//!
//! References are stored as literal strings, so the compiler expands
//! each parsed value into every candidate string form and matches with
//! a `terms` query.

use crate::error::{InvalidSearchParameter, Result};
use crate::query::dsl::QueryFragment;
use crate::registry::CompiledSearchParam;
use crate::values::ReferenceSearchValue;

/// Expands a reference value into its candidate stored strings.
pub fn reference_candidates(
    value: &ReferenceSearchValue,
    base_url: &str,
    search_param_name: &str,
    target: &[String],
) -> Result<Vec<String>> {
    let candidates = match value {
        ReferenceSearchValue::IdOnly { id } => {
            if target.is_empty() {
                return Err(InvalidSearchParameter::new(format!(
                    "Search parameter {} must include a resource type, e.g. {}=ResourceType/{}",
                    search_param_name, search_param_name, id
                )));
            }
            target
                .iter()
                .flat_map(|target_type| {
                    [
                        format!("{}/{}/{}", base_url, target_type, id),
                        format!("{}/{}", target_type, id),
                    ]
                })
                .collect()
        }
        ReferenceSearchValue::Relative { resource_type, id } => vec![
            format!("{}/{}", resource_type, id),
            format!("{}/{}/{}", base_url, resource_type, id),
        ],
        ReferenceSearchValue::Absolute {
            fhir_service_base_url,
            resource_type,
            id,
        } => {
            let mut candidates = Vec::new();
            if fhir_service_base_url == base_url {
                candidates.push(format!("{}/{}", resource_type, id));
            }
            candidates.push(format!("{}/{}/{}", fhir_service_base_url, resource_type, id));
            candidates
        }
        ReferenceSearchValue::Unparseable { raw_value } => vec![raw_value.clone()],
    };
    Ok(candidates)
}

/// Compiles a reference value against one compiled path.
pub fn reference_query(
    compiled: &CompiledSearchParam,
    value: &ReferenceSearchValue,
    use_keyword_sub_fields: bool,
    base_url: &str,
    search_param_name: &str,
    target: &[String],
) -> Result<QueryFragment> {
    let values = reference_candidates(value, base_url, search_param_name, target)?;
    let keyword_suffix = if use_keyword_sub_fields { ".keyword" } else { "" };
    Ok(QueryFragment::Terms {
        field: format!("{}.reference{}", compiled.path, keyword_suffix),
        values,
    })
}

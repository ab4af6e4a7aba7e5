//! In-memory query matching.
//!
//! Applies a [`ParsedQuery`] directly to a resource document, deciding
//! without the search engine whether the resource would be a hit. Used
//! to match changed resources against stored queries such as
//! subscription criteria, so it must agree with the compiled query DSL;
//! any divergence is a correctness bug.

pub mod date;
pub mod number;
pub mod quantity;
pub mod reference;
pub mod string;
pub mod token;
pub mod uri;

use serde_json::Value;

use crate::parser::{ParsedQuery, ParsedSearchParam};
use crate::registry::CompiledSearchParam;
use crate::values::SearchValue;

/// Settings for in-memory matching.
#[derive(Debug, Clone, Default)]
pub struct MatchOptions {
    /// This service's base URL. Without it, absolute stored reference
    /// forms cannot be equated with relative search values.
    pub fhir_service_base_url: Option<String>,
}

/// Reads every value reachable from `resource` by walking the dotted
/// `path`, flattening arrays at each step.
pub fn get_all_values_for_path<'a>(resource: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![resource];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            let items = match value {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            };
            for item in items {
                if let Some(child) = item.get(segment) {
                    next.push(child);
                }
            }
        }
        current = next;
    }
    // A trailing array (e.g. name[]) holds the individual values.
    current
        .into_iter()
        .flat_map(|value| match value {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect()
}

fn value_match(
    param: &ParsedSearchParam,
    search_value: &SearchValue,
    resource_value: &Value,
    options: &MatchOptions,
) -> bool {
    match search_value {
        SearchValue::String(value) => {
            string::string_match(value, param.modifier.as_deref(), resource_value)
        }
        SearchValue::Number(value) => number::number_match(value, resource_value),
        SearchValue::Date(value) => date::date_match(value, resource_value),
        SearchValue::Quantity(value) => quantity::quantity_match(value, resource_value),
        SearchValue::Token(value) => token::token_match(value, resource_value),
        SearchValue::Reference(value) => reference::reference_match(
            value,
            options.fhir_service_base_url.as_deref(),
            &param.search_param.target,
            resource_value,
        ),
        SearchValue::Uri(value) => uri::uri_match(value, resource_value),
    }
}

fn condition_holds(compiled: &CompiledSearchParam, resource: &Value) -> bool {
    let Some(condition) = compiled.condition.as_ref().filter(|c| c.len() == 3) else {
        return true;
    };
    get_all_values_for_path(resource, &condition[0])
        .iter()
        .any(|value| value.as_str() == Some(condition[2].as_str()))
}

fn param_match(param: &ParsedSearchParam, resource: &Value, options: &MatchOptions) -> bool {
    param.search_param.compiled.iter().any(|compiled| {
        condition_holds(compiled, resource)
            && get_all_values_for_path(resource, &compiled.path)
                .iter()
                .any(|resource_value| {
                    param
                        .values
                        .iter()
                        .any(|search_value| value_match(param, search_value, resource_value, options))
                })
    })
}

/// Decides whether `resource` satisfies `parsed`.
///
/// The resource type must match; then every parsed parameter (AND) must
/// be satisfied by some compiled path, some document value and some
/// parsed value (all OR).
pub fn match_parsed_query(parsed: &ParsedQuery, resource: &Value, options: &MatchOptions) -> bool {
    if resource.get("resourceType").and_then(Value::as_str) != Some(parsed.resource_type.as_str()) {
        return false;
    }
    parsed
        .search_params
        .iter()
        .all(|param| param_match(param, resource, options))
}

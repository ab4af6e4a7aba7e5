//! `_sort` parameter compilation.
//!
//! Only date-typed search parameters sort reliably, since every other
//! type maps to analyzed text fields, so anything else is rejected.

use serde::Serialize;
use serde_json::{Value, json};

use crate::error::{InvalidSearchParameter, Result};
use crate::registry::{SearchParamType, SearchParameterRegistry};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// One field of a parsed `_sort` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortParameter {
    pub search_param: String,
    pub order: SortOrder,
}

/// Parses a `_sort` value: comma-separated names, `-` prefix for
/// descending, order preserved as given.
pub fn parse_sort_parameter(value: &str) -> Vec<SortParameter> {
    value
        .split(',')
        .map(|field| match field.strip_prefix('-') {
            Some(name) => SortParameter {
                search_param: name.to_string(),
                order: SortOrder::Desc,
            },
            None => SortParameter {
                search_param: field.to_string(),
                order: SortOrder::Asc,
            },
        })
        .collect()
}

fn sort_entry(field: &str, order: SortOrder) -> Value {
    let order = match order {
        SortOrder::Asc => "asc",
        SortOrder::Desc => "desc",
    };
    let mut entry = serde_json::Map::new();
    entry.insert(
        field.to_string(),
        json!({ "order": order, "unmapped_type": "long" }),
    );
    Value::Object(entry)
}

/// Compiles a `_sort` value into an ordered sequence of sort entries.
///
/// Each sortable field yields two entries, the scalar field and the
/// Period sub-field relevant to its direction, both with
/// `unmapped_type: long` so types without the field don't break the
/// sort. Only date parameters and the synthetic `_lastUpdated` are
/// accepted.
pub fn build_sort_clause(
    registry: &dyn SearchParameterRegistry,
    resource_type: &str,
    sort_value: &str,
) -> Result<Vec<Value>> {
    let mut entries = Vec::new();
    for parameter in parse_sort_parameter(sort_value) {
        let path = if parameter.search_param == "_lastUpdated" {
            "meta.lastUpdated".to_string()
        } else {
            let search_param = registry
                .get_search_parameter(resource_type, &parameter.search_param)
                .filter(|p| p.param_type == SearchParamType::Date)
                .ok_or_else(|| {
                    InvalidSearchParameter::new(format!(
                        "Unknown _sort parameter value: {}. Sort is only supported for date type parameters",
                        parameter.search_param
                    ))
                })?;
            search_param.compiled[0].path.clone()
        };

        let sub_field = match parameter.order {
            SortOrder::Asc => format!("{}.start", path),
            SortOrder::Desc => format!("{}.end", path),
        };
        entries.push(sort_entry(&path, parameter.order));
        entries.push(sort_entry(&sub_field, parameter.order));
    }
    Ok(entries)
}

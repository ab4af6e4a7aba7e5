//! Quantity search compilation.

use crate::error::Result;
use crate::query::dsl::QueryFragment;
use crate::query::prefix_range::prefix_range_number;
use crate::registry::CompiledSearchParam;
use crate::values::QuantitySearchValue;

fn keyword(field: String, use_keyword_sub_fields: bool) -> String {
    if use_keyword_sub_fields {
        format!("{}.keyword", field)
    } else {
        field
    }
}

/// Compiles a quantity value against one compiled path.
///
/// The numeric part ranges over `{path}.value`. When a code is given
/// without a system it may match either the coded unit or the
/// human-readable unit field.
pub fn quantity_query(
    compiled: &CompiledSearchParam,
    value: &QuantitySearchValue,
    use_keyword_sub_fields: bool,
) -> Result<QueryFragment> {
    let path = &compiled.path;
    let mut clauses = vec![prefix_range_number(
        value.prefix,
        value.number,
        &value.implicit_range,
        &format!("{}.value", path),
    )];

    match (&value.system, &value.code) {
        (Some(system), Some(code)) => {
            clauses.push(QueryFragment::MultiMatch {
                fields: vec![keyword(format!("{}.code", path), use_keyword_sub_fields)],
                query: code.clone(),
            });
            clauses.push(QueryFragment::MultiMatch {
                fields: vec![keyword(format!("{}.system", path), use_keyword_sub_fields)],
                query: system.clone(),
            });
        }
        (None, Some(code)) => {
            clauses.push(QueryFragment::MultiMatch {
                fields: vec![
                    keyword(format!("{}.code", path), use_keyword_sub_fields),
                    keyword(format!("{}.unit", path), use_keyword_sub_fields),
                ],
                query: code.clone(),
            });
        }
        (Some(system), None) => {
            clauses.push(QueryFragment::MultiMatch {
                fields: vec![keyword(format!("{}.system", path), use_keyword_sub_fields)],
                query: system.clone(),
            });
        }
        (None, None) => {}
    }

    Ok(QueryFragment::all_of(clauses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::quantity::parse_quantity_search_value;
    use serde_json::json;

    fn value_quantity() -> CompiledSearchParam {
        CompiledSearchParam::new("Observation", "valueQuantity")
    }

    #[test]
    fn test_number_system_and_code() {
        let value = parse_quantity_search_value("5.4|http://unitsofmeasure.org|mg").unwrap();
        let fragment = quantity_query(&value_quantity(), &value, true).unwrap();
        assert_eq!(
            fragment.to_json(),
            json!({
                "bool": {
                    "must": [
                        {
                            "range": {
                                "valueQuantity.value": {
                                    "gte": 5.3500000000000005,
                                    "lte": 5.45,
                                }
                            }
                        },
                        {
                            "multi_match": {
                                "fields": ["valueQuantity.code.keyword"],
                                "lenient": true,
                                "query": "mg",
                            }
                        },
                        {
                            "multi_match": {
                                "fields": ["valueQuantity.system.keyword"],
                                "lenient": true,
                                "query": "http://unitsofmeasure.org",
                            }
                        },
                    ]
                }
            })
        );
    }

    #[test]
    fn test_exponential_number() {
        let value = parse_quantity_search_value("5.40e-3|http://unitsofmeasure.org|g").unwrap();
        let fragment = quantity_query(&value_quantity(), &value, true).unwrap();
        assert_eq!(
            fragment.to_json()["bool"]["must"][0],
            json!({
                "range": {
                    "valueQuantity.value": {
                        "gte": 0.0053950000000000005,
                        "lte": 0.005405,
                    }
                }
            })
        );
    }

    #[test]
    fn test_code_without_system_matches_unit_too() {
        let value = parse_quantity_search_value("5.4||mg").unwrap();
        let fragment = quantity_query(&value_quantity(), &value, true).unwrap();
        assert_eq!(
            fragment.to_json()["bool"]["must"][1],
            json!({
                "multi_match": {
                    "fields": ["valueQuantity.code.keyword", "valueQuantity.unit.keyword"],
                    "lenient": true,
                    "query": "mg",
                }
            })
        );
    }

    #[test]
    fn test_number_only_is_unwrapped() {
        let value = parse_quantity_search_value("5.4").unwrap();
        let fragment = quantity_query(&value_quantity(), &value, true).unwrap();
        assert_eq!(
            fragment.to_json(),
            json!({
                "range": {
                    "valueQuantity.value": { "gte": 5.3500000000000005, "lte": 5.45 }
                }
            })
        );
    }

    #[test]
    fn test_le_prefix_uses_exact_number() {
        let value = parse_quantity_search_value("le5.4|http://unitsofmeasure.org|mg").unwrap();
        let fragment = quantity_query(&value_quantity(), &value, false).unwrap();
        assert_eq!(
            fragment.to_json()["bool"]["must"],
            json!([
                { "range": { "valueQuantity.value": { "lte": 5.4 } } },
                {
                    "multi_match": {
                        "fields": ["valueQuantity.code"],
                        "lenient": true,
                        "query": "mg",
                    }
                },
                {
                    "multi_match": {
                        "fields": ["valueQuantity.system"],
                        "lenient": true,
                        "query": "http://unitsofmeasure.org",
                    }
                },
            ])
        );
    }
}

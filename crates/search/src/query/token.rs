//! Token search compilation.
//!
//! Token parameters match against several document shapes at once:
//! Coding, CodeableConcept, Identifier, ContactPoint and bare code or
//! boolean primitives. The compiled query is a lenient `multi_match`
//! over every plausible field.

use crate::error::Result;
use crate::query::dsl::{BoolQuery, QueryFragment};
use crate::registry::CompiledSearchParam;
use crate::values::TokenSearchValue;

fn keyword(field: String, use_keyword_sub_fields: bool) -> String {
    if use_keyword_sub_fields {
        format!("{}.keyword", field)
    } else {
        field
    }
}

/// Compiles a token value against one compiled path.
pub fn token_query(
    compiled: &CompiledSearchParam,
    value: &TokenSearchValue,
    use_keyword_sub_fields: bool,
) -> Result<QueryFragment> {
    let path = &compiled.path;
    let mut clauses = Vec::new();

    if let Some(system) = &value.system {
        clauses.push(QueryFragment::MultiMatch {
            fields: vec![
                keyword(format!("{}.system", path), use_keyword_sub_fields),
                keyword(format!("{}.coding.system", path), use_keyword_sub_fields),
            ],
            query: system.clone(),
        });
    }

    if let Some(code) = &value.code {
        let mut fields = vec![
            keyword(format!("{}.code", path), use_keyword_sub_fields),
            keyword(format!("{}.coding.code", path), use_keyword_sub_fields),
            keyword(format!("{}.value", path), use_keyword_sub_fields),
            keyword(path.clone(), use_keyword_sub_fields),
        ];
        // The analyzed field still matters for boolean and code
        // primitives, so keep it alongside its keyword twin.
        if use_keyword_sub_fields {
            fields.push(path.clone());
        }
        clauses.push(QueryFragment::MultiMatch {
            fields,
            query: code.clone(),
        });
    }

    if value.explicit_no_system {
        clauses.push(QueryFragment::Bool(BoolQuery {
            must_not: Some(Box::new(QueryFragment::Exists {
                field: format!("{}.system", path),
            })),
            ..Default::default()
        }));
    }

    Ok(QueryFragment::all_of(clauses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::token::parse_token_search_value;
    use serde_json::json;

    fn identifier() -> CompiledSearchParam {
        CompiledSearchParam::new("Patient", "identifier")
    }

    #[test]
    fn test_system_and_code() {
        let value = parse_token_search_value("http://acme.org/patient|2345").unwrap();
        let fragment = token_query(&identifier(), &value, true).unwrap();
        assert_eq!(
            fragment.to_json(),
            json!({
                "bool": {
                    "must": [
                        {
                            "multi_match": {
                                "fields": [
                                    "identifier.system.keyword",
                                    "identifier.coding.system.keyword",
                                ],
                                "lenient": true,
                                "query": "http://acme.org/patient",
                            }
                        },
                        {
                            "multi_match": {
                                "fields": [
                                    "identifier.code.keyword",
                                    "identifier.coding.code.keyword",
                                    "identifier.value.keyword",
                                    "identifier.keyword",
                                    "identifier",
                                ],
                                "lenient": true,
                                "query": "2345",
                            }
                        },
                    ]
                }
            })
        );
    }

    #[test]
    fn test_code_only_is_unwrapped() {
        let value = parse_token_search_value("http://acme.org/patient").unwrap();
        let fragment = token_query(&identifier(), &value, true).unwrap();
        assert_eq!(
            fragment.to_json(),
            json!({
                "multi_match": {
                    "fields": [
                        "identifier.code.keyword",
                        "identifier.coding.code.keyword",
                        "identifier.value.keyword",
                        "identifier.keyword",
                        "identifier",
                    ],
                    "lenient": true,
                    "query": "http://acme.org/patient",
                }
            })
        );
    }

    #[test]
    fn test_explicit_no_system() {
        let value = parse_token_search_value("|2345").unwrap();
        let fragment = token_query(&identifier(), &value, true).unwrap();
        assert_eq!(
            fragment.to_json(),
            json!({
                "bool": {
                    "must": [
                        {
                            "multi_match": {
                                "fields": [
                                    "identifier.code.keyword",
                                    "identifier.coding.code.keyword",
                                    "identifier.value.keyword",
                                    "identifier.keyword",
                                    "identifier",
                                ],
                                "lenient": true,
                                "query": "2345",
                            }
                        },
                        { "bool": { "must_not": { "exists": { "field": "identifier.system" } } } },
                    ]
                }
            })
        );
    }

    #[test]
    fn test_without_keyword_sub_fields() {
        let value = parse_token_search_value("http://acme.org/patient|2345").unwrap();
        let fragment = token_query(&identifier(), &value, false).unwrap();
        assert_eq!(
            fragment.to_json(),
            json!({
                "bool": {
                    "must": [
                        {
                            "multi_match": {
                                "fields": ["identifier.system", "identifier.coding.system"],
                                "lenient": true,
                                "query": "http://acme.org/patient",
                            }
                        },
                        {
                            "multi_match": {
                                "fields": [
                                    "identifier.code",
                                    "identifier.coding.code",
                                    "identifier.value",
                                    "identifier",
                                ],
                                "lenient": true,
                                "query": "2345",
                            }
                        },
                    ]
                }
            })
        );
    }

    #[test]
    fn test_boolean_primitive() {
        let value = parse_token_search_value("true").unwrap();
        let fragment = token_query(&identifier(), &value, true).unwrap();
        assert_eq!(fragment.to_json()["multi_match"]["query"], json!("true"));
    }
}

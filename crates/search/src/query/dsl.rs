//! A small closed algebra over the slice of the Elasticsearch query DSL
//! this crate emits. Compilers build [`QueryFragment`] trees and the
//! request layer serializes them with [`QueryFragment::to_json`].

use serde::{Serialize, Serializer};
use serde_json::{Value, json};

/// One node of a compiled query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFragment {
    /// A `bool` compound query.
    Bool(BoolQuery),
    /// A `range` query on one field.
    Range { field: String, bounds: RangeBounds },
    /// A `terms` query matching any of the listed values.
    Terms { field: String, values: Vec<String> },
    /// A `multi_match` query over one or more fields, always lenient.
    MultiMatch { fields: Vec<String>, query: String },
    /// A `wildcard` query on one field.
    Wildcard { field: String, value: String },
    /// An `exists` query on one field.
    Exists { field: String },
}

/// The clauses of a `bool` query. Empty clause lists are omitted from
/// the serialized form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoolQuery {
    pub must: Vec<QueryFragment>,
    pub should: Vec<QueryFragment>,
    pub must_not: Option<Box<QueryFragment>>,
}

/// Bounds of a `range` query. Unset bounds are omitted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RangeBounds {
    pub gt: Option<Value>,
    pub gte: Option<Value>,
    pub lt: Option<Value>,
    pub lte: Option<Value>,
}

impl QueryFragment {
    /// Wraps `fragments` in a `bool.should`, unwrapping a single branch.
    pub fn any_of(mut fragments: Vec<QueryFragment>) -> QueryFragment {
        if fragments.len() == 1 {
            fragments.swap_remove(0)
        } else {
            QueryFragment::Bool(BoolQuery {
                should: fragments,
                ..Default::default()
            })
        }
    }

    /// Wraps `fragments` in a `bool.must`, unwrapping a single branch.
    pub fn all_of(mut fragments: Vec<QueryFragment>) -> QueryFragment {
        if fragments.len() == 1 {
            fragments.swap_remove(0)
        } else {
            QueryFragment::Bool(BoolQuery {
                must: fragments,
                ..Default::default()
            })
        }
    }

    /// Serializes this fragment to its query DSL JSON form.
    pub fn to_json(&self) -> Value {
        match self {
            QueryFragment::Bool(bool_query) => {
                let mut clauses = serde_json::Map::new();
                if !bool_query.must.is_empty() {
                    clauses.insert(
                        "must".to_string(),
                        Value::Array(bool_query.must.iter().map(Self::to_json).collect()),
                    );
                }
                if !bool_query.should.is_empty() {
                    clauses.insert(
                        "should".to_string(),
                        Value::Array(bool_query.should.iter().map(Self::to_json).collect()),
                    );
                }
                if let Some(must_not) = &bool_query.must_not {
                    clauses.insert("must_not".to_string(), must_not.to_json());
                }
                json!({ "bool": Value::Object(clauses) })
            }
            QueryFragment::Range { field, bounds } => {
                let mut limits = serde_json::Map::new();
                if let Some(gt) = &bounds.gt {
                    limits.insert("gt".to_string(), gt.clone());
                }
                if let Some(gte) = &bounds.gte {
                    limits.insert("gte".to_string(), gte.clone());
                }
                if let Some(lt) = &bounds.lt {
                    limits.insert("lt".to_string(), lt.clone());
                }
                if let Some(lte) = &bounds.lte {
                    limits.insert("lte".to_string(), lte.clone());
                }
                json!({ "range": keyed(field, Value::Object(limits)) })
            }
            QueryFragment::Terms { field, values } => {
                json!({ "terms": keyed(field, json!(values)) })
            }
            QueryFragment::MultiMatch { fields, query } => {
                json!({
                    "multi_match": {
                        "fields": fields,
                        "lenient": true,
                        "query": query,
                    }
                })
            }
            QueryFragment::Wildcard { field, value } => {
                json!({ "wildcard": keyed(field, json!({ "value": value })) })
            }
            QueryFragment::Exists { field } => {
                json!({ "exists": { "field": field } })
            }
        }
    }
}

fn keyed(field: &str, value: Value) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(field.to_string(), value);
    Value::Object(map)
}

impl Serialize for QueryFragment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

//! Query DSL compilation: turns a [`ParsedQuery`] into a search-engine
//! query fragment tree.
//!
//! Composition rules: parsed values within one occurrence OR together,
//! compiled paths of one parameter OR together, and distinct
//! occurrences AND together at the top. Single branches are unwrapped
//! at every level, so simple queries stay flat.

pub mod date;
pub mod dsl;
pub mod number;
pub mod prefix_range;
pub mod quantity;
pub mod reference;
pub mod sort;
pub mod string;
pub mod token;
pub mod uri;

use crate::error::Result;
use crate::parser::{ParsedQuery, ParsedSearchParam};
use crate::query::dsl::{BoolQuery, QueryFragment};
use crate::registry::CompiledSearchParam;
use crate::values::SearchValue;

/// Settings shared by every compiled query.
#[derive(Debug, Clone)]
pub struct QueryBuilderOptions {
    /// This service's base URL, used to expand reference candidates.
    pub fhir_service_base_url: String,
    /// Whether indexed string fields carry `.keyword` sub-fields.
    pub use_keyword_sub_fields: bool,
}

fn type_query(
    param: &ParsedSearchParam,
    compiled: &CompiledSearchParam,
    value: &SearchValue,
    options: &QueryBuilderOptions,
) -> Result<QueryFragment> {
    match value {
        SearchValue::String(value) => {
            string::string_query(compiled, value, param.modifier.as_deref())
        }
        SearchValue::Number(value) => number::number_query(compiled, value),
        SearchValue::Date(value) => date::date_query(compiled, value),
        SearchValue::Quantity(value) => {
            quantity::quantity_query(compiled, value, options.use_keyword_sub_fields)
        }
        SearchValue::Token(value) => {
            token::token_query(compiled, value, options.use_keyword_sub_fields)
        }
        SearchValue::Reference(value) => reference::reference_query(
            compiled,
            value,
            options.use_keyword_sub_fields,
            &options.fhir_service_base_url,
            &param.name,
            &param.search_param.target,
        ),
        SearchValue::Uri(value) => {
            uri::uri_query(compiled, value, options.use_keyword_sub_fields)
        }
    }
}

/// Compiles one value against one compiled path, honoring the path's
/// binding condition when it has one.
///
/// A condition `[path, "=", value]` restricts a polymorphic binding to
/// one concrete element type, compiled as an extra exact-match clause.
fn type_query_with_conditions(
    param: &ParsedSearchParam,
    compiled: &CompiledSearchParam,
    value: &SearchValue,
    options: &QueryBuilderOptions,
) -> Result<QueryFragment> {
    let query = type_query(param, compiled, value, options)?;
    let Some(condition) = compiled.condition.as_ref().filter(|c| c.len() == 3) else {
        return Ok(query);
    };
    Ok(QueryFragment::Bool(BoolQuery {
        must: vec![
            query,
            QueryFragment::MultiMatch {
                fields: vec![format!("{}.keyword", condition[0]), condition[0].clone()],
                query: condition[2].clone(),
            },
        ],
        ..Default::default()
    }))
}

/// Compiles one parsed occurrence: every compiled path crossed with
/// every OR value, joined under `bool.should`.
pub fn search_param_query(
    param: &ParsedSearchParam,
    options: &QueryBuilderOptions,
) -> Result<QueryFragment> {
    let mut branches = Vec::new();
    for compiled in &param.search_param.compiled {
        for value in &param.values {
            branches.push(type_query_with_conditions(param, compiled, value, options)?);
        }
    }
    Ok(QueryFragment::any_of(branches))
}

/// Compiles the whole query: one clause per occurrence, AND_ed under
/// `bool.must`.
pub fn build_search_query(
    parsed: &ParsedQuery,
    options: &QueryBuilderOptions,
) -> Result<QueryFragment> {
    let clauses = parsed
        .search_params
        .iter()
        .map(|param| search_param_query(param, options))
        .collect::<Result<Vec<_>>>()?;
    Ok(QueryFragment::Bool(BoolQuery {
        must: clauses,
        ..Default::default()
    }))
}

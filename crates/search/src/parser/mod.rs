//! Query parser: classifies and parses raw HTTP-style query parameters
//! for one resource type into a structured query.
//!
//! Each raw parameter lands in exactly one bucket: recognized search
//! parameters are value-parsed per their declared type; chained
//! parameters (a `.` in the name) are carried as opaque raw strings;
//! `_include`/`_revinclude` become structured inclusion specs; everything
//! the registry does not know passes through verbatim (`_count`, `_sort`,
//! and friends belong to other subsystems).
//!
//! Comma-separated values inside one occurrence are an OR group; repeated
//! occurrences of the same parameter are AND_ed as separate
//! [`ParsedSearchParam`] entries. Parsing is fail-fast: the first invalid
//! parameter aborts the whole query.

pub mod date;
pub mod number;
pub mod quantity;
pub mod reference;
pub mod token;
pub mod util;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::{InvalidSearchParameter, Result};
use crate::registry::{SearchParamType, SearchParameterDefinition, SearchParameterRegistry};
use crate::values::SearchValue;

use self::date::parse_date_search_value;
use self::number::parse_number_search_value;
use self::quantity::parse_quantity_search_value;
use self::reference::parse_reference_search_value;
use self::token::parse_token_search_value;
use self::util::{parse_search_modifiers, split_escaped_commas};

/// One parsed occurrence of a search parameter.
///
/// `values` holds the OR group from a single raw occurrence; AND
/// combination across repeated occurrences is modeled as multiple entries
/// sharing `name` in [`ParsedQuery::search_params`].
#[derive(Debug, Clone, Serialize)]
pub struct ParsedSearchParam {
    /// The parameter name as queried.
    pub name: String,

    /// Modifier from the `name:modifier` key form, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,

    /// The parameter's declared data type.
    pub param_type: SearchParamType,

    /// The registry definition this parameter resolved to.
    pub search_param: Arc<SearchParameterDefinition>,

    /// The OR group of parsed values. Never empty.
    pub values: Vec<SearchValue>,
}

/// Kind of inclusion parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InclusionKind {
    /// `_include`: pull in resources the matches point at.
    Include,
    /// `_revinclude`: pull in resources pointing at the matches.
    RevInclude,
}

/// A structured `_include`/`_revinclude` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionSearchParam {
    /// Forward or reverse inclusion.
    pub kind: InclusionKind,

    /// Resource type the reference parameter is defined on.
    pub source_resource_type: String,

    /// The reference search parameter to follow.
    pub search_parameter_name: String,

    /// The compiled document path of that parameter.
    pub path: String,

    /// Restricts the inclusion to one target type, when given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_resource_type: Option<String>,

    /// True when this spec came from a `*` wildcard expansion.
    pub is_wildcard: bool,

    /// True for the `:iterate` modifier.
    pub iterate: bool,
}

/// A fully classified and parsed query for one resource type.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedQuery {
    /// The resource type being searched.
    pub resource_type: String,

    /// Recognized, value-parsed search parameters (AND semantics).
    pub search_params: Vec<ParsedSearchParam>,

    /// Chained parameters, carried verbatim (resolution is external).
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub chained_search_params: HashMap<String, Vec<String>>,

    /// Structured `_include`/`_revinclude` requests.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inclusion_search_params: Vec<InclusionSearchParam>,

    /// Parameters the registry does not know, passed through verbatim.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub other_params: HashMap<String, Vec<String>>,
}

/// Parses raw query parameters into a [`ParsedQuery`].
///
/// `params` preserves the incoming order; each entry is one parameter key
/// with its repeated occurrences (AND). Fails with
/// [`InvalidSearchParameter`] on the first malformed value or unsupported
/// modifier.
pub fn parse_query(
    registry: &dyn SearchParameterRegistry,
    resource_type: &str,
    params: &[(String, Vec<String>)],
) -> Result<ParsedQuery> {
    let mut search_params = Vec::new();
    let mut chained_search_params: HashMap<String, Vec<String>> = HashMap::new();
    let mut inclusion_search_params = Vec::new();
    let mut other_params: HashMap<String, Vec<String>> = HashMap::new();

    for (key, occurrences) in params {
        let modifiers = parse_search_modifiers(key);
        let name = modifiers.parameter_name;
        let modifier = modifiers.modifier;

        if name == "_include" || name == "_revinclude" {
            let kind = if name == "_include" {
                InclusionKind::Include
            } else {
                InclusionKind::RevInclude
            };
            for occurrence in occurrences {
                inclusion_search_params.extend(parse_inclusion_param(
                    registry,
                    resource_type,
                    kind,
                    modifier,
                    occurrence,
                )?);
            }
            continue;
        }

        if name.contains('.') {
            chained_search_params
                .entry(name.to_string())
                .or_default()
                .extend(occurrences.iter().cloned());
            continue;
        }

        let Some(search_param) = registry.get_search_parameter(resource_type, name) else {
            other_params
                .entry(name.to_string())
                .or_default()
                .extend(occurrences.iter().cloned());
            continue;
        };

        if let Some(modifier) = modifier {
            if !search_param.param_type.supports_modifier(modifier) {
                return Err(InvalidSearchParameter::new(format!(
                    "Unsupported {} search modifier: {}",
                    search_param.param_type, modifier
                )));
            }
        }

        for occurrence in occurrences {
            let values = parse_search_values(&search_param, occurrence)?;
            search_params.push(ParsedSearchParam {
                name: name.to_string(),
                modifier: modifier.map(str::to_string),
                param_type: search_param.param_type,
                search_param: Arc::clone(&search_param),
                values,
            });
        }
    }

    Ok(ParsedQuery {
        resource_type: resource_type.to_string(),
        search_params,
        chained_search_params,
        inclusion_search_params,
        other_params,
    })
}

/// Parses a criteria-style query string, e.g. `Patient?name=John&active=true`.
///
/// This is the entry point for stored queries such as subscription
/// criteria, where the whole query survives as a single string.
pub fn parse_query_string(
    registry: &dyn SearchParameterRegistry,
    query: &str,
) -> Result<ParsedQuery> {
    let (resource_type, query_string) = match query.split_once('?') {
        Some((resource_type, query_string)) => (resource_type, query_string),
        None => (query, ""),
    };

    let mut params: Vec<(String, Vec<String>)> = Vec::new();
    for pair in query_string.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key)?;
        let value = decode_component(value)?;
        match params.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => params.push((key, vec![value])),
        }
    }

    parse_query(registry, resource_type, &params)
}

fn decode_component(raw: &str) -> Result<String> {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| InvalidSearchParameter::new(format!("Invalid query string component: {}", raw)))
}

static INCLUSION_VALUE_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^(?P<source>[A-Za-z]+):(?P<param>[A-Za-z0-9\-]+)(?::(?P<target>[A-Za-z]+))?$")
        .expect("inclusion value regex is valid")
});

fn parse_inclusion_param(
    registry: &dyn SearchParameterRegistry,
    resource_type: &str,
    kind: InclusionKind,
    modifier: Option<&str>,
    value: &str,
) -> Result<Vec<InclusionSearchParam>> {
    let iterate = match modifier {
        None => false,
        Some("iterate") => true,
        Some(other) => {
            return Err(InvalidSearchParameter::new(format!(
                "Unsupported inclusion modifier: {}",
                other
            )));
        }
    };

    if value == "*" {
        let reference_params = match kind {
            InclusionKind::Include => registry.reference_parameters(resource_type),
            InclusionKind::RevInclude => registry.reference_parameters_targeting(resource_type),
        };
        return Ok(reference_params
            .into_iter()
            .map(|param| InclusionSearchParam {
                kind,
                source_resource_type: param.base.clone(),
                search_parameter_name: param.name.clone(),
                path: param.compiled[0].path.clone(),
                target_resource_type: None,
                is_wildcard: true,
                iterate,
            })
            .collect());
    }

    let captures = INCLUSION_VALUE_REGEX.captures(value).ok_or_else(|| {
        InvalidSearchParameter::new(format!("Invalid include/revinclude search parameter: {}", value))
    })?;
    let source = &captures["source"];
    let param_name = &captures["param"];
    let target = captures.name("target").map(|m| m.as_str().to_string());

    let search_param = registry
        .get_search_parameter(source, param_name)
        .filter(|p| p.param_type == SearchParamType::Reference)
        .ok_or_else(|| {
            InvalidSearchParameter::new(format!(
                "Invalid include/revinclude search parameter: {}",
                value
            ))
        })?;

    if let Some(target) = &target {
        if !search_param.target.is_empty() && !search_param.target.iter().any(|t| t == target) {
            return Err(InvalidSearchParameter::new(format!(
                "Invalid include/revinclude target resource type: {}",
                target
            )));
        }
    }

    Ok(vec![InclusionSearchParam {
        kind,
        source_resource_type: source.to_string(),
        search_parameter_name: param_name.to_string(),
        path: search_param.compiled[0].path.clone(),
        target_resource_type: target,
        is_wildcard: false,
        iterate,
    }])
}

fn parse_search_values(
    search_param: &SearchParameterDefinition,
    raw: &str,
) -> Result<Vec<SearchValue>> {
    let values = match search_param.param_type {
        // URI values are never comma-split; a URI may contain commas.
        SearchParamType::Uri => vec![SearchValue::Uri(raw.to_string())],
        SearchParamType::String => split_escaped_commas(raw)
            .into_iter()
            .map(SearchValue::String)
            .collect(),
        SearchParamType::Number => split_escaped_commas(raw)
            .iter()
            .map(|branch| parse_number_search_value(branch).map(SearchValue::Number))
            .collect::<Result<_>>()?,
        SearchParamType::Date => split_escaped_commas(raw)
            .iter()
            .map(|branch| parse_date_search_value(branch).map(SearchValue::Date))
            .collect::<Result<_>>()?,
        SearchParamType::Quantity => split_escaped_commas(raw)
            .iter()
            .map(|branch| parse_quantity_search_value(branch).map(SearchValue::Quantity))
            .collect::<Result<_>>()?,
        SearchParamType::Token => split_escaped_commas(raw)
            .iter()
            .map(|branch| parse_token_search_value(branch).map(SearchValue::Token))
            .collect::<Result<_>>()?,
        SearchParamType::Reference => split_escaped_commas(raw)
            .iter()
            .map(|branch| SearchValue::Reference(parse_reference_search_value(branch)))
            .map(Ok)
            .collect::<Result<_>>()?,
        SearchParamType::Composite | SearchParamType::Special => {
            return Err(InvalidSearchParameter::new(format!(
                "Unsupported search parameter type: {}",
                search_param.param_type
            )));
        }
    };
    Ok(values)
}

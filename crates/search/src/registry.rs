//! Search parameter definitions and the registry capability.
//!
//! The registry is a read-only lookup table generated ahead of time from a
//! FHIR conformance bundle: for each (resource type, parameter name) pair it
//! knows the parameter's data type, the concrete document field paths the
//! parameter binds to, and, for reference parameters, the allowed target
//! types. The core consumes it through the [`SearchParameterRegistry`] trait
//! so that parsing and compilation stay free of process-wide state and are
//! trivially testable with fixture registries.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// FHIR search parameter types.
///
/// See: https://build.fhir.org/search.html#ptypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchParamType {
    /// A simple string, like a name or description.
    String,
    /// A search against a URI.
    Uri,
    /// A search for a number.
    Number,
    /// A search for a date, dateTime, or period.
    Date,
    /// A quantity, with a number and units.
    Quantity,
    /// A code from a code system or value set.
    Token,
    /// A reference to another resource.
    Reference,
    /// A composite search parameter that combines others.
    Composite,
    /// Special search parameters (_id, _lastUpdated, etc.).
    Special,
}

impl fmt::Display for SearchParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchParamType::String => write!(f, "string"),
            SearchParamType::Uri => write!(f, "uri"),
            SearchParamType::Number => write!(f, "number"),
            SearchParamType::Date => write!(f, "date"),
            SearchParamType::Quantity => write!(f, "quantity"),
            SearchParamType::Token => write!(f, "token"),
            SearchParamType::Reference => write!(f, "reference"),
            SearchParamType::Composite => write!(f, "composite"),
            SearchParamType::Special => write!(f, "special"),
        }
    }
}

impl FromStr for SearchParamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" => Ok(SearchParamType::String),
            "uri" => Ok(SearchParamType::Uri),
            "number" => Ok(SearchParamType::Number),
            "date" => Ok(SearchParamType::Date),
            "quantity" => Ok(SearchParamType::Quantity),
            "token" => Ok(SearchParamType::Token),
            "reference" => Ok(SearchParamType::Reference),
            "composite" => Ok(SearchParamType::Composite),
            "special" => Ok(SearchParamType::Special),
            _ => Err(format!("unknown search parameter type: {}", s)),
        }
    }
}

impl SearchParamType {
    /// Returns the modifiers this type accepts in queries.
    ///
    /// Currently only string parameters support modifiers (`exact` and
    /// `contains`); every other type rejects any modifier.
    pub fn supported_modifiers(&self) -> &'static [&'static str] {
        match self {
            SearchParamType::String => &["exact", "contains"],
            _ => &[],
        }
    }

    /// Returns true if the given modifier is accepted for this type.
    pub fn supports_modifier(&self, modifier: &str) -> bool {
        self.supported_modifiers().contains(&modifier)
    }
}

/// One concrete document field a search parameter binds to.
///
/// A single parameter may compile to several entries, one per FHIR element
/// it can match (e.g. `Observation.value-quantity` binds to all the
/// `value[x]` fields). `condition` optionally restricts an entry to
/// documents where another field holds a given value, as a
/// `[path, operator, value]` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledSearchParam {
    /// The resource type this entry was compiled for.
    pub resource_type: String,

    /// Dotted document field path (FHIR JSON naming, e.g. `birthDate`).
    pub path: String,

    /// Optional `[path, operator, value]` guard.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Vec<String>>,
}

impl CompiledSearchParam {
    /// Creates a compiled entry without a condition.
    pub fn new(resource_type: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            path: path.into(),
            condition: None,
        }
    }

    /// Attaches a `[path, operator, value]` condition.
    pub fn with_condition<I, S>(mut self, condition: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.condition = Some(condition.into_iter().map(Into::into).collect());
        self
    }
}

/// Complete definition of a search parameter for one base resource type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParameterDefinition {
    /// Canonical URL of the defining SearchParameter resource.
    pub url: String,

    /// Parameter name as it appears in queries (e.g. "name", "birthdate").
    pub name: String,

    /// The resource type this definition applies to.
    pub base: String,

    /// The parameter type.
    pub param_type: SearchParamType,

    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Allowed target resource types (reference parameters only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target: Vec<String>,

    /// The document field paths this parameter binds to.
    pub compiled: Vec<CompiledSearchParam>,
}

impl SearchParameterDefinition {
    /// Creates a definition binding a single field path.
    pub fn new(
        url: impl Into<String>,
        name: impl Into<String>,
        base: impl Into<String>,
        param_type: SearchParamType,
        path: impl Into<String>,
    ) -> Self {
        let base = base.into();
        let compiled = vec![CompiledSearchParam::new(base.clone(), path)];
        Self {
            url: url.into(),
            name: name.into(),
            base,
            param_type,
            description: None,
            target: Vec::new(),
            compiled,
        }
    }

    /// Replaces the compiled entries.
    pub fn with_compiled<I>(mut self, compiled: I) -> Self
    where
        I: IntoIterator<Item = CompiledSearchParam>,
    {
        self.compiled = compiled.into_iter().collect();
        self
    }

    /// Sets the allowed target types (reference parameters).
    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Read-only lookup capability over the pre-generated parameter table.
///
/// Lookups return `None` for unknown names, never an error. An unknown
/// parameter is not invalid input: the query parser passes it through to
/// other subsystems (see `parser::ParsedQuery::other_params`).
pub trait SearchParameterRegistry {
    /// Looks up a parameter by resource type and query parameter name.
    fn get_search_parameter(
        &self,
        resource_type: &str,
        name: &str,
    ) -> Option<Arc<SearchParameterDefinition>>;

    /// All reference-typed parameters of the given resource type.
    ///
    /// Used to expand `_include=*`.
    fn reference_parameters(&self, resource_type: &str) -> Vec<Arc<SearchParameterDefinition>>;

    /// All reference-typed parameters (of any resource type) that declare
    /// the given type among their targets.
    ///
    /// Used to expand `_revinclude=*`.
    fn reference_parameters_targeting(
        &self,
        target_type: &str,
    ) -> Vec<Arc<SearchParameterDefinition>>;
}

/// In-memory registry backed by nested hash maps.
///
/// Indexed by (resource_type, parameter name). Callers populate it from the
/// pre-generated conformance table; tests populate it with fixtures.
#[derive(Default)]
pub struct StaticSearchParameterRegistry {
    params_by_type: HashMap<String, HashMap<String, Arc<SearchParameterDefinition>>>,
}

impl StaticSearchParameterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition under its base resource type.
    ///
    /// Re-registering the same (type, name) pair replaces the earlier entry.
    pub fn register(&mut self, param: SearchParameterDefinition) {
        let param = Arc::new(param);
        self.params_by_type
            .entry(param.base.clone())
            .or_default()
            .insert(param.name.clone(), param);
    }

    /// Returns the number of registered parameters.
    pub fn len(&self) -> usize {
        self.params_by_type.values().map(HashMap::len).sum()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.params_by_type.is_empty()
    }
}

impl SearchParameterRegistry for StaticSearchParameterRegistry {
    fn get_search_parameter(
        &self,
        resource_type: &str,
        name: &str,
    ) -> Option<Arc<SearchParameterDefinition>> {
        self.params_by_type
            .get(resource_type)
            .and_then(|params| params.get(name))
            .cloned()
    }

    fn reference_parameters(&self, resource_type: &str) -> Vec<Arc<SearchParameterDefinition>> {
        let mut params: Vec<_> = self
            .params_by_type
            .get(resource_type)
            .map(|params| {
                params
                    .values()
                    .filter(|p| p.param_type == SearchParamType::Reference)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        params.sort_by(|a, b| a.name.cmp(&b.name));
        params
    }

    fn reference_parameters_targeting(
        &self,
        target_type: &str,
    ) -> Vec<Arc<SearchParameterDefinition>> {
        let mut params: Vec<_> = self
            .params_by_type
            .values()
            .flat_map(HashMap::values)
            .filter(|p| {
                p.param_type == SearchParamType::Reference
                    && p.target.iter().any(|t| t == target_type)
            })
            .cloned()
            .collect();
        params.sort_by(|a, b| (&a.base, &a.name).cmp(&(&b.base, &b.name)));
        params
    }
}

impl fmt::Debug for StaticSearchParameterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticSearchParameterRegistry")
            .field("params_count", &self.len())
            .field(
                "resource_types",
                &self.params_by_type.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

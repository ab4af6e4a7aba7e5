//! FHIR search parameter parsing and query compilation.
//!
//! This crate turns raw FHIR search requests into three artifacts:
//!
//! - a structured [`parser::ParsedQuery`], classifying every incoming
//!   query parameter and parsing typed search values (prefixes,
//!   modifiers, OR/AND composition, implicit precision ranges);
//! - a search-engine query fragment tree ([`query::build_search_query`])
//!   and sort clause ([`query::sort::build_sort_clause`]) in the
//!   Elasticsearch/OpenSearch query DSL;
//! - an in-memory verdict ([`matcher::match_parsed_query`]) applying a
//!   parsed query directly to a resource document, for subscription-style
//!   matching without the search engine.
//!
//! Search parameter definitions come from an injected
//! [`registry::SearchParameterRegistry`]; all operations are pure and
//! synchronous, and malformed client input surfaces as
//! [`error::InvalidSearchParameter`].

pub mod error;
pub mod matcher;
pub mod parser;
pub mod query;
pub mod ranges;
pub mod registry;
pub mod values;

pub use error::{InvalidSearchParameter, Result};
pub use matcher::{MatchOptions, match_parsed_query};
pub use parser::{ParsedQuery, ParsedSearchParam, parse_query, parse_query_string};
pub use query::{QueryBuilderOptions, build_search_query};
pub use registry::{
    SearchParamType, SearchParameterDefinition, SearchParameterRegistry,
    StaticSearchParameterRegistry,
};
pub use values::SearchValue;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::registry::{
        CompiledSearchParam, SearchParamType, SearchParameterDefinition,
        StaticSearchParameterRegistry,
    };

    /// A small registry covering every parameter type, loosely modeled
    /// on the R4 definitions the tests exercise.
    pub fn fixture_registry() -> StaticSearchParameterRegistry {
        let mut registry = StaticSearchParameterRegistry::new();

        registry.register(SearchParameterDefinition::new(
            "http://hl7.org/fhir/SearchParameter/Patient-name",
            "name",
            "Patient",
            SearchParamType::String,
            "name",
        ));
        registry.register(SearchParameterDefinition::new(
            "http://hl7.org/fhir/SearchParameter/individual-address",
            "address",
            "Patient",
            SearchParamType::String,
            "address",
        ));
        registry.register(SearchParameterDefinition::new(
            "http://hl7.org/fhir/SearchParameter/individual-birthdate",
            "birthdate",
            "Patient",
            SearchParamType::Date,
            "birthDate",
        ));
        registry.register(SearchParameterDefinition::new(
            "http://hl7.org/fhir/SearchParameter/Patient-identifier",
            "identifier",
            "Patient",
            SearchParamType::Token,
            "identifier",
        ));
        registry.register(
            SearchParameterDefinition::new(
                "http://hl7.org/fhir/SearchParameter/Patient-organization",
                "organization",
                "Patient",
                SearchParamType::Reference,
                "managingOrganization",
            )
            .with_targets(["Organization"]),
        );

        registry.register(SearchParameterDefinition::new(
            "http://hl7.org/fhir/SearchParameter/ChargeItem-factor-override",
            "factor-override",
            "ChargeItem",
            SearchParamType::Number,
            "factorOverride",
        ));

        registry.register(
            SearchParameterDefinition::new(
                "http://hl7.org/fhir/SearchParameter/Observation-value-quantity",
                "value-quantity",
                "Observation",
                SearchParamType::Quantity,
                "valueQuantity",
            )
            .with_compiled([
                CompiledSearchParam::new("Observation", "valueQuantity")
                    .with_condition(["value", "=", "Quantity"]),
            ]),
        );

        registry.register(
            SearchParameterDefinition::new(
                "http://hl7.org/fhir/SearchParameter/medications-patient",
                "patient",
                "MedicationRequest",
                SearchParamType::Reference,
                "subject",
            )
            .with_targets(["Patient"]),
        );
        registry.register(
            SearchParameterDefinition::new(
                "http://hl7.org/fhir/SearchParameter/MedicationRequest-requester",
                "requester",
                "MedicationRequest",
                SearchParamType::Reference,
                "requester",
            )
            .with_targets(["Practitioner", "Organization"]),
        );
        registry.register(
            SearchParameterDefinition::new(
                "http://hl7.org/fhir/SearchParameter/Provenance-target",
                "target",
                "Provenance",
                SearchParamType::Reference,
                "target",
            )
            .with_targets(["MedicationRequest", "Patient"]),
        );

        registry.register(SearchParameterDefinition::new(
            "http://hl7.org/fhir/SearchParameter/StructureDefinition-url",
            "url",
            "StructureDefinition",
            SearchParamType::Uri,
            "url",
        ));

        registry
    }
}

//! String search compilation.

use crate::error::Result;
use crate::query::dsl::QueryFragment;
use crate::registry::CompiledSearchParam;

/// Sub-fields searched by `:contains` for paths that hold complex types.
/// The bare path itself is always searched too.
fn complex_type_sub_fields(path: &str) -> &'static [&'static str] {
    match path.rsplit('.').next().unwrap_or(path) {
        // HumanName
        "name" => &["family", "given", "text", "prefix", "suffix"],
        // Address
        "address" => &["city", "country", "district", "line", "postalCode", "state", "text"],
        _ => &[],
    }
}

fn escape_query(value: &str) -> String {
    value.replace('/', "\\/")
}

/// Compiles a string value against one compiled path.
///
/// The default search is a lenient `multi_match` over the path and its
/// sub-fields. `:exact` switches to the keyword fields and `:contains`
/// becomes a case-insensitive substring wildcard.
pub fn string_query(
    compiled: &CompiledSearchParam,
    value: &str,
    modifier: Option<&str>,
) -> Result<QueryFragment> {
    let path = &compiled.path;
    let fragment = match modifier {
        Some("exact") => QueryFragment::MultiMatch {
            fields: vec![format!("{}.keyword", path), format!("{}.*.keyword", path)],
            query: escape_query(value),
        },
        Some("contains") => {
            let needle = format!("*{}*", value.to_lowercase());
            let wildcard = |field: String| QueryFragment::Wildcard {
                field,
                value: needle.clone(),
            };
            let mut branches = vec![wildcard(path.clone())];
            branches.extend(
                complex_type_sub_fields(path)
                    .iter()
                    .map(|sub| wildcard(format!("{}.{}", path, sub))),
            );
            QueryFragment::any_of(branches)
        }
        _ => QueryFragment::MultiMatch {
            fields: vec![path.clone(), format!("{}.*", path)],
            query: escape_query(value),
        },
    };
    Ok(fragment)
}

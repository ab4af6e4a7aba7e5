//! URI search compilation.

use crate::error::Result;
use crate::query::dsl::QueryFragment;
use crate::registry::CompiledSearchParam;

/// Compiles a URI value against one compiled path.
pub fn uri_query(
    compiled: &CompiledSearchParam,
    value: &str,
    use_keyword_sub_fields: bool,
) -> Result<QueryFragment> {
    let keyword_suffix = if use_keyword_sub_fields { ".keyword" } else { "" };
    Ok(QueryFragment::MultiMatch {
        fields: vec![format!("{}{}", compiled.path, keyword_suffix)],
        query: value.to_string(),
    })
}

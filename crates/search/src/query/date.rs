//! Date search compilation.

use crate::error::Result;
use crate::query::dsl::QueryFragment;
use crate::query::prefix_range::prefix_range_date;
use crate::registry::CompiledSearchParam;
use crate::values::DateSearchValue;

/// Compiles a date value against one compiled path.
pub fn date_query(compiled: &CompiledSearchParam, value: &DateSearchValue) -> Result<QueryFragment> {
    Ok(prefix_range_date(value.prefix, &value.range, &compiled.path))
}

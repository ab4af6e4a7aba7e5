//! Number search compilation.

use crate::error::Result;
use crate::query::dsl::QueryFragment;
use crate::query::prefix_range::prefix_range_number;
use crate::registry::CompiledSearchParam;
use crate::values::NumberSearchValue;

/// Compiles a number value against one compiled path.
pub fn number_query(compiled: &CompiledSearchParam, value: &NumberSearchValue) -> Result<QueryFragment> {
    Ok(prefix_range_number(
        value.prefix,
        value.number,
        &value.implicit_range,
        &compiled.path,
    ))
}

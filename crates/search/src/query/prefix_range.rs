//! Shared range compilation for prefixed number, date and quantity
//! values.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::query::dsl::{BoolQuery, QueryFragment, RangeBounds};
use crate::ranges::{DateRange, NumberRange};
use crate::values::Prefix;

/// Compiles a prefix against a `[start, end]` interval into a range
/// query on `path`.
///
/// `eq` matches inside the interval and `ne` outside it. The remaining
/// prefixes compare against one endpoint only, so callers that want
/// exact comparison semantics pass a degenerate interval.
pub fn prefix_range(prefix: Prefix, start: Value, end: Value, path: &str) -> QueryFragment {
    let range = |bounds: RangeBounds| QueryFragment::Range {
        field: path.to_string(),
        bounds,
    };
    match prefix {
        Prefix::Eq => range(RangeBounds {
            gte: Some(start),
            lte: Some(end),
            ..Default::default()
        }),
        Prefix::Ne => QueryFragment::Bool(BoolQuery {
            should: vec![
                range(RangeBounds {
                    gt: Some(end),
                    ..Default::default()
                }),
                range(RangeBounds {
                    lt: Some(start),
                    ..Default::default()
                }),
            ],
            ..Default::default()
        }),
        Prefix::Gt => range(RangeBounds {
            gt: Some(start),
            ..Default::default()
        }),
        Prefix::Ge => range(RangeBounds {
            gte: Some(start),
            ..Default::default()
        }),
        Prefix::Lt => range(RangeBounds {
            lt: Some(end),
            ..Default::default()
        }),
        Prefix::Le => range(RangeBounds {
            lte: Some(end),
            ..Default::default()
        }),
        Prefix::Sa => range(RangeBounds {
            gt: Some(end),
            ..Default::default()
        }),
        Prefix::Eb => range(RangeBounds {
            lt: Some(start),
            ..Default::default()
        }),
    }
}

/// Compiles a prefixed number against `path`.
///
/// `eq` and `ne` use the literal's implicit precision interval; every
/// other prefix compares against the exact number.
pub fn prefix_range_number(
    prefix: Prefix,
    number: f64,
    implicit_range: &NumberRange,
    path: &str,
) -> QueryFragment {
    match prefix {
        Prefix::Eq | Prefix::Ne => prefix_range(
            prefix,
            json!(implicit_range.start),
            json!(implicit_range.end),
            path,
        ),
        _ => prefix_range(prefix, json!(number), json!(number), path),
    }
}

/// Formats an instant the way date fields are stored in the index.
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Compiles a prefixed date against `path`.
///
/// The document field may hold either a scalar dateTime or a Period
/// object with `start` and `end` sub-fields, so the compiled query is a
/// `should` over a scalar range and a Period branch. The Period branch
/// requires both endpoints to exist.
pub fn prefix_range_date(prefix: Prefix, range: &DateRange, path: &str) -> QueryFragment {
    let start = json!(format_date(range.start));
    let end = json!(format_date(range.end));
    let start_field = format!("{}.start", path);
    let end_field = format!("{}.end", path);

    let scalar = prefix_range(prefix, start.clone(), end.clone(), path);

    let period = match prefix {
        Prefix::Eq => period_within(&start_field, &end_field, start, end),
        Prefix::Ne => QueryFragment::Bool(BoolQuery {
            must_not: Some(Box::new(period_within(&start_field, &end_field, start, end))),
            ..Default::default()
        }),
        // A Period overlaps the searched interval when its end is not
        // before the interval, or its start is not after it.
        Prefix::Gt | Prefix::Ge => QueryFragment::Range {
            field: end_field.clone(),
            bounds: RangeBounds {
                gte: Some(start),
                ..Default::default()
            },
        },
        Prefix::Lt | Prefix::Le => QueryFragment::Range {
            field: start_field.clone(),
            bounds: RangeBounds {
                lte: Some(end),
                ..Default::default()
            },
        },
        Prefix::Sa => QueryFragment::Range {
            field: start_field.clone(),
            bounds: RangeBounds {
                gt: Some(end),
                ..Default::default()
            },
        },
        Prefix::Eb => QueryFragment::Range {
            field: end_field.clone(),
            bounds: RangeBounds {
                lt: Some(start),
                ..Default::default()
            },
        },
    };

    QueryFragment::Bool(BoolQuery {
        should: vec![
            scalar,
            QueryFragment::Bool(BoolQuery {
                must: vec![
                    QueryFragment::Exists { field: start_field },
                    QueryFragment::Exists { field: end_field },
                    period,
                ],
                ..Default::default()
            }),
        ],
        ..Default::default()
    })
}

fn period_within(start_field: &str, end_field: &str, start: Value, end: Value) -> QueryFragment {
    QueryFragment::Bool(BoolQuery {
        must: vec![
            QueryFragment::Range {
                field: start_field.to_string(),
                bounds: RangeBounds {
                    gte: Some(start),
                    ..Default::default()
                },
            },
            QueryFragment::Range {
                field: end_field.to_string(),
                bounds: RangeBounds {
                    lte: Some(end),
                    ..Default::default()
                },
            },
        ],
        ..Default::default()
    })
}

//! Row Model and Empty/Null Normalizer
//!
//! Every backend hands back rows as JSON objects keyed by column name. The
//! orchestrator never looks at column names; it only asks whether a result
//! set counts as "data found".

use serde_json::{Map, Value};

/// A single result row: column name to JSON value.
pub type Row = Map<String, Value>;

/// A result set as returned by a backend executor.
pub type Rows = Vec<Row>;

/// Decide whether a result set counts as empty.
///
/// A result is empty when it is absent, when it has no rows, or when every
/// row is either falsy (an empty mapping) or a mapping whose every value is
/// `null`. A single non-null value anywhere makes the result non-empty.
///
/// This is the only gate that triggers the fallback hop, so it must not be
/// reduced to a length check.
pub fn is_empty_result(rows: Option<&[Row]>) -> bool {
    match rows {
        None => true,
        Some(rows) => rows.iter().all(row_is_empty),
    }
}

fn row_is_empty(row: &Row) -> bool {
    row.is_empty() || row.values().all(Value::is_null)
}

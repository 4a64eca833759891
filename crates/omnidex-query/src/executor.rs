//! Query execution with the one-shot escape remedy.

use serde_json::Value;
use tracing::debug;

use omnidex_core::error::{Error, Result};
use omnidex_core::traits::IndexDatabase;
use omnidex_core::types::{IndexRecord, Row};

use crate::builder::BuiltQuery;

/// Run a built query. An invalid full-text expression is escaped and
/// re-executed exactly once; a second failure, or any other error,
/// propagates unmodified.
pub fn execute(db: &dyn IndexDatabase, query: &BuiltQuery) -> Result<Vec<Row>> {
    let params = query.param_refs();
    match db.execute(&query.sql, &params) {
        Ok(rows) => Ok(rows),
        Err(Error::FtsSyntax(reason)) => {
            debug!("escaping full-text query after syntax error: {}", reason);
            let escaped = query.escaped();
            let params = escaped.param_refs();
            db.execute(&escaped.sql, &params)
        }
        Err(e) => Err(e),
    }
}

/// Execute and decode the rows into typed records, preserving query order.
pub fn search(db: &dyn IndexDatabase, query: &BuiltQuery) -> Result<Vec<IndexRecord>> {
    let rows = execute(db, query)?;
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(Value::Object(row))
                .map_err(|e| Error::Query(format!("row decode: {}", e)))
        })
        .collect()
}

//! omnidex-sqlite
//!
//! SQLite-backed implementations of the index engine boundaries: the
//! query-execution primitive, the database registry, and the generic
//! tabular listing capability used for counts and facets.

pub mod database;
pub mod listing;

pub use database::{SqliteCatalog, SqliteDatabase};
pub use listing::TableListing;

pub mod builder;
pub mod escape;
pub mod executor;

pub use builder::{build, BuiltQuery, QueryShape, SEARCH_LIMIT, TIMELINE_LIMIT};
pub use escape::escape_fts;

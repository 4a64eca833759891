use crate::error::Result;
use crate::types::{FacetResult, FilterSet, Row};

/// Parameterized query execution against one index database.
///
/// Implementations must surface an invalid full-text expression as
/// [`crate::error::Error::FtsSyntax`] so callers can apply their one-shot
/// remedy; every other failure maps to `Error::Query`.
pub trait IndexDatabase: Send + Sync {
    fn execute(&self, sql: &str, params: &[(&str, &str)]) -> Result<Vec<Row>>;
}

/// Lookup of attached databases by source name.
pub trait DatabaseRegistry: Send + Sync {
    /// `Error::NotFound` when no database goes by `name`.
    fn database(&self, name: &str) -> Result<&dyn IndexDatabase>;
}

/// Parameters for the generic tabular listing capability: count and facet
/// the index under the given filters and search text, returning no rows of
/// the underlying data when `size` is zero.
#[derive(Debug, Clone)]
pub struct ListingRequest {
    pub filters: FilterSet,
    pub search: Option<String>,
    /// Strict pass-through of the search expression. When off, the
    /// provider interprets the text permissively.
    pub searchmode_raw: bool,
    pub facet_columns: Vec<String>,
    pub size: usize,
}

/// Count plus per-dimension histograms with pre-built toggle links.
#[derive(Debug, Clone)]
pub struct ListingResult {
    pub count: i64,
    pub facets: Vec<FacetResult>,
}

/// The generic faceting collaborator. Same `FtsSyntax` distinction as
/// [`IndexDatabase`].
pub trait FacetProvider: Send + Sync {
    fn list(&self, request: &ListingRequest) -> Result<ListingResult>;
}

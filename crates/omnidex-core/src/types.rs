//! Domain types shared by the query, facet, and render engines.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Columns of the search index recognized as equality filters. Filter
/// names outside this list are dropped on the floor, never errored.
pub const FILTER_COLS: [&str; 3] = ["type", "category", "is_public"];

/// One row as returned by the index engine, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// One indexed entity.
///
/// - `rowid`: engine-assigned identity, the join key to the text index
/// - `type`: namespaced source category, `"<source>/<category>"`
/// - `key`: unique within `type`, identifies the underlying entity
/// - `timestamp`: ISO-8601 text, sortable
/// - `search_1`: indexed text blob, doubles as a display snippet
/// - `rank`: full-text match rank, present only for search-shape rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub rowid: i64,
    pub r#type: String,
    pub key: String,
    pub title: Option<String>,
    pub category: Option<String>,
    pub timestamp: Option<String>,
    pub search_1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<f64>,
}

impl IndexRecord {
    /// The source prefix of the namespaced type, which names the database
    /// that `display_sql` lookups run against.
    pub fn source(&self) -> &str {
        self.r#type.split('/').next().unwrap_or_default()
    }
}

/// The set of recognized equality filters extracted from a request.
///
/// Insertion keeps [`FILTER_COLS`] order so built SQL is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    filters: Vec<(String, String)>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only allow-listed pairs from an arbitrary name/value stream.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut set = Self::new();
        for (name, value) in pairs {
            set.insert(name.as_ref(), value.as_ref());
        }
        set
    }

    /// Returns false when `name` is not allow-listed. A repeated name
    /// replaces the earlier value.
    pub fn insert(&mut self, name: &str, value: &str) -> bool {
        if !FILTER_COLS.contains(&name) {
            return false;
        }
        if let Some(slot) = self.filters.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value.to_string();
            return true;
        }
        self.filters.push((name.to_string(), value.to_string()));
        self.filters
            .sort_by_key(|(n, _)| FILTER_COLS.iter().position(|c| c == n));
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Transient per-call value: the free text query (may be empty) plus the
/// recognized filters.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub q: String,
    pub filters: FilterSet,
}

impl SearchRequest {
    pub fn new(q: impl Into<String>, filters: FilterSet) -> Self {
        Self { q: q.into(), filters }
    }

    /// The currently-active filter values, for re-rendering by the caller.
    pub fn active_filters(&self) -> Vec<ActiveFilter> {
        self.filters
            .iter()
            .map(|(name, value)| ActiveFilter {
                name: name.to_string(),
                value: value.to_string(),
            })
            .collect()
    }
}

/// One name/value pair the presentation layer echoes back as a hidden
/// form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveFilter {
    pub name: String,
    pub value: String,
}

/// One value of a facet histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetEntry {
    pub value: String,
    pub count: i64,
    pub selected: bool,
    pub toggle_url: String,
}

/// Histogram of counts per distinct value of one filterable dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetResult {
    pub column: String,
    pub results: Vec<FacetEntry>,
}

/// An [`IndexRecord`] enriched with the per-type `display` mapping and the
/// rendered `output` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedResult {
    #[serde(flatten)]
    pub record: IndexRecord,
    #[serde(default)]
    pub display: Row,
    #[serde(default)]
    pub output: String,
}

impl AnnotatedResult {
    pub fn new(record: IndexRecord) -> Self {
        Self {
            record,
            display: Row::new(),
            output: String::new(),
        }
    }
}

/// The composed response handed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub count: i64,
    pub results: Vec<AnnotatedResult>,
    pub facets: Vec<FacetResult>,
    pub active_filters: Vec<ActiveFilter>,
}

//! Pure query construction for the two result shapes.
//!
//! No execution happens here. Timeline shape (empty query text) browses
//! newest-first under the active filters; search shape joins the text
//! index and ranks. Every predicate is parameter-bound.

use omnidex_core::types::SearchRequest;

use crate::escape::escape_fts;

pub const TIMELINE_LIMIT: usize = 40;
pub const SEARCH_LIMIT: usize = 100;

const TIMELINE_SQL: &str = "\
select
  search_index.rowid,
  search_index.type,
  search_index.key,
  search_index.title,
  search_index.category,
  search_index.timestamp,
  search_index.search_1
from
  search_index
{where}
order by
  search_index.timestamp desc
limit 40";

const SEARCH_SQL: &str = "\
select
  search_index_fts.rank,
  search_index.rowid,
  search_index.type,
  search_index.key,
  search_index.title,
  search_index.category,
  search_index.timestamp,
  search_index.search_1
from
  search_index join search_index_fts on search_index.rowid = search_index_fts.rowid
{where}
order by
  search_index_fts.rank, search_index.timestamp desc
limit 100";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    Timeline,
    Search,
}

/// A fully-parameterized query plus its named bindings.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<(String, String)>,
    pub shape: QueryShape,
}

impl BuiltQuery {
    /// Borrowed view of the bindings, in the shape the database trait takes.
    pub fn param_refs(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect()
    }

    /// A copy with the full-text binding neutralized, for the one-shot
    /// retry after a syntax error.
    pub fn escaped(&self) -> Self {
        let mut copy = self.clone();
        for (name, value) in copy.params.iter_mut() {
            if name == "query" {
                *value = escape_fts(value);
            }
        }
        copy
    }
}

/// Build the timeline or search query for a request. The `query` binding
/// exists only in search shape; filter predicates are AND-joined and a
/// request with zero predicates gets no WHERE clause at all.
pub fn build(request: &SearchRequest) -> BuiltQuery {
    let mut where_clauses: Vec<String> = Vec::new();
    let mut params: Vec<(String, String)> = Vec::new();

    let (template, shape) = if request.q.is_empty() {
        (TIMELINE_SQL, QueryShape::Timeline)
    } else {
        where_clauses.push("search_index_fts match :query".to_string());
        params.push(("query".to_string(), request.q.clone()));
        (SEARCH_SQL, QueryShape::Search)
    };

    for (name, value) in request.filters.iter() {
        where_clauses.push(format!("[{}] = :{}", name, name));
        params.push((name.to_string(), value.to_string()));
    }

    let where_sql = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("where\n  {}", where_clauses.join(" and "))
    };
    let sql = template.replace("{where}", &where_sql);

    BuiltQuery { sql, params, shape }
}

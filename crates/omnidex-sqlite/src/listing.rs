//! The generic tabular listing capability over `search_index`: total
//! match count plus per-dimension value histograms, each value carrying a
//! pre-built toggle link. Links encode the full listing request with
//! reserved `_`-prefixed parameters; the facet link rewriter strips those
//! before anything reaches the presentation layer.

use url::form_urlencoded;

use omnidex_core::error::Result;
use omnidex_core::traits::{FacetProvider, IndexDatabase, ListingRequest, ListingResult};
use omnidex_core::types::{FacetEntry, FacetResult};
use omnidex_query::escape_fts;

use crate::database::SqliteDatabase;

/// Values per dimension, matching the listing host's default facet size.
const FACET_LIMIT: usize = 30;

pub struct TableListing<'a> {
    database: &'a SqliteDatabase,
    database_name: String,
}

impl<'a> TableListing<'a> {
    pub fn new(database: &'a SqliteDatabase, database_name: impl Into<String>) -> Self {
        Self { database, database_name: database_name.into() }
    }

    fn toggle_url(&self, request: &ListingRequest, column: &str, value: &str) -> String {
        let selected = request.filters.get(column) == Some(value);
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(search) = &request.search {
            serializer.append_pair("_search", search);
            if request.searchmode_raw {
                serializer.append_pair("_searchmode", "raw");
            }
        }
        for (name, current) in request.filters.iter() {
            if selected && name == column && current == value {
                continue;
            }
            serializer.append_pair(name, current);
        }
        if !selected {
            serializer.append_pair(column, value);
        }
        for facet in &request.facet_columns {
            serializer.append_pair("_facet", facet);
        }
        serializer.append_pair("_size", &request.size.to_string());
        format!("/{}/search_index.json?{}", self.database_name, serializer.finish())
    }
}

impl FacetProvider for TableListing<'_> {
    fn list(&self, request: &ListingRequest) -> Result<ListingResult> {
        let (where_sql, params) = build_where(request);
        let refs: Vec<(&str, &str)> = params
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect();

        let count_sql = format!("select count(*) as count from search_index{}", where_sql);
        let count_rows = self.database.execute(&count_sql, &refs)?;
        let count = count_rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0);

        let mut facets = Vec::new();
        for column in &request.facet_columns {
            let facet_where = if where_sql.is_empty() {
                format!(" where [{}] is not null", column)
            } else {
                format!("{} and [{}] is not null", where_sql, column)
            };
            let facet_sql = format!(
                "select [{}] as value, count(*) as count from search_index{} group by [{}] order by count desc, value limit {}",
                column, facet_where, column, FACET_LIMIT
            );
            let rows = self.database.execute(&facet_sql, &refs)?;

            let mut results = Vec::new();
            for row in rows {
                let value = match row.get("value") {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(v) => v.to_string(),
                    None => continue,
                };
                let value_count = row
                    .get("count")
                    .and_then(serde_json::Value::as_i64)
                    .unwrap_or(0);
                results.push(FacetEntry {
                    selected: request.filters.get(column) == Some(value.as_str()),
                    toggle_url: self.toggle_url(request, column, &value),
                    value,
                    count: value_count,
                });
            }
            facets.push(FacetResult { column: column.clone(), results });
        }

        Ok(ListingResult { count, facets })
    }
}

/// Filter predicates plus the optional full-text restriction. In raw
/// search mode the expression passes straight through to MATCH; otherwise
/// it is escaped first, the permissive interpretation.
fn build_where(request: &ListingRequest) -> (String, Vec<(String, String)>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<(String, String)> = Vec::new();

    if let Some(search) = &request.search {
        clauses.push(
            "rowid in (select rowid from search_index_fts where search_index_fts match :search)"
                .to_string(),
        );
        let text = if request.searchmode_raw {
            search.clone()
        } else {
            escape_fts(search)
        };
        params.push(("search".to_string(), text));
    }
    for (name, value) in request.filters.iter() {
        clauses.push(format!("[{}] = :{}", name, name));
        params.push((name.to_string(), value.to_string()));
    }

    if clauses.is_empty() {
        (String::new(), params)
    } else {
        (format!(" where {}", clauses.join(" and ")), params)
    }
}

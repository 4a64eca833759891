//! The request pipeline: build the timeline or search query, execute it,
//! compute count and facets under the same filters, clean the facet
//! links, annotate each row, and hand back the composed response.

use tracing::debug;

use omnidex_core::config::MissingRulePolicy;
use omnidex_core::error::Result;
use omnidex_core::rules::RuleTable;
use omnidex_core::traits::{DatabaseRegistry, FacetProvider, IndexDatabase};
use omnidex_core::types::{AnnotatedResult, SearchRequest, SearchResponse};
use omnidex_facet::{count_and_facets, rewrite_toggle_urls};
use omnidex_query::{build, executor};
use omnidex_render::ResultAnnotator;

pub struct SearchPipeline<'a> {
    database: &'a dyn IndexDatabase,
    provider: &'a dyn FacetProvider,
    annotator: ResultAnnotator<'a>,
}

impl<'a> SearchPipeline<'a> {
    pub fn new(
        database: &'a dyn IndexDatabase,
        provider: &'a dyn FacetProvider,
        registry: &'a dyn DatabaseRegistry,
        rules: &'a RuleTable,
        policy: MissingRulePolicy,
    ) -> Self {
        Self {
            database,
            provider,
            annotator: ResultAnnotator::new(rules, registry, policy),
        }
    }

    /// One full request. Recoverable search-syntax errors are remedied
    /// inside the stages and never reach the caller; everything else
    /// aborts the request with no partial results.
    pub fn run(&mut self, request: &SearchRequest) -> Result<SearchResponse> {
        let built = build(request);
        let records = executor::search(self.database, &built)?;

        let listing = count_and_facets(self.provider, request)?;
        let mut facets = listing.facets;
        rewrite_toggle_urls(&mut facets, &request.q);

        let mut results: Vec<AnnotatedResult> =
            records.into_iter().map(AnnotatedResult::new).collect();
        self.annotator.annotate_all(&mut results)?;
        debug!("annotated {} of {} matching rows", results.len(), listing.count);

        Ok(SearchResponse {
            query: request.q.clone(),
            count: listing.count,
            results,
            facets,
            active_filters: request.active_filters(),
        })
    }
}

use std::sync::Mutex;

use omnidex_core::error::{Error, Result};
use omnidex_core::traits::{FacetProvider, ListingRequest, ListingResult};
use omnidex_core::types::{FacetEntry, FacetResult, FilterSet, SearchRequest};
use omnidex_facet::{count_and_facets, rewrite_toggle_urls};

/// Provider that fails its first `failures` calls and records the raw
/// flag of every request it sees.
struct ScriptedProvider {
    failures: usize,
    fts_error: bool,
    raw_flags: Mutex<Vec<bool>>,
}

impl ScriptedProvider {
    fn new(failures: usize, fts_error: bool) -> Self {
        Self { failures, fts_error, raw_flags: Mutex::new(Vec::new()) }
    }
}

impl FacetProvider for ScriptedProvider {
    fn list(&self, request: &ListingRequest) -> Result<ListingResult> {
        let mut flags = self.raw_flags.lock().expect("lock");
        flags.push(request.searchmode_raw);
        if flags.len() <= self.failures {
            if self.fts_error {
                return Err(Error::FtsSyntax("fts5: syntax error".to_string()));
            }
            return Err(Error::Query("no such table".to_string()));
        }
        assert_eq!(request.size, 0, "count/facets only, no payload rows");
        Ok(ListingResult { count: 12, facets: Vec::new() })
    }
}

#[test]
fn synthesizes_listing_for_all_three_dimensions() {
    struct Capture(Mutex<Option<ListingRequest>>);
    impl FacetProvider for Capture {
        fn list(&self, request: &ListingRequest) -> Result<ListingResult> {
            *self.0.lock().expect("lock") = Some(request.clone());
            Ok(ListingResult { count: 0, facets: Vec::new() })
        }
    }

    let provider = Capture(Mutex::new(None));
    let filters = FilterSet::from_pairs([("category", "2")]);
    count_and_facets(&provider, &SearchRequest::new("wolf", filters)).expect("list");

    let seen = take(&provider.0);
    assert_eq!(seen.facet_columns, vec!["type", "category", "is_public"]);
    assert_eq!(seen.search.as_deref(), Some("wolf"));
    assert!(seen.searchmode_raw);
    assert_eq!(seen.filters.get("category"), Some("2"));
    assert_eq!(seen.size, 0);
}

fn take(slot: &Mutex<Option<ListingRequest>>) -> ListingRequest {
    slot.lock().expect("lock").take().expect("captured request")
}

#[test]
fn empty_query_sends_no_search_text() {
    struct Capture(Mutex<Option<ListingRequest>>);
    impl FacetProvider for Capture {
        fn list(&self, request: &ListingRequest) -> Result<ListingResult> {
            *self.0.lock().expect("lock") = Some(request.clone());
            Ok(ListingResult { count: 0, facets: Vec::new() })
        }
    }

    let provider = Capture(Mutex::new(None));
    count_and_facets(&provider, &SearchRequest::new("", FilterSet::new())).expect("list");
    assert_eq!(take(&provider.0).search, None);
}

#[test]
fn retries_once_with_raw_mode_off() {
    let provider = ScriptedProvider::new(1, true);
    let result =
        count_and_facets(&provider, &SearchRequest::new("wolf AND", FilterSet::new()))
            .expect("remedied");
    assert_eq!(result.count, 12);
    let flags = provider.raw_flags.lock().expect("lock").clone();
    assert_eq!(flags, vec![true, false]);
}

#[test]
fn second_syntax_failure_is_fatal() {
    let provider = ScriptedProvider::new(2, true);
    let err = count_and_facets(&provider, &SearchRequest::new("wolf AND", FilterSet::new()))
        .expect_err("fatal");
    assert!(matches!(err, Error::FtsSyntax(_)));
    assert_eq!(provider.raw_flags.lock().expect("lock").len(), 2);
}

#[test]
fn other_errors_are_not_retried() {
    let provider = ScriptedProvider::new(1, false);
    let err = count_and_facets(&provider, &SearchRequest::new("wolf", FilterSet::new()))
        .expect_err("fatal");
    assert!(matches!(err, Error::Query(_)));
    assert_eq!(provider.raw_flags.lock().expect("lock").len(), 1);
}

#[test]
fn rewriter_cleans_every_entry() {
    let mut facets = vec![FacetResult {
        column: "type".to_string(),
        results: vec![
            FacetEntry {
                value: "blog/post".to_string(),
                count: 5,
                selected: false,
                toggle_url: "/beta/search_index.json?_search=wolf&_facet=type&_size=0&type=blog%2Fpost"
                    .to_string(),
            },
            FacetEntry {
                value: "github/issues".to_string(),
                count: 2,
                selected: true,
                toggle_url: "/beta/search_index.json?_search=wolf&_facet=type&_size=0"
                    .to_string(),
            },
        ],
    }];

    rewrite_toggle_urls(&mut facets, "wolf");

    for entry in &facets[0].results {
        let qs = entry.toggle_url.strip_prefix('?').expect("relative link");
        for pair in qs.split('&') {
            assert!(!pair.starts_with('_'), "reserved param leaked: {}", pair);
        }
        assert!(entry.toggle_url.contains("q=wolf"));
    }
    assert_eq!(facets[0].results[0].toggle_url, "?type=blog%2Fpost&q=wolf");
    assert_eq!(facets[0].results[1].toggle_url, "?q=wolf");
}

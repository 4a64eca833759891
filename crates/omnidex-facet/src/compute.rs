//! Count and facet computation under the same effective filters as the
//! main query, by delegating to the generic listing collaborator.

use tracing::debug;

use omnidex_core::error::{Error, Result};
use omnidex_core::traits::{FacetProvider, ListingRequest, ListingResult};
use omnidex_core::types::{SearchRequest, FILTER_COLS};

/// Ask the collaborator for the total match count and one histogram per
/// allow-listed dimension, with zero rows of payload. The text query is
/// passed in raw search-expression mode first; on a syntax error the call
/// is repeated exactly once with raw mode off, letting the collaborator
/// interpret the text permissively. Any other error is fatal.
pub fn count_and_facets(
    provider: &dyn FacetProvider,
    request: &SearchRequest,
) -> Result<ListingResult> {
    match provider.list(&listing_request(request, true)) {
        Ok(result) => Ok(result),
        Err(Error::FtsSyntax(reason)) => {
            debug!("disabling raw search mode after syntax error: {}", reason);
            provider.list(&listing_request(request, false))
        }
        Err(e) => Err(e),
    }
}

fn listing_request(request: &SearchRequest, raw: bool) -> ListingRequest {
    ListingRequest {
        filters: request.filters.clone(),
        search: if request.q.is_empty() {
            None
        } else {
            Some(request.q.clone())
        },
        searchmode_raw: raw,
        facet_columns: FILTER_COLS.iter().map(|c| c.to_string()).collect(),
        size: 0,
    }
}

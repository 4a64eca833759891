use url::form_urlencoded;

use omnidex_core::types::FacetResult;

/// Collaborator-internal parameters carry this prefix and must never leak
/// into presentation-layer links.
const RESERVED_PREFIX: char = '_';

/// Rewrite every facet toggle link into a clean, stateless relative URL:
/// reserved parameters stripped, the current query text re-injected as a
/// single `q` parameter.
pub fn rewrite_toggle_urls(facets: &mut [FacetResult], q: &str) {
    for facet in facets.iter_mut() {
        for entry in facet.results.iter_mut() {
            entry.toggle_url = rewrite(&entry.toggle_url, q);
        }
    }
}

fn rewrite(link: &str, q: &str) -> String {
    let query = link.split_once('?').map(|(_, qs)| qs).unwrap_or("");
    // Last occurrence wins, matching ordinary form semantics.
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        if name.starts_with(RESERVED_PREFIX) {
            continue;
        }
        if let Some(slot) = pairs.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value.into_owned();
        } else {
            pairs.push((name.into_owned(), value.into_owned()));
        }
    }
    if let Some(slot) = pairs.iter_mut().find(|(n, _)| n == "q") {
        slot.1 = q.to_string();
    } else {
        pairs.push(("q".to_string(), q.to_string()));
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in &pairs {
        serializer.append_pair(name, value);
    }
    format!("?{}", serializer.finish())
}

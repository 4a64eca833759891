use once_cell::sync::Lazy;
use regex::Regex;

static FTS_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""[^"]*"|[^"\s]+"#).expect("static pattern"));

/// Neutralize FTS5 operators by double-quoting every bare token.
///
/// Already-quoted phrases pass through untouched; a dangling quote is
/// closed first so the output always parses.
pub fn escape_fts(query: &str) -> String {
    let mut balanced = query.to_string();
    if balanced.matches('"').count() % 2 == 1 {
        balanced.push('"');
    }
    FTS_TOKEN
        .find_iter(&balanced)
        .map(|m| m.as_str())
        .filter(|bit| *bit != "\"\"")
        .map(|bit| {
            if bit.starts_with('"') {
                bit.to_string()
            } else {
                format!("\"{}\"", bit)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

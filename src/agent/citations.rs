use std::collections::HashSet;

const SOURCE_PREFIX: &str = "Source:";

/// URLs named on `Source:` lines of one observation, in order.
pub fn source_urls(observation: &str) -> Vec<String> {
    observation
        .lines()
        .filter_map(|line| line.trim().strip_prefix(SOURCE_PREFIX))
        .filter_map(extract_url)
        .collect()
}

/// Extract the first HTTP(S) URL from a string.
fn extract_url(text: &str) -> Option<String> {
    let start = text.find("https://").or_else(|| text.find("http://"))?;
    let url_part = &text[start..];
    // Take until whitespace or end
    let end = url_part
        .find(|c: char| c.is_whitespace())
        .unwrap_or(url_part.len());
    let url = &url_part[..end];
    // Strip trailing punctuation that's likely not part of the URL
    let url = url.trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ')' | ']'));
    if url.len() > 10 {
        Some(url.to_string())
    } else {
        None
    }
}

/// Collect cited sources from tool observations, skipping ones the answer already links.
///
/// Returns URLs in first-seen order with duplicates removed.
pub fn resolve_citations(observations: &[String], answer: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for url in observations.iter().flat_map(|o| source_urls(o)) {
        if !seen.insert(url.clone()) {
            continue;
        }
        if answer.contains(&url) {
            continue;
        }
        urls.push(url);
    }

    urls
}

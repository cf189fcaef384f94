//! Rendering search hits as prompt text.

use localchat_core::search::SearchResult;

/// Text used in place of a result list when a search returned nothing.
pub const NO_RESULTS: &str = "No search results found.";

/// Render the first `max_results` hits as a numbered block.
///
/// ```text
/// Search Results:
///
/// 1. {title}
///    URL: {url}
///    {snippet}
///
/// ```
pub fn format_results(results: &[SearchResult], max_results: usize) -> String {
    if results.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut out = String::from("Search Results:\n\n");
    for (i, result) in results.iter().take(max_results).enumerate() {
        out.push_str(&format!(
            "{}. {}\n   URL: {}\n   {}\n\n",
            i + 1,
            result.title,
            result.url,
            result.snippet
        ));
    }
    out
}

//! HTML parser for link discovery
//!
//! Link discovery is best-effort: only anchors present in the delivered markup
//! are seen. Scripts are not executed, so links injected at runtime are only
//! found when the page was fetched through the browser strategy (whose HTML is
//! the rendered DOM).

use crate::url::resolve_link;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Extracts the followable links from raw HTML
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document, quoted or unquoted
///
/// **Exclude:**
/// - anchors without an `href`
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - fragment-only links (same page anchors)
/// - anything that does not resolve to an http(s) URL
///
/// Links are resolved against `base_url` (the URL the page was served from)
/// and returned in the form they will be requested: fragment stripped, path
/// and query untouched. Equivalent spellings are collapsed later by the
/// crawler's visited-set key.
///
/// # Example
///
/// ```
/// use mailcrawl::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="post#top">Post</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/blog/").unwrap();
/// let links = extract_links(html, &base_url);
/// assert!(links.contains("https://example.com/blog/post"));
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> BTreeSet<String> {
    let document = Html::parse_document(html);
    collect_links(&document, base_url)
}

fn collect_links(document: &Html, base_url: &Url) -> BTreeSet<String> {
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return BTreeSet::new();
    };

    document
        .select(&anchor_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

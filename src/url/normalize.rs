use crate::{UrlError, UrlResult};
use url::Url;

/// Tracking query parameters removed during normalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "msclkid", "mc_cid", "mc_eid"];

/// Schemes that never lead to a crawlable page
const NON_NAVIGATIONAL_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Parses a URL into the form that is actually requested
///
/// Only http(s) URLs with a host are accepted. The host is lowercased and
/// the fragment dropped; path and query are left exactly as written, so the
/// request goes to the URL the page linked to.
///
/// # Examples
///
/// ```
/// use mailcrawl::url::parse_page_url;
///
/// let url = parse_page_url("https://EXAMPLE.COM/blog/?print#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/blog/?print");
/// ```
pub fn parse_page_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {
            let lowered = host.to_lowercase();
            if lowered != host {
                url.set_host(Some(&lowered))
                    .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
            }
        }
        _ => return Err(UrlError::MissingDomain),
    }

    url.set_fragment(None);
    Ok(url)
}

/// Normalizes a URL into the key that identifies a page in the visited set
///
/// The key is only used for deduplication; pages are fetched through
/// [`parse_page_url`]'s form.
///
/// # Normalization Steps
///
/// 1. Everything [`parse_page_url`] does
/// 2. Normalize path:
///    - Remove dot segments and repeated slashes
///    - Remove trailing slash (except for root /)
/// 3. Remove tracking query parameters and sort the rest (raw text kept)
/// 4. Remove empty query string
///
/// # Examples
///
/// ```
/// use mailcrawl::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.COM/team/#people").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/team");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = parse_page_url(url_str)?;

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    if let Some(query) = url.query() {
        let query = filter_and_sort_query(query);
        url.set_query(if query.is_empty() {
            None
        } else {
            Some(query.as_str())
        });
    }

    Ok(url)
}

/// Resolves an `href` against the URL of the page it was found on
///
/// Returns the URL to fetch, or `None` when the link should not be followed:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: links
/// - anything that fails to resolve or is not http(s)
///
/// # Examples
///
/// ```
/// use mailcrawl::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://site.example/blog/post").unwrap();
/// assert_eq!(
///     resolve_link("../about#team", &base),
///     Some("https://site.example/about".to_string())
/// );
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if NON_NAVIGATIONAL_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    parse_page_url(absolute.as_str())
        .ok()
        .map(|url| url.to_string())
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

/// Drops tracking parameters and sorts the rest, keeping each pair's raw text
fn filter_and_sort_query(query: &str) -> String {
    let mut params: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(key, _)| key);
            !is_tracking_param(key)
        })
        .collect();

    params.sort_unstable();
    params.join("&")
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

//! Email address extraction and normalization
//!
//! Extraction is a best-effort text scan: HTML entities and `%40` are decoded,
//! a permissive pattern finds candidates, and every candidate is passed
//! through [`normalize_email`], which lowercases and validates it. Anything
//! that survives normalization is already in canonical form, so normalizing a
//! result again returns it unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Candidate pattern; deliberately loose, [`normalize_email`] does the validation
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[a-z0-9._%+\-]+@[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?)*\.[a-z]{2,}")
        .expect("email pattern is valid")
});

/// Top-level "domains" that are really file extensions (`logo@2x.png`)
const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico", "bmp", "css", "js", "mjs", "json",
    "woff", "woff2", "ttf", "mp4", "webm",
];

/// Extracts every plausible email address from raw text or HTML
///
/// # Examples
///
/// ```
/// use mailcrawl::email::extract_emails;
///
/// let emails = extract_emails(r#"Write to <a href="mailto:Info@Example.com">us</a> or sales&#64;example.com."#);
/// let found: Vec<_> = emails.into_iter().collect();
/// assert_eq!(found, vec!["info@example.com", "sales@example.com"]);
/// ```
pub fn extract_emails(text: &str) -> BTreeSet<String> {
    let decoded = html_escape::decode_html_entities(text);
    let decoded = decoded.replace("%40", "@");

    EMAIL_PATTERN
        .find_iter(&decoded)
        .filter_map(|m| normalize_email(m.as_str()))
        .collect()
}

/// Normalizes a single candidate address
///
/// Trims whitespace and surrounding punctuation, strips a `mailto:` prefix and
/// any `?subject=...` suffix, lowercases, and validates the shape. Returns
/// `None` for anything that is not a usable address.
///
/// # Examples
///
/// ```
/// use mailcrawl::email::normalize_email;
///
/// assert_eq!(normalize_email(" mailto:Team@Example.ORG?subject=hi "), Some("team@example.org".to_string()));
/// assert_eq!(normalize_email("logo@2x.png"), None);
/// ```
pub fn normalize_email(candidate: &str) -> Option<String> {
    let mut value = candidate.trim();

    if value
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("mailto:"))
    {
        value = &value[7..];
    }
    if let Some((address, _query)) = value.split_once('?') {
        value = address;
    }

    let value = value.trim_matches(is_wrapping_char).to_lowercase();

    let (local, domain) = value.split_once('@')?;
    if domain.contains('@') || !is_valid_local(local) || !is_valid_domain(domain) {
        return None;
    }

    Some(value)
}

fn is_wrapping_char(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '.' | ',' | ';' | ':' | '<' | '>' | '(' | ')' | '[' | ']' | '"' | '\''
        )
}

fn is_valid_local(local: &str) -> bool {
    !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'))
}

fn is_valid_domain(domain: &str) -> bool {
    if domain.len() > 253 {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    if !labels_ok {
        return false;
    }

    let tld = labels[labels.len() - 1];
    tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
        && !ASSET_EXTENSIONS.contains(&tld)
}

//! URL handling module for mailcrawl
//!
//! This module provides request URL parsing, visited-set normalization,
//! relative link resolution and domain extraction for the crawl scope filter.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, url_domain};
pub use normalize::{normalize_url, parse_page_url, resolve_link};

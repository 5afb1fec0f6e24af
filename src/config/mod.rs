//! Configuration module for mailcrawl
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every key has a default, so running without a file is
//! equivalent to an empty one.
//!
//! # Example
//!
//! ```no_run
//! use mailcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mailcrawl.toml")).unwrap();
//! println!("Crawler will visit at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BrowserConfig, Config, CrawlerConfig, FetchConfig, UserAgentConfig, WaitUntil};

// Re-export parser functions
pub use parser::{load_config, load_config_or_default, parse_config};
pub use validation::validate;

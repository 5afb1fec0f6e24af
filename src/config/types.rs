use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for mailcrawl
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub browser: BrowserConfig,
}

/// Crawl budget and scope configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum link depth from the start URL (inclusive)
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of pages dequeued and processed in one run
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Only follow links whose domain equals the start URL's domain
    #[serde(rename = "same-domain-only")]
    pub same_domain_only: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 50,
            same_domain_only: true,
        }
    }
}

/// Page fetching configuration shared by both fetch strategies
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-page timeout (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Load condition the browser strategy waits for
    #[serde(rename = "wait-until")]
    pub wait_until: WaitUntil,

    /// Fetch pages through a headless browser instead of plain HTTP
    #[serde(rename = "use-browser")]
    pub use_browser: bool,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            wait_until: WaitUntil::Load,
            use_browser: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "mailcrawl".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/mailcrawl/mailcrawl".to_string(),
        }
    }
}

/// Browser engine discovery and launch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Explicit Chrome/Chromium executable, checked before any search path
    pub executable: Option<PathBuf>,

    /// Run without a visible window
    pub headless: bool,

    /// Allow downloading a managed Chromium build when none is installed
    #[serde(rename = "allow-download")]
    pub allow_download: bool,

    /// Where downloaded Chromium builds are cached
    #[serde(rename = "cache-dir")]
    pub cache_dir: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            allow_download: false,
            cache_dir: None,
        }
    }
}

/// Page-load condition for browser navigation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    /// The `load` event has fired
    #[default]
    Load,
    /// The DOM has been parsed (`document.readyState` is no longer `loading`)
    #[value(name = "domcontentloaded")]
    DomContentLoaded,
    /// Load has fired and no new network requests started for a quiet period
    #[value(name = "networkidle")]
    NetworkIdle,
}

impl fmt::Display for WaitUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Load => "load",
            Self::DomContentLoaded => "domcontentloaded",
            Self::NetworkIdle => "networkidle",
        };
        f.write_str(name)
    }
}

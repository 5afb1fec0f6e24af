//! Browser lifecycle management
//!
//! Browser engines are acquired through an ordered list of [`BrowserProvider`]s.
//! Each provider either reports that its engine is unavailable (the next one is
//! tried), launches it, or fails hard when the engine exists but will not
//! start. The resulting [`BrowserHandle`] is owned by the caller, who must call
//! [`BrowserHandle::close`] once crawling is finished.

use crate::config::{BrowserConfig, WaitUntil};
use crate::email::normalize_email;
use crate::{BrowserError, MailcrawlError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Environment variables that point at a Chrome/Chromium executable
const EXECUTABLE_ENV_VARS: &[&str] = &["CHROME_PATH", "CHROMIUM_PATH"];

/// Distinguishes profile directories of browsers launched by one process
static LAUNCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// How often readiness conditions are polled
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long the resource count must stay unchanged to count as network idle
const NETWORK_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Collects candidate addresses from the live DOM: rendered text, `mailto:`
/// targets, and any attribute value containing `@` (including ones set by
/// scripts after load).
const PAGE_EMAIL_SCRIPT: &str = r#"
(() => {
    const pattern = /[A-Za-z0-9._%+-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}/g;
    const sources = [];
    if (document.body) {
        sources.push(document.body.innerText || '');
    }
    for (const anchor of document.querySelectorAll('a[href^="mailto:" i]')) {
        const target = anchor.getAttribute('href').slice(7).split('?')[0];
        try {
            sources.push(decodeURIComponent(target));
        } catch (e) {
            sources.push(target);
        }
    }
    for (const element of document.querySelectorAll('*')) {
        for (const attribute of element.attributes) {
            if (attribute.value.includes('@')) {
                sources.push(attribute.value);
            }
        }
    }
    const found = new Set();
    for (const text of sources) {
        for (const match of text.matchAll(pattern)) {
            found.add(match[0]);
        }
    }
    return Array.from(found);
})()
"#;

/// A launched browser and the task driving its DevTools connection
///
/// The handler task is aborted on drop, but the Chrome process is only shut
/// down cleanly through [`BrowserHandle::close`].
pub struct BrowserHandle {
    browser: Browser,
    handler: JoinHandle<()>,
    engine: String,
    user_data_dir: Option<PathBuf>,
}

impl BrowserHandle {
    fn new(browser: Browser, handler: JoinHandle<()>, engine: &str, user_data_dir: PathBuf) -> Self {
        Self {
            browser,
            handler,
            engine: engine.to_string(),
            user_data_dir: Some(user_data_dir),
        }
    }

    /// Name of the provider that launched this browser
    pub fn engine(&self) -> &str {
        &self.engine
    }

    /// Number of pages currently open in this browser
    pub async fn open_pages(&self) -> Result<usize, BrowserError> {
        self.browser
            .pages()
            .await
            .map(|pages| pages.len())
            .map_err(|e| BrowserError::Page(format!("Failed to list pages: {}", e)))
    }

    /// Opens a blank page
    pub async fn new_page(&self) -> Result<Page, BrowserError> {
        self.browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Page(format!("Failed to open page: {}", e)))
    }

    /// Shuts the browser down and removes its profile directory
    pub async fn close(mut self) -> Result<(), BrowserError> {
        info!("Closing {} browser", self.engine);

        let closed = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::Page(format!("Failed to close browser: {}", e)));

        if let Err(e) = self.browser.wait().await {
            warn!("Failed waiting for browser process to exit: {}", e);
        }

        self.handler.abort();
        self.cleanup_user_data_dir();
        closed
    }

    fn cleanup_user_data_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            debug!("Removing browser profile directory {}", path.display());
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(
                    "Failed to remove browser profile directory {}: {}",
                    path.display(),
                    e
                );
            }
        }
    }
}

impl Drop for BrowserHandle {
    fn drop(&mut self) {
        self.handler.abort();
        if self.user_data_dir.is_some() {
            warn!("Browser handle dropped without close()");
            self.cleanup_user_data_dir();
        }
    }
}

/// A candidate browser engine
///
/// `launch` returns `Ok(None)` when the engine is not available on this
/// machine, `Ok(Some(handle))` once it is running, and
/// `Err(BrowserError::LaunchFailed)` when it exists but could not be started.
#[async_trait]
pub trait BrowserProvider: Send + Sync {
    type Handle: Send;

    /// Human-readable engine name used in logs and errors
    fn name(&self) -> &str;

    async fn launch(&self) -> Result<Option<Self::Handle>, BrowserError>;
}

/// Tries each provider in order; the first launched engine wins
///
/// A provider that fails to launch an installed engine stops the search with
/// its error. If every provider reports its engine unavailable, the result is
/// [`BrowserError::NotInstalled`].
pub async fn launch_first_available<H: Send>(
    providers: &[Box<dyn BrowserProvider<Handle = H>>],
) -> Result<H, BrowserError> {
    let mut tried = Vec::with_capacity(providers.len());

    for provider in providers {
        debug!("Trying browser engine: {}", provider.name());
        match provider.launch().await? {
            Some(handle) => {
                info!("Using browser engine: {}", provider.name());
                return Ok(handle);
            }
            None => {
                debug!("Browser engine {} is not available", provider.name());
                tried.push(provider.name().to_string());
            }
        }
    }

    Err(BrowserError::NotInstalled {
        tried: tried.join(", "),
    })
}

/// The default provider order: installed Chrome/Chromium, then a managed download
pub fn default_providers(config: &BrowserConfig) -> Vec<Box<dyn BrowserProvider<Handle = BrowserHandle>>> {
    vec![
        Box::new(SystemChrome::new(config.clone())),
        Box::new(ManagedChromium::new(config.clone())),
    ]
}

/// Acquires a browser using the default provider order
///
/// # Example
///
/// ```no_run
/// use mailcrawl::config::BrowserConfig;
/// use mailcrawl::crawler::create_browser;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let browser = create_browser(&BrowserConfig::default()).await?;
/// // ... crawl with it ...
/// browser.close().await?;
/// # Ok(())
/// # }
/// ```
pub async fn create_browser(config: &BrowserConfig) -> Result<BrowserHandle, BrowserError> {
    launch_first_available(&default_providers(config)).await
}

/// Chrome or Chromium already installed on this machine
pub struct SystemChrome {
    config: BrowserConfig,
}

impl SystemChrome {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrowserProvider for SystemChrome {
    type Handle = BrowserHandle;

    fn name(&self) -> &str {
        "system Chrome/Chromium"
    }

    async fn launch(&self) -> Result<Option<BrowserHandle>, BrowserError> {
        let Some(executable) = find_browser_executable(&self.config) else {
            return Ok(None);
        };

        launch_chromium(&executable, &self.config, self.name())
            .await
            .map(Some)
    }
}

/// A Chromium build downloaded into the cache directory on first use
pub struct ManagedChromium {
    config: BrowserConfig,
}

impl ManagedChromium {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn cache_dir(&self) -> PathBuf {
        self.config.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("mailcrawl")
                .join("chromium")
        })
    }
}

#[async_trait]
impl BrowserProvider for ManagedChromium {
    type Handle = BrowserHandle;

    fn name(&self) -> &str {
        "managed Chromium"
    }

    async fn launch(&self) -> Result<Option<BrowserHandle>, BrowserError> {
        if !self.config.allow_download {
            debug!("Managed Chromium downloads are disabled");
            return Ok(None);
        }

        let cache_dir = self.cache_dir();
        let executable = match download_chromium(&cache_dir).await {
            Ok(path) => path,
            Err(e) => {
                warn!("Could not obtain managed Chromium: {}", e);
                return Ok(None);
            }
        };

        launch_chromium(&executable, &self.config, self.name())
            .await
            .map(Some)
    }
}

/// Finds a Chrome/Chromium executable
///
/// Search order: configured executable, `CHROME_PATH`/`CHROMIUM_PATH`, the
/// platform's usual install locations, then `which`.
pub fn find_browser_executable(config: &BrowserConfig) -> Option<PathBuf> {
    if let Some(path) = &config.executable {
        if path.exists() {
            return Some(path.clone());
        }
        warn!("Configured browser executable does not exist: {}", path.display());
    }

    for var in EXECUTABLE_ENV_VARS {
        if let Ok(value) = std::env::var(var) {
            let path = PathBuf::from(value);
            if path.exists() {
                info!("Using browser from {}: {}", var, path.display());
                return Some(path);
            }
            warn!("{} points to a non-existent file: {}", var, path.display());
        }
    }

    let candidates: &[&str] = if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    if let Some(path) = candidates.iter().map(PathBuf::from).find(|p| p.exists()) {
        info!("Found browser at: {}", path.display());
        return Some(path);
    }

    if !cfg!(target_os = "windows") {
        for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            let Ok(output) = Command::new("which").arg(cmd).output() else {
                continue;
            };
            if !output.status.success() {
                continue;
            }
            let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !found.is_empty() {
                info!("Found browser using 'which': {}", found);
                return Some(PathBuf::from(found));
            }
        }
    }

    None
}

async fn download_chromium(cache_dir: &Path) -> Result<PathBuf, String> {
    info!("Downloading managed Chromium into {}", cache_dir.display());

    std::fs::create_dir_all(cache_dir).map_err(|e| e.to_string())?;

    let options = BrowserFetcherOptions::builder()
        .with_path(cache_dir)
        .build()
        .map_err(|e| e.to_string())?;

    let installation = BrowserFetcher::new(options)
        .fetch()
        .await
        .map_err(|e| e.to_string())?;

    Ok(installation.executable_path)
}

async fn launch_chromium(
    executable: &Path,
    config: &BrowserConfig,
    engine: &str,
) -> Result<BrowserHandle, BrowserError> {
    let launch_failed = |message: String| BrowserError::LaunchFailed {
        engine: engine.to_string(),
        message,
    };

    let user_data_dir = profile_dir();
    std::fs::create_dir_all(&user_data_dir)
        .map_err(|e| launch_failed(format!("Failed to create profile directory: {}", e)))?;

    let mut builder = LaunchConfig::builder()
        .request_timeout(Duration::from_secs(30))
        .user_data_dir(&user_data_dir)
        .chrome_executable(executable)
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--no-sandbox")
        .arg("--disable-extensions")
        .arg("--disable-background-networking")
        .arg("--mute-audio");

    builder = if config.headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };

    let launch_config = builder.build().map_err(launch_failed)?;

    info!("Launching {} from {}", engine, executable.display());
    let (browser, mut handler) = Browser::launch(launch_config)
        .await
        .map_err(|e| launch_failed(e.to_string()))?;

    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                trace!("Browser handler error: {}", e);
            }
        }
        debug!("Browser handler task completed");
    });

    Ok(BrowserHandle::new(browser, handler_task, engine, user_data_dir))
}

/// A fresh profile directory path, unique per launch
fn profile_dir() -> PathBuf {
    let launch = LAUNCH_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "mailcrawl_chrome_{}_{}",
        std::process::id(),
        launch
    ))
}

/// Navigates `page` to `url` and waits for the requested load condition
pub(crate) async fn navigate(
    page: &Page,
    url: &str,
    wait_until: WaitUntil,
) -> Result<(), MailcrawlError> {
    let navigation_failed = |message: String| MailcrawlError::Navigation {
        url: url.to_string(),
        message,
    };

    match wait_until {
        WaitUntil::Load => {
            page.goto(url)
                .await
                .map_err(|e| navigation_failed(e.to_string()))?;
        }
        WaitUntil::DomContentLoaded => {
            let response = page
                .execute(NavigateParams::new(url))
                .await
                .map_err(|e| navigation_failed(e.to_string()))?;
            if let Some(error_text) = response.result.error_text.clone() {
                return Err(navigation_failed(error_text));
            }
            wait_for_dom_ready(page)
                .await
                .map_err(|e| navigation_failed(e.to_string()))?;
        }
        WaitUntil::NetworkIdle => {
            page.goto(url)
                .await
                .map_err(|e| navigation_failed(e.to_string()))?;
            wait_for_network_idle(page)
                .await
                .map_err(|e| navigation_failed(e.to_string()))?;
        }
    }

    let location = page.url().await.ok().flatten().unwrap_or_default();
    if location.starts_with("chrome-error://") {
        return Err(navigation_failed("browser showed an error page".to_string()));
    }

    Ok(())
}

/// Polls until the new document has been parsed
async fn wait_for_dom_ready(page: &Page) -> Result<(), chromiumoxide::error::CdpError> {
    let script = "location.href !== 'about:blank' && document.readyState !== 'loading'";
    loop {
        let ready: bool = page.evaluate(script).await?.into_value().unwrap_or(false);
        if ready {
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Polls until no new resources have started loading for the quiet period
async fn wait_for_network_idle(page: &Page) -> Result<(), chromiumoxide::error::CdpError> {
    let script = "performance.getEntriesByType('resource').length";
    let mut last_count: u64 = page.evaluate(script).await?.into_value().unwrap_or(0);
    let mut quiet_since = Instant::now();

    loop {
        tokio::time::sleep(POLL_INTERVAL).await;
        let count: u64 = page.evaluate(script).await?.into_value().unwrap_or(0);
        if count != last_count {
            last_count = count;
            quiet_since = Instant::now();
        } else if quiet_since.elapsed() >= NETWORK_QUIET_PERIOD {
            return Ok(());
        }
    }
}

/// Runs page-context email extraction on an already-navigated page
///
/// This sees the live DOM, so it can find addresses that only exist after
/// scripts ran. Results go through the same normalization as the text
/// extractor, but the two strategies are not guaranteed to agree.
pub async fn scrape_emails_from_page(page: &Page) -> Result<BTreeSet<String>, MailcrawlError> {
    let location = page.url().await.ok().flatten().unwrap_or_default();
    let extraction_failed = |message: String| MailcrawlError::Extraction {
        url: location.clone(),
        message,
    };

    let candidates: Vec<String> = page
        .evaluate(PAGE_EMAIL_SCRIPT)
        .await
        .map_err(|e| extraction_failed(e.to_string()))?
        .into_value()
        .map_err(|e| extraction_failed(format!("Unexpected script result: {}", e)))?;

    Ok(candidates
        .iter()
        .filter_map(|candidate| normalize_email(candidate))
        .collect())
}

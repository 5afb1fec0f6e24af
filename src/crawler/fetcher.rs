//! Page fetch strategies
//!
//! Both strategies turn a URL into a [`FetchedPage`]: the HTML used for link
//! discovery plus the emails found on the page.
//! - [`HttpFetcher`] issues a plain GET and scans the response body
//! - [`BrowserPageFetcher`] renders the page in Chromium and scans the live DOM
//!
//! The strategy is chosen once per operation; the crawl loop only sees the
//! [`PageFetcher`] trait.

use crate::config::{UserAgentConfig, WaitUntil};
use crate::crawler::browser::{navigate, scrape_emails_from_page, BrowserHandle};
use crate::email::extract_emails;
use crate::MailcrawlError;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeSet;
use std::time::Duration;
use url::Url;

/// Result of fetching one page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; relative links resolve against it
    pub url: Url,

    /// Normalized email addresses found on the page
    pub emails: BTreeSet<String>,

    /// Page HTML (the rendered DOM for the browser strategy)
    pub html: String,
}

/// A way of turning a URL into page content and emails
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Short strategy name for log lines
    fn strategy(&self) -> &'static str;

    async fn fetch(&self, url: &Url) -> Result<FetchedPage, MailcrawlError>;
}

/// Builds an HTTP client with the crawler's user agent
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Whole-request timeout
///
/// # Example
///
/// ```no_run
/// use mailcrawl::config::UserAgentConfig;
/// use mailcrawl::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Largest response body the HTTP strategy reads (5 MiB)
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Whether a `Content-Type` value can carry a page worth scanning
///
/// A missing header is accepted; servers that omit it almost always send HTML.
fn is_text_content(content_type: Option<&str>) -> bool {
    let Some(value) = content_type else {
        return true;
    };
    let mime = value
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime.is_empty() || mime.starts_with("text/") || mime == "application/xhtml+xml"
}

/// Plain HTTP GET strategy
///
/// Only text responses are read, and never more than the body limit.
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(user_agent: &UserAgentConfig, timeout: Duration) -> Result<Self, MailcrawlError> {
        Ok(Self {
            client: build_http_client(user_agent, timeout)?,
            timeout,
            max_body_bytes: MAX_BODY_BYTES,
        })
    }

    /// Overrides the body size limit
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn strategy(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, url: &Url) -> Result<FetchedPage, MailcrawlError> {
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                MailcrawlError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                }
            } else {
                MailcrawlError::Http {
                    url: url.to_string(),
                    source: e,
                }
            }
        };

        let mut response = self.client.get(url.clone()).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailcrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
        if !is_text_content(content_type.as_deref()) {
            return Err(MailcrawlError::ContentType {
                url: url.to_string(),
                content_type: content_type.unwrap_or_default(),
            });
        }

        let too_large = || MailcrawlError::BodyTooLarge {
            url: url.to_string(),
            limit: self.max_body_bytes,
        };
        if response
            .content_length()
            .is_some_and(|length| length > self.max_body_bytes as u64)
        {
            return Err(too_large());
        }

        let final_url = response.url().clone();
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(classify)? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        let html = String::from_utf8_lossy(&body).into_owned();
        let emails = extract_emails(&html);

        tracing::debug!("Fetched {} ({} bytes, {} emails)", final_url, html.len(), emails.len());

        Ok(FetchedPage {
            url: final_url,
            emails,
            html,
        })
    }
}

/// Headless browser strategy
///
/// Borrows a browser owned by the caller. Every fetch opens a fresh page and
/// closes it again, whether or not loading succeeded.
pub struct BrowserPageFetcher<'a> {
    browser: &'a BrowserHandle,
    wait_until: WaitUntil,
    timeout: Duration,
}

impl<'a> BrowserPageFetcher<'a> {
    pub fn new(browser: &'a BrowserHandle, wait_until: WaitUntil, timeout: Duration) -> Self {
        Self {
            browser,
            wait_until,
            timeout,
        }
    }
}

#[async_trait]
impl PageFetcher for BrowserPageFetcher<'_> {
    fn strategy(&self) -> &'static str {
        "browser"
    }

    async fn fetch(&self, url: &Url) -> Result<FetchedPage, MailcrawlError> {
        let page = self.browser.new_page().await?;

        let loaded = tokio::time::timeout(self.timeout, async {
            navigate(&page, url.as_str(), self.wait_until).await?;

            let html = page.content().await.map_err(|e| MailcrawlError::Extraction {
                url: url.to_string(),
                message: format!("Failed to read page content: {}", e),
            })?;
            let emails = scrape_emails_from_page(&page).await?;

            let final_url = page
                .url()
                .await
                .ok()
                .flatten()
                .and_then(|location| Url::parse(&location).ok())
                .unwrap_or_else(|| url.clone());

            Ok::<_, MailcrawlError>(FetchedPage {
                url: final_url,
                emails,
                html,
            })
        })
        .await;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page for {}: {}", url, e);
        }

        match loaded {
            Ok(result) => result,
            Err(_) => Err(MailcrawlError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }),
        }
    }
}

//! Crawl progress notifications

use crate::MailcrawlError;

/// Receives per-page crawl events
///
/// Both methods have defaults: visits are ignored and errors are logged as
/// warnings, so an observer only overrides what it cares about.
pub trait CrawlObserver: Send {
    /// Called after a page was fetched and its emails merged
    fn on_page_visited(&mut self, url: &str, depth: u32, email_count: usize) {
        let _ = (url, depth, email_count);
    }

    /// Called when a page could not be processed; the crawl continues
    fn on_error(&mut self, url: &str, error: &MailcrawlError) {
        tracing::warn!("Failed to process {}: {}", url, error);
    }
}

/// Logs every visit at info level
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl CrawlObserver for LoggingObserver {
    fn on_page_visited(&mut self, url: &str, depth: u32, email_count: usize) {
        tracing::info!("Visited {} (depth {}, {} emails)", url, depth, email_count);
    }
}

type VisitCallback = Box<dyn FnMut(&str, u32, usize) + Send>;
type ErrorCallback = Box<dyn FnMut(&str, &MailcrawlError) + Send>;

/// Closure-based observer
///
/// A missing error callback falls back to logging the error.
///
/// # Example
///
/// ```
/// use mailcrawl::crawler::CrawlCallbacks;
///
/// let mut visited = Vec::new();
/// let callbacks = CrawlCallbacks::new().on_page_visited(move |url, depth, _| {
///     visited.push((url.to_string(), depth));
/// });
/// # drop(callbacks);
/// ```
#[derive(Default)]
pub struct CrawlCallbacks {
    visited: Option<VisitCallback>,
    error: Option<ErrorCallback>,
}

impl CrawlCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_page_visited<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&str, u32, usize) + Send + 'static,
    {
        self.visited = Some(Box::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&str, &MailcrawlError) + Send + 'static,
    {
        self.error = Some(Box::new(callback));
        self
    }
}

impl CrawlObserver for CrawlCallbacks {
    fn on_page_visited(&mut self, url: &str, depth: u32, email_count: usize) {
        if let Some(callback) = self.visited.as_mut() {
            callback(url, depth, email_count);
        }
    }

    fn on_error(&mut self, url: &str, error: &MailcrawlError) {
        match self.error.as_mut() {
            Some(callback) => callback(url, error),
            None => tracing::warn!("Failed to process {}: {}", url, error),
        }
    }
}

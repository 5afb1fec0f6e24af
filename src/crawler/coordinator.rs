//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator owns all per-run state:
//! - the FIFO frontier of `(url, key, depth)` entries
//! - the visited set of normalized keys, which doubles as the page budget counter
//! - the domain scope computed once from the start URL
//! - the aggregated email set and run statistics
//!
//! Pages are processed one at a time. A failing page is reported to the
//! observer and skipped; nothing a single page does can end the run early.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchedPage, PageFetcher};
use crate::crawler::observer::CrawlObserver;
use crate::crawler::parser::extract_links;
use crate::output::CrawlStatistics;
use crate::url::{normalize_url, parse_page_url, url_domain};
use crate::MailcrawlError;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::time::Instant;
use url::Url;

/// Budget and scope limits for one crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Deepest link depth that is still fetched (the start URL is depth 0)
    pub max_depth: u32,

    /// Maximum number of pages processed
    pub max_pages: usize,

    /// Restrict the crawl to the start URL's domain
    pub same_domain_only: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

impl From<&CrawlerConfig> for CrawlOptions {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_pages: config.max_pages,
            same_domain_only: config.same_domain_only,
        }
    }
}

/// What a finished crawl produced
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    /// Every distinct normalized email found, sorted
    pub emails: BTreeSet<String>,

    pub stats: CrawlStatistics,
}

/// A frontier entry
///
/// `url` is what gets requested and what relative links resolve against.
/// `key` is its normalized form and is only used for the visited set.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FrontierEntry {
    url: String,
    key: String,
    depth: u32,
}

impl FrontierEntry {
    /// Builds an entry for a URL, or `None` when it has no normalized form
    fn for_link(url: String, depth: u32) -> Option<Self> {
        let key = normalize_url(&url).ok()?.to_string();
        Some(Self { url, key, depth })
    }
}

/// Main crawler coordinator structure
pub struct Coordinator<'a> {
    options: CrawlOptions,
    fetcher: &'a dyn PageFetcher,
    observer: &'a mut dyn CrawlObserver,
    start_domain: Option<String>,
    frontier: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
    emails: BTreeSet<String>,
    stats: CrawlStatistics,
}

impl<'a> Coordinator<'a> {
    /// Creates a coordinator seeded with the start URL at depth 0
    ///
    /// The start URL is keyed the same way discovered links are, so a later
    /// link back to it is recognised as visited. A start URL that does not
    /// parse has no domain and matches no scope.
    pub fn new(
        start_url: &str,
        options: CrawlOptions,
        fetcher: &'a dyn PageFetcher,
        observer: &'a mut dyn CrawlObserver,
    ) -> Self {
        let start = parse_page_url(start_url)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| start_url.trim().to_string());
        let start_domain = url_domain(&start);
        let entry = FrontierEntry::for_link(start.clone(), 0).unwrap_or_else(|| FrontierEntry {
            key: start.clone(),
            url: start,
            depth: 0,
        });

        let mut frontier = VecDeque::new();
        frontier.push_back(entry);

        Self {
            options,
            fetcher,
            observer,
            start_domain,
            frontier,
            visited: HashSet::new(),
            emails: BTreeSet::new(),
            stats: CrawlStatistics::default(),
        }
    }

    /// Runs the main crawl loop until the page budget is spent or the
    /// frontier is empty
    pub async fn run(mut self) -> CrawlOutcome {
        let start_time = Instant::now();
        tracing::info!(
            "Starting {} crawl (max depth {}, max pages {}, {})",
            self.fetcher.strategy(),
            self.options.max_depth,
            self.options.max_pages,
            if self.options.same_domain_only {
                "same domain only"
            } else {
                "cross-domain"
            }
        );

        while self.visited.len() < self.options.max_pages {
            let Some(entry) = self.frontier.pop_front() else {
                break;
            };

            if self.visited.contains(&entry.key) {
                self.stats.skipped_visited += 1;
                continue;
            }
            if entry.depth > self.options.max_depth {
                self.stats.skipped_depth += 1;
                continue;
            }
            if self.options.same_domain_only && !self.in_scope(&entry.url) {
                tracing::debug!("Skipping out-of-scope URL {}", entry.url);
                self.stats.skipped_scope += 1;
                continue;
            }

            self.visited.insert(entry.key.clone());
            self.stats.pages_visited += 1;
            tracing::debug!("Processing URL: {} (depth {})", entry.url, entry.depth);

            match fetch_entry(self.fetcher, &entry).await {
                Ok(page) => self.handle_page(&entry, page),
                Err(e) => {
                    self.stats.pages_failed += 1;
                    self.observer.on_error(&entry.url, &e);
                }
            }

            if self.stats.pages_visited % 10 == 0 {
                let rate = self.stats.pages_visited as f64 / start_time.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress: {} pages crawled, {} in frontier, {} emails, {:.2} pages/sec",
                    self.stats.pages_visited,
                    self.frontier.len(),
                    self.emails.len(),
                    rate
                );
            }
        }

        if self.frontier.is_empty() {
            tracing::info!("Frontier is empty, crawl complete");
        } else {
            tracing::info!(
                "Page budget of {} reached with {} URLs left in frontier",
                self.options.max_pages,
                self.frontier.len()
            );
        }

        self.stats.emails_found = self.emails.len();
        self.stats.elapsed = start_time.elapsed();

        tracing::info!(
            "Crawl completed: {} pages crawled, {} emails found in {:?}",
            self.stats.pages_visited,
            self.stats.emails_found,
            self.stats.elapsed
        );

        CrawlOutcome {
            emails: self.emails,
            stats: self.stats,
        }
    }

    /// Merges a fetched page's emails and enqueues its links
    fn handle_page(&mut self, entry: &FrontierEntry, page: FetchedPage) {
        self.stats.pages_succeeded += 1;

        let email_count = page.emails.len();
        self.emails.extend(page.emails);
        self.observer
            .on_page_visited(&entry.url, entry.depth, email_count);

        if entry.depth >= self.options.max_depth {
            return;
        }

        for link in extract_links(&page.html, &page.url) {
            let Some(next) = FrontierEntry::for_link(link, entry.depth + 1) else {
                continue;
            };
            if self.visited.contains(&next.key) {
                continue;
            }
            if self.options.same_domain_only && !self.in_scope(&next.url) {
                continue;
            }
            self.frontier.push_back(next);
            self.stats.links_enqueued += 1;
        }
    }

    fn in_scope(&self, url: &str) -> bool {
        self.start_domain.is_some() && url_domain(url) == self.start_domain
    }
}

async fn fetch_entry(
    fetcher: &dyn PageFetcher,
    entry: &FrontierEntry,
) -> Result<FetchedPage, MailcrawlError> {
    let url = Url::parse(&entry.url)?;
    fetcher.fetch(&url).await
}

/// Crawls breadth-first from `start_url` and collects every email found
///
/// Never fails as a whole: page-level errors go to `observer.on_error` and
/// the crawl moves on.
///
/// # Arguments
///
/// * `start_url` - Where the crawl starts (depth 0)
/// * `options` - Depth, page budget and domain scope
/// * `fetcher` - The fetch strategy used for every page
/// * `observer` - Receives visit and error events
pub async fn crawl(
    start_url: &str,
    options: CrawlOptions,
    fetcher: &dyn PageFetcher,
    observer: &mut dyn CrawlObserver,
) -> CrawlOutcome {
    Coordinator::new(start_url, options, fetcher, observer)
        .run()
        .await
}

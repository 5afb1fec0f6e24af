//! mailcrawl main entry point
//!
//! Command-line interface for extracting email addresses from a single page
//! or from a bounded crawl of a website.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use mailcrawl::config::{load_config_or_default, validate, Config, WaitUntil};
use mailcrawl::crawler::{
    crawl_website, create_browser, scrape_emails_from_url, BrowserHandle, LoggingObserver,
    PageOptions, WebsiteOptions,
};
use mailcrawl::output::{print_emails, print_statistics};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// mailcrawl: find email addresses on web pages
///
/// Emails are printed to stdout, one per line and sorted. Logs and
/// statistics go to stderr.
#[derive(Parser, Debug)]
#[command(name = "mailcrawl")]
#[command(version)]
#[command(about = "Extract email addresses from a page or a website", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to TOML configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract emails from a single page
    Page(PageArgs),

    /// Crawl a website breadth-first and extract emails from every page
    Website(WebsiteArgs),
}

/// Flags shared by both subcommands
#[derive(Args, Debug)]
struct FetchArgs {
    /// Per-page timeout in milliseconds
    #[arg(short, long, value_name = "MS")]
    timeout: Option<u64>,

    /// Render pages in a headless browser instead of plain HTTP
    #[arg(short, long)]
    browser: bool,

    /// Page-load condition to wait for in browser mode
    #[arg(short, long, value_enum, value_name = "CONDITION")]
    wait_until: Option<WaitUntil>,
}

#[derive(Args, Debug)]
struct PageArgs {
    /// URL of the page to scan
    url: String,

    #[command(flatten)]
    fetch: FetchArgs,
}

#[derive(Args, Debug)]
struct WebsiteArgs {
    /// URL to start crawling from
    url: String,

    /// Maximum link depth from the start URL
    #[arg(short = 'd', long)]
    max_depth: Option<u32>,

    /// Maximum number of pages to visit
    #[arg(short = 'p', long)]
    max_pages: Option<usize>,

    /// Follow links to other domains
    #[arg(long)]
    cross_domain: bool,

    /// Print crawl statistics to stderr when done
    #[arg(long)]
    stats: bool,

    #[command(flatten)]
    fetch: FetchArgs,
}

impl FetchArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(timeout) = self.timeout {
            config.fetch.timeout_ms = timeout;
        }
        if self.browser {
            config.fetch.use_browser = true;
        }
        if let Some(wait_until) = self.wait_until {
            config.fetch.wait_until = wait_until;
        }
    }
}

impl WebsiteArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(max_depth) = self.max_depth {
            config.crawler.max_depth = max_depth;
        }
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages = max_pages;
        }
        if self.cross_domain {
            config.crawler.same_domain_only = false;
        }
        self.fetch.apply(config);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = load_config_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    let result = match &cli.command {
        Command::Page(args) => {
            args.fetch.apply(&mut config);
            validate(&config).context("Invalid options")?;
            handle_page(&config, args).await
        }
        Command::Website(args) => {
            args.apply(&mut config);
            validate(&config).context("Invalid options")?;
            handle_website(&config, args).await
        }
    };

    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    result
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG` overrides the verbosity flags when set.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
            0 => EnvFilter::new("mailcrawl=info,warn"),
            1 => EnvFilter::new("mailcrawl=debug,info"),
            2 => EnvFilter::new("mailcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Launches a browser when the configuration asks for one
async fn acquire_browser(config: &Config) -> anyhow::Result<Option<BrowserHandle>> {
    if !config.fetch.use_browser {
        return Ok(None);
    }

    let browser = create_browser(&config.browser)
        .await
        .context("Browser mode requested but no browser could be started")?;
    tracing::info!("Fetching pages with {}", browser.engine());
    Ok(Some(browser))
}

async fn release_browser(browser: Option<BrowserHandle>) {
    if let Some(browser) = browser {
        if let Err(e) = browser.close().await {
            tracing::warn!("Failed to close browser: {}", e);
        }
    }
}

/// Handles the `page` subcommand
async fn handle_page(config: &Config, args: &PageArgs) -> anyhow::Result<()> {
    let options = PageOptions::from(config);
    let browser = acquire_browser(config).await?;

    let result = scrape_emails_from_url(&args.url, &options, browser.as_ref()).await;
    release_browser(browser).await;

    let emails = result.with_context(|| format!("Failed to scan {}", args.url))?;
    if emails.is_empty() {
        tracing::info!("No email addresses found on {}", args.url);
    }

    print_emails(&emails).context("Failed to write results")?;
    Ok(())
}

/// Handles the `website` subcommand
async fn handle_website(config: &Config, args: &WebsiteArgs) -> anyhow::Result<()> {
    let options = WebsiteOptions::from(config);
    let browser = acquire_browser(config).await?;

    let mut observer = LoggingObserver;
    let result = crawl_website(&args.url, &options, browser.as_ref(), &mut observer).await;
    release_browser(browser).await;

    let outcome = result.with_context(|| format!("Failed to crawl {}", args.url))?;

    if args.stats {
        print_statistics(&outcome.stats).context("Failed to write statistics")?;
    }

    if outcome.stats.pages_succeeded == 0 {
        bail!("Could not fetch any page starting from {}", args.url);
    }

    if outcome.emails.is_empty() {
        tracing::info!("No email addresses found");
    }

    print_emails(&outcome.emails).context("Failed to write results")?;
    Ok(())
}

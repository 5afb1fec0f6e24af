//! Crawl statistics
//!
//! Counters collected by the crawl loop and a plain-text report for the CLI.

use std::io::{self, Write};
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Pages dequeued and handed to the fetch strategy
    pub pages_visited: usize,

    /// Pages fetched and scanned successfully
    pub pages_succeeded: usize,

    /// Pages whose fetch or extraction failed
    pub pages_failed: usize,

    /// Links added to the frontier
    pub links_enqueued: usize,

    /// Frontier entries dropped because the URL was already visited
    pub skipped_visited: usize,

    /// Frontier entries dropped for exceeding the depth limit
    pub skipped_depth: usize,

    /// Frontier entries dropped for leaving the start domain
    pub skipped_scope: usize,

    /// Distinct email addresses collected
    pub emails_found: usize,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

impl CrawlStatistics {
    /// Pages per second over the whole crawl
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.pages_visited as f64 / secs
        } else {
            0.0
        }
    }
}

/// Writes a formatted statistics report
pub fn write_statistics<W: Write>(stats: &CrawlStatistics, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "=== Crawl Statistics ===")?;
    writeln!(writer)?;

    writeln!(writer, "Pages:")?;
    writeln!(writer, "  Visited: {}", stats.pages_visited)?;
    writeln!(writer, "  Succeeded: {}", stats.pages_succeeded)?;
    writeln!(writer, "  Failed: {}", stats.pages_failed)?;
    writeln!(writer)?;

    writeln!(writer, "Frontier:")?;
    writeln!(writer, "  Links enqueued: {}", stats.links_enqueued)?;
    writeln!(writer, "  Skipped (already visited): {}", stats.skipped_visited)?;
    writeln!(writer, "  Skipped (too deep): {}", stats.skipped_depth)?;
    writeln!(writer, "  Skipped (out of scope): {}", stats.skipped_scope)?;
    writeln!(writer)?;

    writeln!(writer, "Emails found: {}", stats.emails_found)?;
    writeln!(
        writer,
        "Elapsed: {:.2}s ({:.2} pages/sec)",
        stats.elapsed.as_secs_f64(),
        stats.pages_per_second()
    )?;

    Ok(())
}

/// Prints statistics to stderr, keeping stdout for results
pub fn print_statistics(stats: &CrawlStatistics) -> io::Result<()> {
    write_statistics(stats, &mut io::stderr().lock())
}

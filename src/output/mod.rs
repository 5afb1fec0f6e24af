//! Output module for crawl results
//!
//! Emails go to stdout one per line, sorted, so the output can be piped.
//! Statistics and logs go to stderr.

pub mod stats;

pub use stats::{print_statistics, write_statistics, CrawlStatistics};

use std::collections::BTreeSet;
use std::io::{self, Write};

/// Writes each email on its own line in sorted order
///
/// # Example
///
/// ```
/// use mailcrawl::output::write_emails;
/// use std::collections::BTreeSet;
///
/// let emails: BTreeSet<String> = ["b@x.example", "a@x.example"].iter().map(|s| s.to_string()).collect();
/// let mut out = Vec::new();
/// write_emails(&emails, &mut out).unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), "a@x.example\nb@x.example\n");
/// ```
pub fn write_emails<W: Write>(emails: &BTreeSet<String>, writer: &mut W) -> io::Result<()> {
    for email in emails {
        writeln!(writer, "{}", email)?;
    }
    writer.flush()
}

/// Prints emails to stdout
pub fn print_emails(emails: &BTreeSet<String>) -> io::Result<()> {
    write_emails(emails, &mut io::stdout().lock())
}

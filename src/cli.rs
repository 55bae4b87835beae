// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Subcommands:
// - crawl: crawl a whole site and report every page
// - page: audit a single page
// =============================================================================

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use site_auditor::crawl::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES, DEFAULT_RATE_LIMIT_MS};

#[derive(Parser, Debug)]
#[command(
    name = "site-auditor",
    version,
    about = "Crawl a website and report SEO issues, redirects and broken links",
    long_about = "site-auditor crawls a website breadth-first, staying on its origin, and \
                  checks every page for common SEO problems (titles, meta descriptions, \
                  headings, image alt text, canonical and robots tags). Pages that fail to \
                  load are reported as broken links."
)]
pub struct Cli {
    /// Log level for site-auditor's own messages (RUST_LOG still works for dependencies)
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website and audit every page found
    ///
    /// Example: site-auditor crawl https://example.com --max-pages 50
    Crawl {
        /// Website URL to crawl (e.g., https://example.com)
        url: String,

        /// Stop after this many pages have been crawled successfully
        #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
        max_pages: usize,

        /// Maximum link depth from the start page (0 = only the start page)
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Delay between requests, in milliseconds
        #[arg(long, default_value_t = DEFAULT_RATE_LIMIT_MS)]
        rate_limit_ms: u64,

        /// How many requests may be in flight at once (they still share the rate limit)
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
        concurrency: u16,

        #[command(flatten)]
        http: HttpArgs,

        /// Key the crawl is stored under (defaults to the site's host)
        #[arg(long)]
        site_id: Option<String>,

        /// Directory for stored crawl results
        #[arg(long, default_value = ".site-auditor")]
        store: PathBuf,

        /// Do not store the crawl result
        #[arg(long)]
        no_store: bool,

        /// Output the crawl result as JSON instead of a table
        #[arg(long, conflicts_with = "progress")]
        json: bool,

        /// Stream progress and the final result as newline-delimited JSON
        #[arg(long)]
        progress: bool,
    },

    /// Fetch one page and report its SEO signals and issues
    ///
    /// Example: site-auditor page https://example.com/about
    Page {
        /// Page URL to audit
        url: String,

        #[command(flatten)]
        http: HttpArgs,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug)]
pub struct HttpArgs {
    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// User-Agent header to send (defaults to a desktop Chrome)
    #[arg(long)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Breadth-first crawling starting from the site URL
// - Same-origin restriction (scheme, host and port must match)
// - Page and depth budgets
// - Crawl-wide rate limit, optionally several fetches in flight
// - Progress events over a channel, cancellation via CancellationToken
// - A terminal CrawlOutcome that is handed to a CrawlStore
// =============================================================================

mod orchestrator;
mod outcome;
mod progress;
mod queue;
mod target;

pub use orchestrator::{crawl_site, Crawler};
pub use outcome::{BrokenLink, CrawlOutcome, CrawlStats, CrawlStatus, PageResult, Redirect};
pub use progress::{progress_channel, CrawlProgress, ProgressSender};
pub use queue::{CrawlItem, Frontier};
pub use target::{
    CrawlOptions, CrawlTarget, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES, DEFAULT_RATE_LIMIT_MS,
};

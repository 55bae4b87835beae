// src/lib.rs
// =============================================================================
// site-auditor: crawl a website and report its SEO issues, redirects and
// broken links.
//
// Modules:
// - checker: everything about a single page (fetch, links, SEO signals,
//   issue classification)
// - crawl: the breadth-first crawl loop and the records it produces
// - store: where crawl outcomes are persisted
// - error: typed errors shared by the above
// - logging: env_logger setup for the binary
// =============================================================================

pub mod checker;
pub mod crawl;
pub mod error;
pub mod logging;
pub mod store;

pub use crawl::{crawl_site, CrawlOptions, CrawlOutcome, CrawlProgress, CrawlTarget, Crawler};
pub use error::{CrawlError, FetchError, FetchErrorKind};

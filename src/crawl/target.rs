// src/crawl/target.rs
// =============================================================================
// What to crawl (CrawlTarget) and how (CrawlOptions), plus the crawl-wide
// request throttle.
// =============================================================================

use std::time::Duration;

use tokio::time::Instant;
use url::Url;

use crate::checker::FetchConfig;
use crate::error::CrawlError;

pub const DEFAULT_MAX_PAGES: usize = 100;
pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_RATE_LIMIT_MS: u64 = 500;

/// Immutable input of one crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    url: Url,
    root: Url,
    max_pages: usize,
    max_depth: usize,
    rate_limit: Duration,
}

impl CrawlTarget {
    /// Validates and normalizes the site URL.
    ///
    /// Only http(s) URLs are accepted. The fragment is dropped so the start
    /// page compares equal to links pointing back at it.
    pub fn new(
        url: &str,
        max_pages: usize,
        max_depth: usize,
        rate_limit_ms: u64,
    ) -> Result<Self, CrawlError> {
        let mut parsed = Url::parse(url.trim()).map_err(|source| CrawlError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(CrawlError::UnsupportedScheme(parsed.scheme().to_string()));
        }
        if parsed.host_str().is_none() {
            return Err(CrawlError::InvalidUrl {
                url: url.to_string(),
                source: url::ParseError::EmptyHost,
            });
        }
        parsed.set_fragment(None);

        let mut root = parsed.clone();
        root.set_path("/");
        root.set_query(None);
        let _ = root.set_username("");
        let _ = root.set_password(None);

        Ok(Self {
            url: parsed,
            root,
            max_pages,
            max_depth,
            rate_limit: Duration::from_millis(rate_limit_ms),
        })
    }

    /// The start URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The site's origin as a URL (`scheme://host[:port]/`), used to resolve
    /// relative links and to filter off-site ones.
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Whether `url` is on this site (same scheme, host and port).
    pub fn is_same_origin(&self, url: &str) -> bool {
        Url::parse(url).is_ok_and(|url| url.origin() == self.root.origin())
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn rate_limit(&self) -> Duration {
        self.rate_limit
    }
}

/// How a crawl runs, as opposed to what it crawls.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Fetches allowed in flight at once. 1 means strictly one after another.
    pub concurrency: usize,
    pub fetch: FetchConfig,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            fetch: FetchConfig::default(),
        }
    }
}

/// Hands out request slots spaced at least `delay` apart.
///
/// The first slot is `delay` from now, and every slot is at least `delay`
/// after both the previous slot and the moment it was reserved. With one fetch
/// in flight that means "wait `delay` after the previous page before the next
/// request"; with several, all of them share the same spacing.
#[derive(Debug)]
pub(crate) struct Throttle {
    delay: Duration,
    next: Option<Instant>,
}

impl Throttle {
    pub(crate) fn new(delay: Duration) -> Self {
        Self { delay, next: None }
    }

    pub(crate) fn reserve(&mut self) -> Instant {
        let now = Instant::now();
        let base = match self.next {
            Some(next) if next > now => next,
            _ => now,
        };
        let slot = base + self.delay;
        self.next = Some(slot);
        slot
    }
}

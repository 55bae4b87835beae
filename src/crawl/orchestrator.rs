// src/crawl/orchestrator.rs
// =============================================================================
// The crawl loop.
//
// How one crawl runs:
// 1. The start URL is the only entry in the frontier
// 2. Pop URLs (oldest first) and fetch them, each one after waiting for its
//    slot from the crawl-wide throttle
// 3. For every page that loads: classify it, collect its same-origin links,
//    queue the ones we have never seen at depth + 1
// 4. For every page that fails: record a broken link and move on
// 5. Stop when the frontier is empty or max_pages pages have loaded
// 6. Build the outcome and hand it to the store
//
// All mutable crawl data lives in one CrawlState value owned by the loop.
// With concurrency > 1 several fetch futures are in flight at once, but they
// only produce data; the loop folds their results in one at a time, so
// visiting and progress stay ordered without any locking.
// =============================================================================

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, error, info, warn};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::outcome::{BrokenLink, CrawlOutcome, PageResult, Redirect};
use super::progress::{CrawlProgress, ProgressSender};
use super::queue::{CrawlItem, Frontier};
use super::target::{CrawlOptions, CrawlTarget, Throttle};
use crate::checker::{audit_page, FetchedPage, Fetcher, PageFetcher};
use crate::error::{CrawlError, FetchError};
use crate::store::CrawlStore;

/// Crawls one site with the given fetcher.
#[derive(Debug)]
pub struct Crawler<F> {
    target: CrawlTarget,
    fetcher: F,
    concurrency: usize,
}

impl Crawler<Fetcher> {
    /// A crawler that fetches over HTTP.
    pub fn with_http(target: CrawlTarget, options: &CrawlOptions) -> Result<Self, CrawlError> {
        let fetcher = Fetcher::new(target.url(), &options.fetch)?;
        Ok(Self::new(target, fetcher).with_concurrency(options.concurrency))
    }
}

impl<F: PageFetcher> Crawler<F> {
    pub fn new(target: CrawlTarget, fetcher: F) -> Self {
        Self {
            target,
            fetcher,
            concurrency: 1,
        }
    }

    /// Allows up to `concurrency` fetches in flight (at least one).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Runs the crawl to a terminal outcome.
    ///
    /// Never fails: fetch failures become broken links, and anything that
    /// stops the crawl itself (including `cancel` firing) yields an outcome
    /// with status `error`.
    pub async fn crawl(
        &self,
        progress: &mut ProgressSender,
        cancel: &CancellationToken,
    ) -> CrawlOutcome {
        let started_at = Utc::now();
        let url = self.target.url().to_string();

        info!(
            "Starting crawl of {} (max {} pages, max depth {}, {} ms apart, {} in flight)",
            url,
            self.target.max_pages(),
            self.target.max_depth(),
            self.target.rate_limit().as_millis(),
            self.concurrency
        );

        match self.run(started_at, progress, cancel).await {
            Ok(state) => {
                let remaining = state.frontier.len();
                if state.frontier.is_empty() {
                    debug!("Frontier exhausted");
                } else {
                    debug!("Page budget reached with {} URLs still queued", remaining);
                }
                let outcome = state.finish(url.clone());

                info!(
                    "Crawl completed. Total pages crawled: {} ({} broken links, {} redirects)",
                    outcome.pages.len(),
                    outcome.broken_links.len(),
                    outcome.redirects.len()
                );
                progress.emit(CrawlProgress {
                    current_page: outcome.pages.len(),
                    total_pages: self.target.max_pages(),
                    current_url: url,
                    status: format!("Crawl completed. Found {} pages.", outcome.pages.len()),
                    discovered_links: remaining,
                });
                outcome
            }
            Err(e) => {
                error!("Crawl of {} failed: {}", url, e);
                progress.emit(failed_progress(&self.target));
                CrawlOutcome::failed(url, started_at, e.to_string())
            }
        }
    }

    /// Runs the crawl and persists its outcome under `site_id`.
    ///
    /// A failed write is logged; it does not change the returned outcome.
    pub async fn crawl_and_save<S: CrawlStore>(
        &self,
        site_id: &str,
        store: &S,
        progress: &mut ProgressSender,
        cancel: &CancellationToken,
    ) -> CrawlOutcome {
        let outcome = self.crawl(progress, cancel).await;
        persist(store, site_id, &outcome).await;
        outcome
    }

    async fn run(
        &self,
        started_at: DateTime<Utc>,
        progress: &mut ProgressSender,
        cancel: &CancellationToken,
    ) -> Result<CrawlState, CrawlError> {
        let max_pages = self.target.max_pages();
        let mut state = CrawlState::new(&self.target, started_at);
        let mut throttle = Throttle::new(self.target.rate_limit());
        let mut in_flight = FuturesUnordered::new();

        loop {
            if cancel.is_cancelled() {
                return Err(CrawlError::Cancelled);
            }

            // Top up the in-flight set without overshooting the page budget
            while in_flight.len() < self.concurrency
                && state.pages.len() + in_flight.len() < max_pages
            {
                let Some(item) = state.frontier.dequeue() else {
                    break;
                };

                if state.visited.contains(&item.url) {
                    debug!("Skipping {}, already visited", item.url);
                    state.skip_duplicate(&self.target, &item.url, progress);
                    continue;
                }

                info!(
                    "Processing URL ({}/{}) [depth {}]: {}",
                    state.pages.len() + in_flight.len() + 1,
                    max_pages,
                    item.depth,
                    item.url
                );
                let status = format!("Crawling page {} of {}", state.pages.len() + 1, max_pages);
                progress.emit(state.progress(&self.target, &item.url, status));

                in_flight.push(self.fetch_at(throttle.reserve(), item));
            }

            if in_flight.is_empty() {
                break;
            }

            // Cancellation drops every in-flight fetch, which aborts its request
            let (item, result) = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CrawlError::Cancelled),
                Some(done) = in_flight.next() => done,
                else => break,
            };

            state.record(item, result, &self.target, progress);
        }

        Ok(state)
    }

    async fn fetch_at(
        &self,
        slot: Instant,
        item: CrawlItem,
    ) -> (CrawlItem, Result<FetchedPage, FetchError>) {
        tokio::time::sleep_until(slot).await;
        debug!("Fetching {}", item.url);
        let result = self.fetcher.fetch(&item.url).await;
        (item, result)
    }
}

/// Crawls a site over HTTP and persists the outcome.
///
/// This is the whole invocation contract in one call: the returned outcome is
/// `success` or `error`, and every failure (even building the HTTP client) is
/// reported through it.
pub async fn crawl_site<S: CrawlStore>(
    site_id: &str,
    target: CrawlTarget,
    options: &CrawlOptions,
    store: &S,
    progress: &mut ProgressSender,
    cancel: &CancellationToken,
) -> CrawlOutcome {
    let url = target.url().to_string();
    let failed = failed_progress(&target);

    match Crawler::with_http(target, options) {
        Ok(crawler) => crawler.crawl_and_save(site_id, store, progress, cancel).await,
        Err(e) => {
            error!("Could not start crawl of {}: {}", url, e);
            progress.emit(failed);
            let outcome = CrawlOutcome::failed(url, Utc::now(), e.to_string());
            persist(store, site_id, &outcome).await;
            outcome
        }
    }
}

async fn persist<S: CrawlStore>(store: &S, site_id: &str, outcome: &CrawlOutcome) {
    match store.save(site_id, outcome).await {
        Ok(()) => debug!("Saved crawl outcome for site {}", site_id),
        Err(e) => error!("Failed to save crawl outcome for site {}: {:#}", site_id, e),
    }
}

fn failed_progress(target: &CrawlTarget) -> CrawlProgress {
    CrawlProgress {
        current_page: 0,
        total_pages: target.max_pages(),
        current_url: target.url().to_string(),
        status: "Crawl failed. Please try again.".to_string(),
        discovered_links: 0,
    }
}

/// Everything one crawl accumulates, owned by the crawl loop.
#[derive(Debug)]
struct CrawlState {
    frontier: Frontier,
    visited: HashSet<String>,
    pages: Vec<PageResult>,
    broken_links: Vec<BrokenLink>,
    redirects: Vec<Redirect>,
    started_at: DateTime<Utc>,
}

impl CrawlState {
    fn new(target: &CrawlTarget, started_at: DateTime<Utc>) -> Self {
        Self {
            frontier: Frontier::seeded(target.url().to_string(), target.max_depth()),
            visited: HashSet::new(),
            pages: Vec::new(),
            broken_links: Vec::new(),
            redirects: Vec::new(),
            started_at,
        }
    }

    // Folds one finished fetch into the crawl
    fn record(
        &mut self,
        item: CrawlItem,
        result: Result<FetchedPage, FetchError>,
        target: &CrawlTarget,
        progress: &mut ProgressSender,
    ) {
        // False when a redirect already landed on this URL
        let first_visit = self.visited.insert(item.url.clone());

        match result {
            Ok(page) => {
                self.redirects.extend(page.redirects.iter().cloned());

                if page.final_url != item.url {
                    if !target.is_same_origin(&page.final_url) {
                        info!("{} redirects off site to {}", item.url, page.final_url);
                        let status = format!("Redirected off site to {}", page.final_url);
                        progress.emit(self.progress(target, &item.url, status));
                        return;
                    }

                    // Links to where a redirect landed are the same page
                    self.frontier.mark_seen(page.final_url.clone());
                    if !self.visited.insert(page.final_url.clone()) {
                        debug!(
                            "{} redirects to {}, which was already crawled",
                            item.url, page.final_url
                        );
                        self.skip_duplicate(target, &item.url, progress);
                        return;
                    }
                }

                if !first_visit {
                    debug!("{} was already crawled through a redirect", item.url);
                    self.skip_duplicate(target, &item.url, progress);
                    return;
                }

                let (result, links) = audit_page(&page, target.root());

                // Sorted so sibling order in the frontier is deterministic
                let mut links: Vec<String> = links.into_iter().collect();
                links.sort();
                let found = links.len();
                let mut added = 0;
                for link in links {
                    if self.frontier.enqueue(link, item.depth + 1) {
                        added += 1;
                    }
                }

                info!(
                    "Crawled {}: {} issues, {} links ({} new), queue size {}",
                    item.url,
                    result.issues.len(),
                    found,
                    added,
                    self.frontier.len()
                );
                self.pages.push(result);

                let status = format!("Found {} new links on this page", added);
                progress.emit(self.progress(target, &item.url, status));
            }
            Err(err) => {
                if err.is_network() {
                    warn!("Could not reach {}: {}", item.url, err.message);
                } else {
                    warn!("Failed to fetch {}: {}", item.url, err.message);
                }
                self.broken_links.push(BrokenLink::from_fetch_error(&item.url, &err));

                let status = format!("Failed to fetch page: {}", err.message);
                progress.emit(self.progress(target, &item.url, status));
            }
        }
    }

    fn skip_duplicate(&self, target: &CrawlTarget, url: &str, progress: &mut ProgressSender) {
        let status = "Skipping already visited page".to_string();
        progress.emit(self.progress(target, url, status));
    }

    fn progress(&self, target: &CrawlTarget, url: &str, status: String) -> CrawlProgress {
        CrawlProgress {
            current_page: self.pages.len(),
            total_pages: target.max_pages(),
            current_url: url.to_string(),
            status,
            discovered_links: self.frontier.len(),
        }
    }

    fn finish(self, url: String) -> CrawlOutcome {
        CrawlOutcome::completed(url, self.pages, self.broken_links, self.redirects, self.started_at)
    }
}

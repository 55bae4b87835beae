// src/store/mod.rs
// =============================================================================
// Where crawl outcomes go when a crawl ends.
//
// The crawler only knows the CrawlStore trait: "save this outcome for this
// site". Saving means two things:
// - keep the outcome itself
// - update the site record: last crawl time, status (active/error) and a
//   per-page summary of the latest successful crawl
//
// Implementations:
// - JsonFileStore: JSON files on disk (what the CLI uses)
// - MemoryStore: in-process, for embedding and tests
// - NoopStore: keeps nothing
// =============================================================================

mod file;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crawl::{BrokenLink, CrawlOutcome, Redirect};

pub use file::JsonFileStore;

/// Persistence collaborator of the crawler.
pub trait CrawlStore: Sync {
    fn save(
        &self,
        site_id: &str,
        outcome: &CrawlOutcome,
    ) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    Active,
    Error,
}

/// What we know about a page from the latest successful crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub meta_description: String,
    /// Redirects that started at this page
    pub redirects: Vec<Redirect>,
    /// Broken links found on this page
    pub broken_links: Vec<BrokenLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRecord {
    pub site_id: String,
    pub url: String,
    pub last_crawl: Option<DateTime<Utc>>,
    pub status: SiteStatus,
    #[serde(default)]
    pub crawl_data: Vec<PageSnapshot>,
}

impl SiteRecord {
    pub fn new(site_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            url: url.into(),
            last_crawl: None,
            status: SiteStatus::Active,
            crawl_data: Vec::new(),
        }
    }

    /// Updates the record after a crawl.
    ///
    /// A failed crawl only flips the status; the page summary of the last
    /// good crawl is kept.
    pub fn apply(&mut self, outcome: &CrawlOutcome) {
        let finished = outcome.stats.end_time.unwrap_or_else(Utc::now);
        self.last_crawl = Some(finished);

        if !outcome.is_success() {
            self.status = SiteStatus::Error;
            return;
        }

        self.status = SiteStatus::Active;
        self.url = outcome.url.clone();
        self.crawl_data = outcome
            .pages
            .iter()
            .map(|page| PageSnapshot {
                url: page.url.clone(),
                timestamp: finished,
                title: page.title.clone(),
                meta_description: page.meta_description.clone(),
                redirects: outcome
                    .redirects
                    .iter()
                    .filter(|r| r.from == page.url)
                    .cloned()
                    .collect(),
                broken_links: outcome
                    .broken_links
                    .iter()
                    .filter(|b| b.source_url == page.url)
                    .cloned()
                    .collect(),
            })
            .collect();
    }
}

/// Store that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl CrawlStore for NoopStore {
    async fn save(&self, _site_id: &str, _outcome: &CrawlOutcome) -> Result<()> {
        Ok(())
    }
}

/// Keeps site records and every outcome in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sites: Mutex<HashMap<String, (SiteRecord, Vec<CrawlOutcome>)>>,
}

impl MemoryStore {
    pub fn site(&self, site_id: &str) -> Option<SiteRecord> {
        let sites = self.sites.lock().ok()?;
        sites.get(site_id).map(|(record, _)| record.clone())
    }

    pub fn outcomes(&self, site_id: &str) -> Vec<CrawlOutcome> {
        match self.sites.lock() {
            Ok(sites) => sites
                .get(site_id)
                .map(|(_, outcomes)| outcomes.clone())
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }
}

impl CrawlStore for MemoryStore {
    async fn save(&self, site_id: &str, outcome: &CrawlOutcome) -> Result<()> {
        let mut sites = self.sites.lock().map_err(|_| anyhow!("memory store lock poisoned"))?;
        let (record, outcomes) = sites
            .entry(site_id.to_string())
            .or_insert_with(|| (SiteRecord::new(site_id, outcome.url.clone()), Vec::new()));
        record.apply(outcome);
        outcomes.push(outcome.clone());
        Ok(())
    }
}

// src/crawl/outcome.rs
// =============================================================================
// The records a crawl produces.
//
// - PageResult: one successfully fetched page and its issues
// - BrokenLink: a page we could not fetch (or could not use)
// - Redirect: one redirect hop seen by the fetcher
// - CrawlStats: page/issue totals plus start and end time
// - CrawlOutcome: the terminal result, built once when the crawl ends
//
// Everything serializes to camelCase JSON, the shape stored results and
// streamed "complete" events use.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checker::{Issue, PageSignals, Severity};
use crate::error::FetchError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub url: String,
    pub title: String,
    pub meta_description: String,
    pub h1_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robots_meta: Option<String>,
    pub issues: Vec<Issue>,
}

impl PageResult {
    pub fn new(url: String, signals: PageSignals, issues: Vec<Issue>) -> Self {
        Self {
            url,
            title: signals.title,
            meta_description: signals.meta_description,
            h1_tags: signals.h1_tags,
            canonical_url: signals.canonical_url,
            robots_meta: signals.robots_meta,
            issues,
        }
    }
}

/// A URL that failed to load.
///
/// `status_code` is `None` when the server never answered (DNS, timeout...).
/// `text` describes the failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenLink {
    pub url: String,
    pub status_code: Option<u16>,
    pub text: String,
    pub source_url: String,
}

impl BrokenLink {
    /// A page that could not be crawled, reported against itself.
    pub fn from_fetch_error(url: &str, error: &FetchError) -> Self {
        Self {
            url: url.to_string(),
            status_code: error.status,
            text: error.message.clone(),
            source_url: url.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    pub from: String,
    pub to: String,
    pub status_code: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStats {
    pub total_pages: usize,
    pub total_issues: usize,
    pub start_time: DateTime<Utc>,
    /// Only set once the crawl has finished.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl CrawlStats {
    pub fn started(start_time: DateTime<Utc>) -> Self {
        Self {
            total_pages: 0,
            total_issues: 0,
            start_time,
            end_time: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    Success,
    Error,
}

/// Terminal result of one crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlOutcome {
    pub url: String,
    pub status: CrawlStatus,
    pub status_code: u16,
    pub pages: Vec<PageResult>,
    pub broken_links: Vec<BrokenLink>,
    pub redirects: Vec<Redirect>,
    pub stats: CrawlStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrawlOutcome {
    /// Outcome of a crawl that ran to completion, even if every fetch failed.
    pub fn completed(
        url: String,
        pages: Vec<PageResult>,
        broken_links: Vec<BrokenLink>,
        redirects: Vec<Redirect>,
        start_time: DateTime<Utc>,
    ) -> Self {
        let stats = CrawlStats {
            total_pages: pages.len(),
            total_issues: pages.iter().map(|p| p.issues.len()).sum(),
            start_time,
            end_time: Some(Utc::now()),
        };

        Self {
            url,
            status: CrawlStatus::Success,
            status_code: 200,
            pages,
            broken_links,
            redirects,
            stats,
            error: None,
        }
    }

    /// Minimal outcome of a crawl that failed: no page data, just the reason.
    pub fn failed(url: String, start_time: DateTime<Utc>, error: impl Into<String>) -> Self {
        let mut stats = CrawlStats::started(start_time);
        stats.end_time = Some(Utc::now());

        Self {
            url,
            status: CrawlStatus::Error,
            status_code: 500,
            pages: Vec::new(),
            broken_links: Vec::new(),
            redirects: Vec::new(),
            stats,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CrawlStatus::Success
    }

    /// Number of issues at `severity` across all pages.
    pub fn issue_count(&self, severity: Severity) -> usize {
        self.pages
            .iter()
            .flat_map(|p| &p.issues)
            .filter(|i| i.severity == severity)
            .count()
    }
}

// src/checker/mod.rs
// =============================================================================
// This module contains everything that looks at a single page.
//
// Submodules:
// - http: Fetches a page (browser-like headers, redirect tracking)
// - html: Extracts same-origin links and SEO signals from parsed HTML
// - seo: Classifies SEO signals into typed issues
//
// audit_page() ties the three together for one fetched page. The crawler
// calls it for every page; the `page` subcommand calls it for a single URL.
// =============================================================================

mod html;
mod http;
mod seo;

use std::collections::HashSet;

use scraper::Html;
use url::Url;

use crate::crawl::PageResult;

pub use html::{extract_links, extract_signals, resolve_link};
pub use http::{
    FetchConfig, FetchedPage, Fetcher, PageFetcher, BROWSER_USER_AGENT, DEFAULT_TIMEOUT,
    MAX_REDIRECTS,
};
pub use seo::{
    classify, ImageSignal, Issue, IssueKind, PageSignals, Severity, MAX_META_DESCRIPTION_LENGTH,
    MAX_TITLE_LENGTH,
};

/// Parses a fetched page once and runs both the classifier and the link
/// extractor over it.
///
/// Returns the page's result record and the same-origin links it references.
/// The parsed document and the raw HTML go no further than this function.
pub fn audit_page(page: &FetchedPage, site_root: &Url) -> (PageResult, HashSet<String>) {
    let document = Html::parse_document(&page.html);

    let signals = extract_signals(&document);
    let mut issues = classify(&signals);
    if page.redirects.len() > 1 {
        issues.push(Issue::redirect_chain(page.redirects.len()));
    }

    let links = extract_links(&document, site_root);

    (PageResult::new(page.url.clone(), signals, issues), links)
}

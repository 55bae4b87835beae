// src/error.rs
// =============================================================================
// Typed errors for the crawler engine.
//
// Two layers:
// - FetchError: one page could not be fetched or used. Always recovered by
//   the orchestrator (it becomes a BrokenLink), never fatal to a crawl.
// - CrawlError: something went wrong with the crawl itself. These drive the
//   crawl into its Failed state and show up as an "error" outcome.
//
// The binary glues everything together with anyhow, like the rest of the CLI.
// =============================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single page fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// The final response had a non-2xx status.
    Status,
    /// The request timed out.
    Timeout,
    /// DNS failure, refused connection, TLS handshake failure...
    Connect,
    /// The redirect chain was longer than we are willing to follow.
    TooManyRedirects,
    /// The response was not an HTML document, so it cannot be parsed as a page.
    NotHtml,
    /// The body could not be read or decoded.
    Body,
    /// Anything else reqwest reports, or a URL we could not even request.
    Request,
}

/// A failed page fetch.
///
/// `status` is `None` when no HTTP response was received at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to fetch {url}: {message}")]
pub struct FetchError {
    pub url: String,
    pub status: Option<u16>,
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: None,
            kind,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Builds the error for a non-2xx final response, e.g. "HTTP 404 Not Found".
    pub fn from_status(url: impl Into<String>, status: reqwest::StatusCode) -> Self {
        let message = match status.canonical_reason() {
            Some(reason) => format!("HTTP {} {}", status.as_u16(), reason),
            None => format!("HTTP {}", status.as_u16()),
        };
        Self::new(url, FetchErrorKind::Status, message).with_status(status.as_u16())
    }

    /// Categorizes a reqwest error into one of our kinds.
    pub fn from_reqwest(url: impl Into<String>, error: reqwest::Error) -> Self {
        let error_string = error.to_string();

        let (kind, message) = if error.is_timeout() {
            (FetchErrorKind::Timeout, "Request timed out".to_string())
        } else if error.is_redirect() {
            (FetchErrorKind::TooManyRedirects, "Too many redirects".to_string())
        } else if error.is_connect() {
            let lower = error_string.to_lowercase();
            if lower.contains("dns") {
                (FetchErrorKind::Connect, "Could not resolve hostname".to_string())
            } else if lower.contains("certificate") || lower.contains("tls") {
                (FetchErrorKind::Connect, "SSL certificate error".to_string())
            } else {
                (FetchErrorKind::Connect, format!("Connection failed: {}", error_string))
            }
        } else if error.is_body() || error.is_decode() {
            (FetchErrorKind::Body, format!("Failed to read response body: {}", error_string))
        } else {
            (FetchErrorKind::Request, error_string)
        };

        let mut fetch_error = Self::new(url, kind, message);
        fetch_error.status = error.status().map(|s| s.as_u16());
        fetch_error
    }

    /// True when no HTTP response was received (DNS, connect, timeout...).
    pub fn is_network(&self) -> bool {
        self.status.is_none()
    }
}

/// Orchestration-level failures. Any of these ends the crawl as Failed.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid site URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("crawl was cancelled")]
    Cancelled,
}

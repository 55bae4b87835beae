// src/checker/http.rs
// =============================================================================
// This module fetches one page over HTTP.
//
// Key functionality:
// - Sends a GET that looks like it came from a desktop browser
//   (User-Agent, Accept, Accept-Language, Accept-Encoding, Referer)
// - Follows redirects itself, hop by hop, so every hop can be reported
// - Turns non-2xx responses, network failures and non-HTML bodies into a
//   FetchError instead of bubbling them up
//
// The fetcher never touches crawl state. Rate limiting is the caller's job:
// by the time fetch() is called, the crawl-wide delay has already elapsed.
// =============================================================================

use std::future::Future;
use std::time::Duration;

use log::debug;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use url::Url;

use crate::crawl::Redirect;
use crate::error::{CrawlError, FetchError, FetchErrorKind};

/// User agent of a current desktop Chrome.
pub const BROWSER_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
    "AppleWebKit/537.36 (KHTML, like Gecko) ",
    "Chrome/120.0.0.0 Safari/537.36"
);

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";
const ACCEPT_ENCODING: &str = "gzip, deflate, br";

/// How many redirect hops we follow before giving up on a URL.
pub const MAX_REDIRECTS: usize = 10;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A page that was fetched successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// The URL we were asked to fetch.
    pub url: String,
    /// Where we ended up after following redirects.
    pub final_url: String,
    pub status: u16,
    pub html: String,
    /// Redirect hops observed on the way, in order.
    pub redirects: Vec<Redirect>,
}

/// Anything that can fetch a page for the crawler.
///
/// `Fetcher` is the real HTTP implementation; tests plug in in-memory sites.
pub trait PageFetcher: Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}

/// Settings for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// reqwest-backed page fetcher for one site.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Builds a fetcher whose requests carry `site`'s origin as the Referer.
    pub fn new(site: &Url, config: &FetchConfig) -> Result<Self, CrawlError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE));
        headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static(ACCEPT_ENCODING));
        headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));

        // An origin is always plain ASCII, so this only fails for opaque origins
        if let Ok(referer) = HeaderValue::from_str(&site.origin().ascii_serialization()) {
            headers.insert(header::REFERER, referer);
        }

        // Redirects are followed by hand so that each hop can be recorded
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let mut current = Url::parse(url)
            .map_err(|e| {
                FetchError::new(url, FetchErrorKind::Request, format!("Invalid URL: {}", e))
            })?;
        let mut redirects = Vec::new();

        loop {
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(url, e))?;
            let status = response.status();

            if status.is_redirection() {
                // A 3xx without a usable Location (e.g. 304) is just a non-2xx answer
                if let Some(next) = redirect_target(&current, &response) {
                    if redirects.len() >= MAX_REDIRECTS {
                        return Err(FetchError::new(
                            url,
                            FetchErrorKind::TooManyRedirects,
                            format!("Too many redirects (more than {})", MAX_REDIRECTS),
                        )
                        .with_status(status.as_u16()));
                    }
                    debug!("Redirect {} {} -> {}", status.as_u16(), current, next);
                    redirects.push(Redirect {
                        from: current.to_string(),
                        to: next.to_string(),
                        status_code: status.as_u16(),
                    });
                    current = next;
                    continue;
                }
            }

            if !status.is_success() {
                return Err(FetchError::from_status(url, status));
            }

            if let Some(content_type) = content_type(&response) {
                if !is_html(&content_type) {
                    return Err(FetchError::new(
                        url,
                        FetchErrorKind::NotHtml,
                        format!("Response is not an HTML document ({})", content_type),
                    )
                    .with_status(status.as_u16()));
                }
            }

            let html = response.text().await.map_err(|e| {
                let mut err = FetchError::from_reqwest(url, e);
                err.kind = FetchErrorKind::Body;
                err.with_status(status.as_u16())
            })?;

            return Ok(FetchedPage {
                url: url.to_string(),
                final_url: current.to_string(),
                status: status.as_u16(),
                html,
                redirects,
            });
        }
    }
}

impl PageFetcher for Fetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.get(url).await
    }
}

// Resolves the Location header against the URL that answered with it
fn redirect_target(current: &Url, response: &Response) -> Option<Url> {
    let location = response.headers().get(header::LOCATION)?.to_str().ok()?;
    let mut next = current.join(location).ok()?;
    next.set_fragment(None);
    Some(next)
}

fn content_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_ascii_lowercase())
}

fn is_html(content_type: &str) -> bool {
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}

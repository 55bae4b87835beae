// tests/crawl.rs
// =============================================================================
// End-to-end crawl of a small mock site, stored with JsonFileStore.
//
// The site:
//
//   /         -> /about, /missing, https://elsewhere.invalid/
//   /about    -> /, /old
//   /old      301 -> /contact
//   /contact  (no links)
//   /missing  404
// =============================================================================

use site_auditor::crawl::{
    crawl_site, progress_channel, CrawlOptions, CrawlStatus, CrawlTarget, ProgressSender,
};
use site_auditor::store::{JsonFileStore, NoopStore, SiteStatus};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(title: &str, links: &[&str]) -> ResponseTemplate {
    let anchors: String = links.iter().map(|l| format!(r#"<a href="{}">{}</a>"#, l, l)).collect();
    let body = format!(
        "<html><head><title>{}</title><meta name=\"description\" content=\"About {}\">\
         <link rel=\"canonical\" href=\"/\"><meta name=\"robots\" content=\"index,follow\"></head>\
         <body><h1>{}</h1>{}</body></html>",
        title, title, title, anchors
    );
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

async fn mock_site() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(page("Home", &["/about", "/missing", "https://elsewhere.invalid/"]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(page("About", &["/", "/old"]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/contact"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(page("Contact", &[]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    server
}

fn options() -> CrawlOptions {
    CrawlOptions::default()
}

#[tokio::test]
async fn test_crawl_mock_site_end_to_end() {
    let server = mock_site().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());

    let target = CrawlTarget::new(&base, 10, 5, 0).unwrap();
    let (mut progress, mut rx) = progress_channel();
    let cancel = CancellationToken::new();

    let outcome = crawl_site("mock", target, &options(), &store, &mut progress, &cancel).await;
    drop(progress);

    assert_eq!(outcome.status, CrawlStatus::Success);
    assert_eq!(outcome.status_code, 200);
    assert!(outcome.error.is_none());

    let urls: Vec<&str> = outcome.pages.iter().map(|p| p.url.as_str()).collect();
    let expected = vec![format!("{}/", base), format!("{}/about", base), format!("{}/old", base)];
    assert_eq!(urls, expected.iter().map(String::as_str).collect::<Vec<_>>());

    assert_eq!(outcome.pages[0].title, "Home");
    assert_eq!(outcome.pages[0].h1_tags, vec!["Home"]);
    assert_eq!(outcome.pages[2].title, "Contact");

    assert_eq!(outcome.broken_links.len(), 1);
    assert_eq!(outcome.broken_links[0].url, format!("{}/missing", base));
    assert_eq!(outcome.broken_links[0].status_code, Some(404));

    assert_eq!(outcome.redirects.len(), 1);
    assert_eq!(outcome.redirects[0].from, format!("{}/old", base));
    assert_eq!(outcome.redirects[0].to, format!("{}/contact", base));
    assert_eq!(outcome.redirects[0].status_code, 301);

    assert_eq!(outcome.stats.total_pages, 3);
    assert!(outcome.stats.end_time.is_some());

    // Progress ends with the completion message and never goes backwards
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert!(events.windows(2).all(|w| w[0].current_page <= w[1].current_page));
    let last = events.last().unwrap();
    assert_eq!(last.status, "Crawl completed. Found 3 pages.");
    assert_eq!(last.current_page, 3);

    // The outcome and the site record were written
    let record = store.load_site("mock").await.unwrap().unwrap();
    assert_eq!(record.status, SiteStatus::Active);
    assert_eq!(record.crawl_data.len(), 3);
    assert_eq!(record.last_crawl, outcome.stats.end_time);
    assert_eq!(record.crawl_data[0].title, "Home");
    assert_eq!(record.crawl_data[2].redirects.len(), 1);

    let stored = store.load_outcomes("mock").await.unwrap();
    assert_eq!(stored, vec![outcome]);
}

#[tokio::test]
async fn test_page_budget_stops_the_crawl() {
    let server = mock_site().await;
    let base = server.uri();

    let target = CrawlTarget::new(&base, 1, 5, 0).unwrap();
    let outcome = crawl_site(
        "mock",
        target,
        &options(),
        &NoopStore,
        &mut ProgressSender::disabled(),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(outcome.status, CrawlStatus::Success);
    assert_eq!(outcome.pages.len(), 1);
    assert_eq!(outcome.pages[0].url, format!("{}/", base));
    assert!(outcome.broken_links.is_empty());
}

#[tokio::test]
async fn test_unreachable_site_completes_with_a_broken_link() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    let target = CrawlTarget::new(&format!("http://127.0.0.1:{}/", port), 10, 5, 0).unwrap();

    let outcome = crawl_site(
        "down",
        target,
        &options(),
        &store,
        &mut ProgressSender::disabled(),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(outcome.status, CrawlStatus::Success);
    assert!(outcome.pages.is_empty());
    assert_eq!(outcome.broken_links.len(), 1);
    assert_eq!(outcome.broken_links[0].status_code, None);

    let record = store.load_site("down").await.unwrap().unwrap();
    assert_eq!(record.status, SiteStatus::Active);
}

#[tokio::test]
async fn test_cancelled_crawl_is_stored_as_error() {
    let server = mock_site().await;
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());

    let cancel = CancellationToken::new();
    cancel.cancel();

    let target = CrawlTarget::new(&server.uri(), 10, 5, 0).unwrap();
    let mut progress = ProgressSender::disabled();
    let outcome = crawl_site("mock", target, &options(), &store, &mut progress, &cancel).await;

    assert_eq!(outcome.status, CrawlStatus::Error);
    assert_eq!(outcome.status_code, 500);
    assert_eq!(outcome.error.as_deref(), Some("crawl was cancelled"));

    let record = store.load_site("mock").await.unwrap().unwrap();
    assert_eq!(record.status, SiteStatus::Error);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_redirect_to_another_site_is_only_recorded() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(page("Home", &["/out"]))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/out"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/landing", other.uri())),
        )
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .respond_with(page("Foreign page", &["/foreign-only"]))
        .mount(&other)
        .await;

    let base = site.uri();
    let target = CrawlTarget::new(&base, 10, 5, 0).unwrap();
    let outcome = crawl_site(
        "mock",
        target,
        &options(),
        &NoopStore,
        &mut ProgressSender::disabled(),
        &CancellationToken::new(),
    )
    .await;

    let urls: Vec<&str> = outcome.pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(urls, vec![format!("{}/", base).as_str()]);
    assert!(outcome.broken_links.is_empty());
    assert_eq!(outcome.redirects.len(), 1);
    assert_eq!(outcome.redirects[0].from, format!("{}/out", base));
    assert_eq!(outcome.redirects[0].to, format!("{}/landing", other.uri()));

    // Nothing the foreign page links to was requested from the site
    let paths: Vec<String> = site
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(paths, vec!["/", "/out"]);
}

#[tokio::test]
async fn test_redirect_onto_a_queued_page_fetches_it_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(page("Home", &["/a", "/b"]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/b"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(page("B", &[]))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let target = CrawlTarget::new(&base, 10, 5, 0).unwrap();
    let outcome = crawl_site(
        "mock",
        target,
        &options(),
        &NoopStore,
        &mut ProgressSender::disabled(),
        &CancellationToken::new(),
    )
    .await;

    let pages: Vec<(String, String)> = outcome
        .pages
        .iter()
        .map(|p| (p.url.clone(), p.title.clone()))
        .collect();
    assert_eq!(
        pages,
        vec![
            (format!("{}/", base), "Home".to_string()),
            (format!("{}/a", base), "B".to_string()),
        ]
    );
}

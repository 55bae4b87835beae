// src/main.rs
// =============================================================================
// This is the entry point of the site-auditor CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap and set up logging
// 2. Dispatch to the subcommand handler (crawl or page)
// 3. Print the result as a table, JSON, or a stream of NDJSON events
// 4. Exit with proper code (0 = clean, 1 = problems found, 2 = error)
// =============================================================================

mod cli;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, warn};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands, HttpArgs};
use site_auditor::checker::{
    audit_page, FetchConfig, Fetcher, PageFetcher, Severity, BROWSER_USER_AGENT,
};
use site_auditor::crawl::{
    crawl_site, progress_channel, CrawlOptions, CrawlOutcome, CrawlProgress, CrawlTarget,
    PageResult, ProgressSender,
};
use site_auditor::logging::init_logger;
use site_auditor::store::{CrawlStore, JsonFileStore, NoopStore};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logger(cli.log_level.into()) {
        eprintln!("Warning: could not initialize logging: {}", e);
    }

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Crawl {
            url,
            max_pages,
            max_depth,
            rate_limit_ms,
            concurrency,
            http,
            site_id,
            store,
            no_store,
            json,
            progress,
        } => {
            let target = CrawlTarget::new(&url, max_pages, max_depth, rate_limit_ms)?;
            let site_id = site_id
                .or_else(|| target.url().host_str().map(str::to_string))
                .unwrap_or_else(|| "site".to_string());
            let options = CrawlOptions {
                concurrency: concurrency.into(),
                fetch: fetch_config(&http),
            };
            let output = if progress {
                Output::Stream
            } else if json {
                Output::Json
            } else {
                Output::Table
            };

            if no_store {
                handle_crawl(&site_id, target, &options, &NoopStore, output).await
            } else {
                let store = JsonFileStore::new(store);
                handle_crawl(&site_id, target, &options, &store, output).await
            }
        }
        Commands::Page { url, http, json } => handle_page(&url, &http, json).await,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Table,
    Json,
    Stream,
}

// One line of --progress output
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamEvent<'a> {
    Progress(&'a CrawlProgress),
    Complete(&'a CrawlOutcome),
    Error { message: &'a str },
}

fn print_event(event: &StreamEvent<'_>) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{}", line),
        Err(e) => warn!("Could not serialize progress event: {}", e),
    }
}

fn fetch_config(http: &HttpArgs) -> FetchConfig {
    FetchConfig {
        user_agent: http.user_agent.clone().unwrap_or_else(|| BROWSER_USER_AGENT.to_string()),
        timeout: Duration::from_secs(http.timeout_secs),
    }
}

// Handles the 'crawl' subcommand
async fn handle_crawl<S: CrawlStore>(
    site_id: &str,
    target: CrawlTarget,
    options: &CrawlOptions,
    store: &S,
    output: Output,
) -> Result<i32> {
    if output == Output::Table {
        println!("🔍 Crawling website: {}", target.url());
        println!(
            "📊 Max pages: {}, max depth: {}, rate limit: {} ms",
            target.max_pages(),
            target.max_depth(),
            target.rate_limit().as_millis()
        );
    }

    // Ctrl-C cancels the crawl; in-flight requests are dropped
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling crawl");
            on_interrupt.cancel();
        }
    });

    let (mut progress, printer) = if output == Output::Stream {
        let (sender, mut rx) = progress_channel();
        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                print_event(&StreamEvent::Progress(&event));
            }
        });
        (sender, Some(printer))
    } else {
        (ProgressSender::disabled(), None)
    };

    let outcome = crawl_site(site_id, target, options, store, &mut progress, &cancel).await;

    // Closing the channel lets the printer drain and finish
    drop(progress);
    if let Some(printer) = printer {
        printer.await.context("Progress printer task failed")?;
    }

    match output {
        Output::Stream => match &outcome.error {
            Some(message) => print_event(&StreamEvent::Error { message }),
            None => print_event(&StreamEvent::Complete(&outcome)),
        },
        Output::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        Output::Table => print_outcome(&outcome),
    }

    Ok(exit_code(&outcome))
}

// Handles the 'page' subcommand
async fn handle_page(url: &str, http: &HttpArgs, json: bool) -> Result<i32> {
    let target = CrawlTarget::new(url, 1, 0, 0)?;
    let fetcher = Fetcher::new(target.url(), &fetch_config(http))?;

    let page = match fetcher.fetch(target.url().as_str()).await {
        Ok(page) => page,
        Err(e) => {
            println!("❌ {}", e);
            return Ok(1);
        }
    };

    let (result, links) = audit_page(&page, target.root());

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for redirect in &page.redirects {
            println!("🔀 {} {} -> {}", redirect.status_code, redirect.from, redirect.to);
        }
        print_page(&result);
        println!("🔗 {} same-site link(s) on this page", links.len());
    }

    let has_high = result.issues.iter().any(|i| i.severity == Severity::High);
    Ok(if has_high { 1 } else { 0 })
}

// 2 = the crawl itself failed, 1 = broken links or high-severity issues, 0 = clean
fn exit_code(outcome: &CrawlOutcome) -> i32 {
    if !outcome.is_success() {
        2
    } else if !outcome.broken_links.is_empty() || outcome.issue_count(Severity::High) > 0 {
        1
    } else {
        0
    }
}

fn print_outcome(outcome: &CrawlOutcome) {
    if let Some(message) = &outcome.error {
        println!("❌ Crawl failed: {}", message);
        return;
    }

    println!("📄 Crawled {} page(s)\n", outcome.pages.len());

    println!("{:<60} {:>6} {:>6} {:>6}  {:<30}", "URL", "HIGH", "MEDIUM", "LOW", "TITLE");
    println!("{}", "=".repeat(118));
    for page in &outcome.pages {
        let count = |severity: Severity| {
            page.issues
                .iter()
                .filter(|i| i.severity == severity)
                .count()
        };
        println!(
            "{:<60} {:>6} {:>6} {:>6}  {:<30}",
            truncate(&page.url, 60),
            count(Severity::High),
            count(Severity::Medium),
            count(Severity::Low),
            truncate(&page.title, 30)
        );
    }
    println!();

    if !outcome.broken_links.is_empty() {
        println!("❌ Broken links:");
        for link in &outcome.broken_links {
            let status = link
                .status_code
                .map(|s| s.to_string())
                .unwrap_or_else(|| "---".to_string());
            println!("   {:<60} {:<5} {}", truncate(&link.url, 60), status, link.text);
        }
        println!();
    }

    if !outcome.redirects.is_empty() {
        println!("🔀 Redirects:");
        for redirect in &outcome.redirects {
            println!("   {} {} -> {}", redirect.status_code, redirect.from, redirect.to);
        }
        println!();
    }

    let duration = outcome
        .stats
        .end_time
        .map(|end| (end - outcome.stats.start_time).num_milliseconds() as f64 / 1000.0)
        .unwrap_or_default();

    println!("📊 Summary:");
    println!("   📋 Pages: {}", outcome.stats.total_pages);
    println!(
        "   ⚠️  Issues: {} ({} high, {} medium, {} low)",
        outcome.stats.total_issues,
        outcome.issue_count(Severity::High),
        outcome.issue_count(Severity::Medium),
        outcome.issue_count(Severity::Low)
    );
    println!("   ❌ Broken links: {}", outcome.broken_links.len());
    println!("   🔀 Redirects: {}", outcome.redirects.len());
    println!("   ⏱️  Took {:.1}s", duration);
}

fn print_page(page: &PageResult) {
    println!("📄 {}", page.url);
    println!("   Title: {}", page.title);
    println!("   Meta description: {}", page.meta_description);
    println!("   H1 tags: {}", page.h1_tags.join(" | "));
    println!("   Canonical: {}", page.canonical_url.as_deref().unwrap_or("-"));
    println!("   Robots: {}", page.robots_meta.as_deref().unwrap_or("-"));

    if page.issues.is_empty() {
        println!("✅ No issues found");
        return;
    }

    println!("\n{:<28} {:<8} {}", "ISSUE", "SEVERITY", "DESCRIPTION");
    println!("{}", "=".repeat(90));
    for issue in &page.issues {
        let kind = serde_json::to_value(issue.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        println!("{:<28} {:<8} {}", kind, issue.severity, issue.description);
    }
}

// Truncates to `max` characters for table display
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

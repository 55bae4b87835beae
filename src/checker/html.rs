// src/checker/html.rs
// =============================================================================
// This module reads a parsed HTML page.
//
// Two jobs:
// - extract_links(): the same-origin URLs referenced by <a href> tags, which
//   feed the crawl frontier
// - extract_signals(): title, meta description, H1s, images, canonical link
//   and robots meta, which feed the SEO classifier
//
// We use the `scraper` crate (html5ever underneath) for parsing and CSS
// selectors, and the `url` crate for resolving and comparing URLs.
// =============================================================================

use std::collections::HashSet;
use std::sync::LazyLock;

use log::{debug, trace};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::seo::{ImageSignal, PageSignals};

// Built-in selectors are constants; a parse failure here is a programming error.
fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector '{}': {:?}", css, e))
}

static ANCHORS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static META: LazyLock<Selector> = LazyLock::new(|| selector("meta[name]"));
static LINK_REL: LazyLock<Selector> = LazyLock::new(|| selector("link[rel]"));
static H1: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));

/// Extracts the deduplicated set of same-origin absolute URLs linked from a page.
///
/// Relative hrefs are resolved against `site_root` (the site's origin, e.g.
/// `https://example.com/`). Only URLs whose scheme, host and port match it
/// exactly are returned. Malformed hrefs are skipped.
pub fn extract_links(document: &Html, site_root: &Url) -> HashSet<String> {
    let origin = site_root.origin();
    let mut links = HashSet::new();

    for element in document.select(&ANCHORS) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();

        // In-page anchors point at the page we are already on
        if href.is_empty() || href.starts_with('#') {
            continue;
        }

        match resolve_link(site_root, href) {
            Ok(url) if url.origin() == origin => {
                links.insert(url.to_string());
            }
            Ok(url) => trace!("Skipping off-site link: {}", url),
            Err(e) => debug!("Dropping malformed link '{}': {}", href, e),
        }
    }

    links
}

/// Resolves an href to an absolute URL without its fragment.
///
/// Absolute hrefs are parsed as-is; anything relative is joined onto `site_root`.
pub fn resolve_link(site_root: &Url, href: &str) -> Result<Url, url::ParseError> {
    let mut url = match Url::parse(href) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => site_root.join(href)?,
        Err(e) => return Err(e),
    };
    url.set_fragment(None);
    Ok(url)
}

/// Pulls the SEO signals out of a parsed page.
pub fn extract_signals(document: &Html) -> PageSignals {
    let title = document
        .select(&TITLE)
        .next()
        .map(|el| collapse_whitespace(&text_of(el)))
        .unwrap_or_default();

    let meta_description = meta_content(document, "description").unwrap_or_default();

    let canonical_url = document
        .select(&LINK_REL)
        .find(|el| {
            el.value()
                .attr("rel")
                .is_some_and(|rel| {
                    rel.split_whitespace()
                        .any(|r| r.eq_ignore_ascii_case("canonical"))
                })
        })
        .and_then(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string);

    let robots_meta = meta_content(document, "robots").filter(|content| !content.trim().is_empty());

    let h1_tags = document
        .select(&H1)
        .map(|el| collapse_whitespace(&text_of(el)))
        .collect();

    let images = document
        .select(&IMG)
        .map(|el| ImageSignal {
            src: el.value().attr("src").unwrap_or_default().to_string(),
            alt: el.value().attr("alt").map(str::to_string),
        })
        .collect();

    PageSignals {
        title,
        meta_description,
        h1_tags,
        images,
        canonical_url,
        robots_meta,
    }
}

// First <meta name="..."> with a matching name (case-insensitive), its content
fn meta_content(document: &Html, name: &str) -> Option<String> {
    document
        .select(&META)
        .find(|el| {
            el.value()
                .attr("name")
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(name))
        })
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string)
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    fn links_of(html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut links: Vec<String> = extract_links(&document, &root()).into_iter().collect();
        links.sort();
        links
    }

    #[test]
    fn test_relative_and_absolute_links() {
        let links = links_of(
            r#"
            <a href="/docs">Docs</a>
            <a href="about">About</a>
            <a href="https://example.com/blog?page=2">Blog</a>
        "#,
        );
        assert_eq!(
            links,
            vec![
                "https://example.com/about",
                "https://example.com/blog?page=2",
                "https://example.com/docs",
            ]
        );
    }

    #[test]
    fn test_only_same_origin_links_are_kept() {
        let links = links_of(
            r#"
            <a href="https://other.com/">Other</a>
            <a href="https://sub.example.com/">Subdomain</a>
            <a href="http://example.com/">Other scheme</a>
            <a href="https://example.com:8443/">Other port</a>
            <a href="https://example.com:443/kept">Default port</a>
            <a href="//cdn.example.com/lib.js">Scheme relative</a>
            <a href="mailto:hi@example.com">Mail</a>
            <a href="javascript:void(0)">Script</a>
        "#,
        );
        assert_eq!(links, vec!["https://example.com/kept"]);
    }

    #[test]
    fn test_links_are_deduplicated_and_fragments_dropped() {
        let links = links_of(
            r##"
            <a href="/a">A</a>
            <a href="/a#section">A again</a>
            <a href="https://example.com/a">A absolute</a>
            <a href="#top">Top</a>
        "##,
        );
        assert_eq!(links, vec!["https://example.com/a"]);
    }

    #[test]
    fn test_malformed_links_are_dropped() {
        let links = links_of(
            r#"<a href="http://[::1">Broken</a><a href="">Empty</a><a href="/ok">Ok</a>"#,
        );
        assert_eq!(links, vec!["https://example.com/ok"]);
    }

    #[test]
    fn test_extract_signals() {
        let html = r#"
            <html>
              <head>
                <title>  Hello
                   World </title>
                <meta name="Description" content="A friendly page">
                <meta name="robots" content="index, follow">
                <link rel="stylesheet" href="/style.css">
                <link rel="Canonical" href="https://example.com/hello">
              </head>
              <body>
                <h1>Hello <em>there</em></h1>
                <img src="/a.png" alt="A">
                <img src="/b.png">
              </body>
            </html>
        "#;
        let signals = extract_signals(&Html::parse_document(html));

        assert_eq!(signals.title, "Hello World");
        assert_eq!(signals.meta_description, "A friendly page");
        assert_eq!(signals.robots_meta.as_deref(), Some("index, follow"));
        assert_eq!(signals.canonical_url.as_deref(), Some("https://example.com/hello"));
        assert_eq!(signals.h1_tags, vec!["Hello there"]);
        assert_eq!(signals.images.len(), 2);
        assert_eq!(signals.images[1].alt, None);
    }

    #[test]
    fn test_signals_of_empty_document() {
        let signals = extract_signals(&Html::parse_document(""));
        assert_eq!(signals, PageSignals::default());
    }

    #[test]
    fn test_empty_canonical_and_robots_count_as_absent() {
        let html = r#"<link rel="canonical" href=" "><meta name="robots" content="">"#;
        let signals = extract_signals(&Html::parse_document(html));
        assert_eq!(signals.canonical_url, None);
        assert_eq!(signals.robots_meta, None);
    }
}

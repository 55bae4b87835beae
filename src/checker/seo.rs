// src/checker/seo.rs
// =============================================================================
// This module turns the SEO signals of one page into a list of issues.
//
// The checks run in a fixed order:
//   title -> meta description -> headings -> images -> canonical -> robots
//
// Each check is independent, so one page can carry several issues at once.
// classify() is a pure function: same signals in, same issues out.
// =============================================================================

use serde::{Deserialize, Serialize};

/// Titles longer than this many characters are flagged.
pub const MAX_TITLE_LENGTH: usize = 60;

/// Meta descriptions longer than this many characters are flagged.
pub const MAX_META_DESCRIPTION_LENGTH: usize = 160;

/// Every kind of issue a page can be stored with.
///
/// The classifier only produces the first nine; `RedirectChain` is attached by
/// the crawler when a page is reached through several redirect hops, and
/// `BrokenLink`/`Error` exist so stored results keep the full vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingTitle,
    TitleTooLong,
    MissingMetaDescription,
    MetaDescriptionTooLong,
    MissingH1,
    DuplicateH1,
    MissingImageAlt,
    MissingCanonical,
    MissingRobotsMeta,
    BrokenLink,
    RedirectChain,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        f.pad(label)
    }
}

/// One SEO defect found on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub description: String,
    pub severity: Severity,
}

impl Issue {
    pub fn new(kind: IssueKind, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            severity,
        }
    }

    pub fn redirect_chain(hops: usize) -> Self {
        Self::new(
            IssueKind::RedirectChain,
            Severity::Medium,
            format!("Page is reached through a chain of {} redirects", hops),
        )
    }
}

/// An `<img>` tag as the classifier sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSignal {
    pub src: String,
    pub alt: Option<String>,
}

impl ImageSignal {
    fn has_alt(&self) -> bool {
        self.alt.as_deref().is_some_and(|alt| !alt.is_empty())
    }
}

/// Everything the classifier needs to know about one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSignals {
    pub title: String,
    pub meta_description: String,
    pub h1_tags: Vec<String>,
    pub images: Vec<ImageSignal>,
    pub canonical_url: Option<String>,
    pub robots_meta: Option<String>,
}

/// Classifies a page's signals into SEO issues.
pub fn classify(signals: &PageSignals) -> Vec<Issue> {
    let mut issues = Vec::new();

    // Title
    let title = signals.title.trim();
    if title.is_empty() {
        issues.push(Issue::new(
            IssueKind::MissingTitle,
            Severity::High,
            "Page is missing a title tag",
        ));
    } else if title.chars().count() > MAX_TITLE_LENGTH {
        issues.push(Issue::new(
            IssueKind::TitleTooLong,
            Severity::Medium,
            format!("Title tag is too long (should be under {} characters)", MAX_TITLE_LENGTH),
        ));
    }

    // Meta description
    let description = signals.meta_description.trim();
    if description.is_empty() {
        issues.push(Issue::new(
            IssueKind::MissingMetaDescription,
            Severity::Medium,
            "Page is missing a meta description",
        ));
    } else if description.chars().count() > MAX_META_DESCRIPTION_LENGTH {
        issues.push(Issue::new(
            IssueKind::MetaDescriptionTooLong,
            Severity::Low,
            format!(
                "Meta description is too long (should be under {} characters)",
                MAX_META_DESCRIPTION_LENGTH
            ),
        ));
    }

    // Headings
    match signals.h1_tags.len() {
        0 => issues.push(Issue::new(
            IssueKind::MissingH1,
            Severity::High,
            "Page is missing an H1 tag",
        )),
        1 => {}
        count => issues.push(Issue::new(
            IssueKind::DuplicateH1,
            Severity::Medium,
            format!("Page has {} H1 tags. Only one H1 tag is recommended.", count),
        )),
    }

    // Images
    let missing_alt = signals.images.iter().filter(|img| !img.has_alt()).count();
    if missing_alt > 0 {
        let description = if missing_alt == 1 {
            "1 image is missing alt text".to_string()
        } else {
            format!("{} images are missing alt text", missing_alt)
        };
        issues.push(Issue::new(IssueKind::MissingImageAlt, Severity::Medium, description));
    }

    // Canonical
    if signals.canonical_url.is_none() {
        issues.push(Issue::new(
            IssueKind::MissingCanonical,
            Severity::Low,
            "Page is missing a canonical URL",
        ));
    }

    // Robots
    if signals.robots_meta.is_none() {
        issues.push(Issue::new(
            IssueKind::MissingRobotsMeta,
            Severity::Low,
            "Page is missing robots meta tag",
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy_page() -> PageSignals {
        PageSignals {
            title: "Widgets for every occasion".to_string(),
            meta_description: "We sell widgets.".to_string(),
            h1_tags: vec!["Widgets".to_string()],
            images: vec![ImageSignal {
                src: "/logo.png".to_string(),
                alt: Some("Logo".to_string()),
            }],
            canonical_url: Some("https://example.com/".to_string()),
            robots_meta: Some("index, follow".to_string()),
        }
    }

    fn kinds(issues: &[Issue]) -> Vec<IssueKind> {
        issues.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_healthy_page_has_no_issues() {
        assert!(classify(&healthy_page()).is_empty());
    }

    #[test]
    fn test_bare_page_gets_six_issues_in_order() {
        let signals = PageSignals {
            images: vec![ImageSignal {
                src: "/hero.jpg".to_string(),
                alt: None,
            }],
            ..PageSignals::default()
        };

        let issues = classify(&signals);

        assert_eq!(
            kinds(&issues),
            vec![
                IssueKind::MissingTitle,
                IssueKind::MissingMetaDescription,
                IssueKind::MissingH1,
                IssueKind::MissingImageAlt,
                IssueKind::MissingCanonical,
                IssueKind::MissingRobotsMeta,
            ]
        );
        let severities: Vec<Severity> = issues.iter().map(|i| i.severity).collect();
        assert_eq!(
            severities,
            vec![
                Severity::High,
                Severity::Medium,
                Severity::High,
                Severity::Medium,
                Severity::Low,
                Severity::Low,
            ]
        );
    }

    #[test]
    fn test_length_thresholds() {
        let mut signals = healthy_page();
        signals.title = "t".repeat(MAX_TITLE_LENGTH);
        signals.meta_description = "d".repeat(MAX_META_DESCRIPTION_LENGTH);
        assert!(classify(&signals).is_empty());

        signals.title.push('t');
        signals.meta_description.push('d');
        let issues = classify(&signals);
        assert_eq!(
            kinds(&issues),
            vec![IssueKind::TitleTooLong, IssueKind::MetaDescriptionTooLong]
        );
        assert_eq!(issues[0].severity, Severity::Medium);
        assert_eq!(issues[1].severity, Severity::Low);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let mut signals = healthy_page();
        // 60 two-byte characters is still within the limit
        signals.title = "é".repeat(MAX_TITLE_LENGTH);
        assert!(classify(&signals).is_empty());
    }

    #[test]
    fn test_duplicate_h1_reports_count() {
        let mut signals = healthy_page();
        signals.h1_tags = vec!["One".into(), "Two".into(), "Three".into()];
        let issues = classify(&signals);
        assert_eq!(kinds(&issues), vec![IssueKind::DuplicateH1]);
        assert!(issues[0].description.contains("3 H1 tags"));
    }

    #[test]
    fn test_missing_alt_counts_empty_and_absent() {
        let mut signals = healthy_page();
        signals.images = vec![
            ImageSignal { src: "/a.png".into(), alt: None },
            ImageSignal { src: "/b.png".into(), alt: Some(String::new()) },
            ImageSignal { src: "/c.png".into(), alt: Some("Chart".into()) },
        ];
        let issues = classify(&signals);
        assert_eq!(kinds(&issues), vec![IssueKind::MissingImageAlt]);
        assert_eq!(issues[0].description, "2 images are missing alt text");
    }

    #[test]
    fn test_whitespace_alt_counts_as_present() {
        let mut signals = healthy_page();
        signals.images = vec![ImageSignal { src: "/spacer.gif".into(), alt: Some(" ".into()) }];
        assert!(classify(&signals).is_empty());
    }

    #[test]
    fn test_classification_is_idempotent() {
        let signals = PageSignals {
            title: "x".repeat(80),
            h1_tags: vec!["a".into(), "b".into()],
            ..PageSignals::default()
        };
        assert_eq!(classify(&signals), classify(&signals));
    }

    #[test]
    fn test_issue_serializes_with_type_field() {
        let issue = Issue::new(IssueKind::MissingH1, Severity::High, "Page is missing an H1 tag");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "missing_h1");
        assert_eq!(json["severity"], "high");
    }
}

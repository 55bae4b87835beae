// src/store/file.rs
// =============================================================================
// A CrawlStore backed by JSON files.
//
// Layout under the root directory:
//
//   <site_id>/site.json                     the SiteRecord
//   <site_id>/crawls/<start time>.json      one CrawlOutcome per crawl
//
// Files are written to a temporary name and renamed into place, so a reader
// never sees half a record.
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use super::{CrawlStore, SiteRecord};
use crate::crawl::CrawlOutcome;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Reads a site's record, if it has ever been saved.
    pub async fn load_site(&self, site_id: &str) -> Result<Option<SiteRecord>> {
        let path = self.site_dir(site_id).join("site.json");
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let record: SiteRecord = serde_json::from_slice(&bytes)
                    .with_context(|| format!("Failed to parse site record {}", path.display()))?;
                Ok(Some(record))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read site record {}", path.display()))
            }
        }
    }

    /// Reads every stored outcome of a site, oldest first.
    pub async fn load_outcomes(&self, site_id: &str) -> Result<Vec<CrawlOutcome>> {
        let dir = self.site_dir(site_id).join("crawls");
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("Failed to list {}", dir.display())),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut outcomes = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let outcome: CrawlOutcome = serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to parse crawl outcome {}", path.display()))?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    fn site_dir(&self, site_id: &str) -> PathBuf {
        self.root.join(sanitize(site_id))
    }

    async fn write(&self, site_id: &str, outcome: &CrawlOutcome) -> Result<()> {
        let dir = self.site_dir(site_id);
        let crawls = dir.join("crawls");
        tokio::fs::create_dir_all(&crawls)
            .await
            .with_context(|| format!("Failed to create {}", crawls.display()))?;

        // Timestamps sort lexically in this format
        let name = format!("{}.json", outcome.stats.start_time.format("%Y%m%dT%H%M%S%.6fZ"));
        write_json(&crawls.join(name), outcome).await?;

        let mut record = self
            .load_site(site_id)
            .await?
            .unwrap_or_else(|| SiteRecord::new(site_id, outcome.url.clone()));
        record.apply(outcome);
        write_json(&dir.join("site.json"), &record).await
    }
}

impl CrawlStore for JsonFileStore {
    async fn save(&self, site_id: &str, outcome: &CrawlOutcome) -> Result<()> {
        self.write(site_id, outcome).await
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to move {} into place", path.display()))?;
    Ok(())
}

// Site ids become directory names
fn sanitize(site_id: &str) -> String {
    let cleaned: String = site_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

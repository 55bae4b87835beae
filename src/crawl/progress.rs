// src/crawl/progress.rs
// =============================================================================
// Progress events, sent from the crawler to whoever started it.
//
// Events travel over a tokio mpsc channel instead of a callback, so the
// crawler never runs caller code in the middle of its loop. If the receiver
// goes away the crawl carries on quietly.
// =============================================================================

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlProgress {
    /// Pages completed successfully so far
    pub current_page: usize,
    /// The page budget
    pub total_pages: usize,
    pub current_url: String,
    pub status: String,
    /// URLs waiting in the frontier
    pub discovered_links: usize,
}

/// Creates a connected progress sender/receiver pair.
pub fn progress_channel() -> (ProgressSender, mpsc::UnboundedReceiver<CrawlProgress>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender { tx: Some(tx), high_water: 0 }, rx)
}

/// Sending half handed to the crawler.
///
/// `current_page` never goes backwards across the events one sender emits.
#[derive(Debug, Default)]
pub struct ProgressSender {
    tx: Option<mpsc::UnboundedSender<CrawlProgress>>,
    high_water: usize,
}

impl ProgressSender {
    /// A sender that drops every event.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub(crate) fn emit(&mut self, mut progress: CrawlProgress) {
        progress.current_page = progress.current_page.max(self.high_water);
        self.high_water = progress.current_page;

        if let Some(tx) = &self.tx {
            if tx.send(progress).is_err() {
                debug!("Progress receiver dropped, no more progress events");
                self.tx = None;
            }
        }
    }
}

// src/crawl/queue.rs
// =============================================================================
// The crawl frontier: pages discovered but not fetched yet.
//
// How it works:
// 1. The start URL goes in at depth 0
// 2. Every page fetched hands back its links at depth + 1
// 3. A link is only queued if we have never seen it and it is within the
//    depth budget
// 4. Pages come out in the order they went in (breadth-first)
//
// Rust concepts:
// - VecDeque: push_back()/pop_front() give us a FIFO queue
// - HashSet: O(1) "have we seen this URL?" checks
// =============================================================================

use std::collections::{HashSet, VecDeque};

/// A page waiting to be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlItem {
    pub url: String,
    /// How many link hops from the start URL
    pub depth: usize,
}

/// FIFO queue plus the set of every URL ever enqueued.
///
/// A URL goes into `seen` the moment it is enqueued and never leaves, so it
/// can be enqueued at most once per crawl.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CrawlItem>,
    seen: HashSet<String>,
    max_depth: usize,
}

impl Frontier {
    pub fn new(max_depth: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            max_depth,
        }
    }

    /// A frontier holding just the start URL at depth 0.
    pub fn seeded(start_url: impl Into<String>, max_depth: usize) -> Self {
        let mut frontier = Self::new(max_depth);
        frontier.enqueue(start_url.into(), 0);
        frontier
    }

    /// Queues `url` unless it was seen before or `depth` is past the budget.
    ///
    /// Returns whether the URL was queued.
    pub fn enqueue(&mut self, url: String, depth: usize) -> bool {
        if depth > self.max_depth || self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.queue.push_back(CrawlItem { url, depth });
        true
    }

    pub fn dequeue(&mut self) -> Option<CrawlItem> {
        self.queue.pop_front()
    }

    /// Records a URL as known without queueing it (e.g. a redirect target).
    pub fn mark_seen(&mut self, url: impl Into<String>) {
        self.seen.insert(url.into());
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why is `seen` separate from the orchestrator's visited set?
//    - `seen` answers "was this ever queued?" and makes enqueue idempotent
//    - visited answers "has this been fetched?"; a queued URL is seen but not
//      yet visited
//
// 2. Why check depth here and not in the crawler?
//    - Then nothing past the budget can ever be in the queue, so nothing past
//      the budget can ever be fetched
// -----------------------------------------------------------------------------

// src/crawl/frontier.rs
// =============================================================================
// The frontier holds the URLs still to visit, bucketed by remaining depth.
//
// How it is consumed:
// - The orchestrator drains one whole depth bucket at a time, highest depth
//   first (breadth-first over depth levels).
// - Newly discovered links go into the bucket one level below the page that
//   linked them.
//
// The key invariant: a URL is enqueued at most once for the entire run. The
// `queued` set grows monotonically and is never cleared, so a URL that was
// drained for processing can never be re-enqueued, even if five other pages
// rediscover it later.
//
// Rust concepts:
// - HashMap<usize, Vec<String>>: depth buckets, insertion order preserved
//   within a bucket
// - HashSet: O(1) membership checks for the queued set
// =============================================================================

use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct Frontier {
    /// URLs awaiting visitation, keyed by remaining depth
    buckets: HashMap<usize, Vec<String>>,
    /// Every URL ever enqueued; never shrinks during a run
    queued: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Frontier {
        Frontier::default()
    }

    /// Enqueues a canonical URL at the given depth
    ///
    /// Returns false (and does nothing) if the URL was ever enqueued before,
    /// at any depth - a URL lives in at most one bucket at any time.
    pub fn push(&mut self, depth: usize, url: String) -> bool {
        if !self.queued.insert(url.clone()) {
            return false;
        }
        self.buckets.entry(depth).or_default().push(url);
        true
    }

    /// Removes and returns the whole bucket for one depth level
    ///
    /// Returns an empty Vec when nothing was queued at that depth.
    pub fn take_level(&mut self, depth: usize) -> Vec<String> {
        self.buckets.remove(&depth).unwrap_or_default()
    }

    /// True when no bucket holds any URL
    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }
}

// src/crawl/mod.rs
// =============================================================================
// This module owns the crawl itself.
//
// Submodules:
// - scope: decides which discovered links belong to the crawl
// - frontier: the depth-bucketed set of URLs still to visit
// - orchestrator: drives depth levels to completion and assembles results
//
// This file holds the two types that cross the module boundary: the
// immutable request that describes a run, and the per-page result.
// =============================================================================

mod frontier;
mod orchestrator;
mod scope;

pub use orchestrator::crawl;
pub use scope::Scope;

use serde::Serialize;
use std::time::Duration;

/// Everything that describes one crawl run; immutable once crawling starts
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    /// Seed URL the crawl starts from
    pub url: String,
    /// How many link hops below the seed to follow (0 = seed only)
    pub depth: usize,
    /// Maximum simultaneous page fetches (also the render pool size)
    pub concurrency: usize,
    /// Scope for discovered links; defaults to the seed URL
    pub scope_url: Option<String>,
    /// Per-fetch navigation timeout
    pub timeout: Duration,
    /// Salvage partially loaded pages just before the timeout
    pub force: bool,
}

/// One successfully crawled page
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    /// Canonical URL of the page
    pub url: String,
    /// Title reported by content extraction
    pub title: String,
    /// The page's readable content as Markdown
    pub markdown: String,
}

// src/error.rs
// =============================================================================
// Error taxonomy for the crawler.
//
// Three failure classes with very different blast radii:
// - InvalidScope: the scope (or seed) URL is unusable. Fatal, and surfaced
//   before any fetch happens.
// - Navigation: one page's fetch failed (timeout, network error, bad status).
//   Recovered locally - that URL yields no result, the crawl continues.
// - Structural: pool or backend setup/teardown failed. Fatal to the whole run.
//
// "Page had no extractable content" is deliberately NOT in this enum - it is
// a normal outcome, modeled as Option::None by the extract module.
//
// Rust concepts:
// - thiserror: derives std::error::Error and Display from attributes
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    /// The scope URL (or the seed it defaults to) is malformed or has no host
    #[error("invalid scope URL '{url}': {reason}")]
    InvalidScope { url: String, reason: String },

    /// A single page fetch failed; the crawl recovers and moves on
    #[error("navigation failed for {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// Pool or render backend setup/teardown failed; aborts the whole run
    #[error("structural failure: {0}")]
    Structural(String),
}

impl CrawlError {
    /// Shorthand for a per-URL navigation failure
    pub fn navigation(url: impl Into<String>, reason: impl ToString) -> Self {
        CrawlError::Navigation {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for an invalid scope/seed URL
    pub fn invalid_scope(url: impl Into<String>, reason: impl ToString) -> Self {
        CrawlError::InvalidScope {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

// src/render/mod.rs
// =============================================================================
// This module owns everything about fetching raw page markup.
//
// Submodules:
// - pool: leases a fixed number of render handles to concurrent tasks
// - fetch: the bounded-patience fetch protocol (timeout + force mode)
// - http: the default backend, a plain HTTP client on reqwest
//
// The backend is behind a pair of traits so the crawl orchestrator never
// knows (or cares) whether markup comes from an HTTP GET or a headless
// browser. A handle is one reusable fetch-capable context: navigate() loads
// a URL into it, current_markup() reads whatever the handle holds right now
// (possibly a partially loaded page), close() tears it down.
//
// Rust concepts:
// - async_trait: async methods in object-safe traits
// - Box<dyn Trait>: backend chosen at runtime, mocked in tests
// =============================================================================

mod fetch;
mod http;
mod pool;

pub use fetch::fetch_page;
pub use http::HttpBackend;
pub use pool::RenderPool;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CrawlError;

/// Produces render handles; one backend serves a whole crawl run
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Creates one fetch-capable handle
    ///
    /// Handles are expensive by assumption, so the pool creates them once
    /// up front and reuses them across every fetch of the run.
    async fn new_handle(&self) -> Result<Box<dyn RenderHandle>, CrawlError>;
}

/// One reusable fetch-capable execution context
#[async_trait]
pub trait RenderHandle: Send {
    /// Navigates the handle to a URL, waiting for the page to load
    ///
    /// Must complete (or fail) within `timeout`. Callable again on the same
    /// handle after a previous fetch.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), CrawlError>;

    /// Returns the markup the handle currently holds
    ///
    /// During an interrupted navigation this is whatever has loaded so far,
    /// which is exactly what force mode salvages.
    async fn current_markup(&mut self) -> Result<String, CrawlError>;

    /// Releases any resources owned by the handle
    async fn close(&mut self) -> Result<(), CrawlError>;
}

// -----------------------------------------------------------------------------
// Test backend
//
// A scripted in-memory site: URL -> markup, plus knobs for latency, pages
// that never finish loading, and gauges that record how often and how
// concurrently pages were fetched. Shared by the pool, fetch, and
// orchestrator tests.
// -----------------------------------------------------------------------------
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    pub struct MockSite {
        pages: HashMap<String, String>,
        /// Markup available part-way through loading, keyed by URL
        partial: HashMap<String, String>,
        /// URLs whose navigation never completes
        hanging: HashSet<String>,
        /// Artificial per-fetch latency
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        fetches: Mutex<HashMap<String, usize>>,
    }

    impl MockSite {
        pub fn new() -> MockSite {
            MockSite::default()
        }

        pub fn page(mut self, url: &str, markup: &str) -> Self {
            self.pages.insert(url.to_string(), markup.to_string());
            self
        }

        /// A page whose navigation never finishes; `partial` is what
        /// current_markup() sees while it hangs
        pub fn hanging_page(mut self, url: &str, partial: &str) -> Self {
            self.hanging.insert(url.to_string());
            self.partial.insert(url.to_string(), partial.to_string());
            self
        }

        pub fn delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn backend(self) -> MockBackend {
            MockBackend {
                site: Arc::new(self),
            }
        }

        pub fn fetch_count(&self, url: &str) -> usize {
            *self.fetches.lock().unwrap().get(url).unwrap_or(&0)
        }

        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[derive(Clone)]
    pub struct MockBackend {
        site: Arc<MockSite>,
    }

    impl MockBackend {
        pub fn site(&self) -> Arc<MockSite> {
            Arc::clone(&self.site)
        }
    }

    #[async_trait]
    impl RenderBackend for MockBackend {
        async fn new_handle(&self) -> Result<Box<dyn RenderHandle>, CrawlError> {
            Ok(Box::new(MockHandle {
                site: Arc::clone(&self.site),
                markup: String::new(),
            }))
        }
    }

    pub struct MockHandle {
        site: Arc<MockSite>,
        markup: String,
    }

    // Decrements the in-flight gauge even when the navigation future is
    // cancelled mid-await (force mode does exactly that)
    struct InFlightGuard<'a>(&'a AtomicUsize);

    impl Drop for InFlightGuard<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl RenderHandle for MockHandle {
        async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), CrawlError> {
            *self
                .site
                .fetches
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_insert(0) += 1;

            let current = self.site.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.site.max_in_flight.fetch_max(current, Ordering::SeqCst);
            let _guard = InFlightGuard(&self.site.in_flight);

            if self.site.hanging.contains(url) {
                // Expose the partially loaded markup, then load forever
                self.markup = self
                    .site
                    .partial
                    .get(url)
                    .cloned()
                    .unwrap_or_default();
                // Honors the timeout contract even though the page never loads
                let _ = tokio::time::timeout(timeout, std::future::pending::<()>()).await;
                return Err(CrawlError::navigation(url, "navigation timed out"));
            }

            let load = async {
                if !self.site.delay.is_zero() {
                    tokio::time::sleep(self.site.delay).await;
                }
                match self.site.pages.get(url) {
                    Some(markup) => {
                        self.markup = markup.clone();
                        Ok(())
                    }
                    None => Err(CrawlError::navigation(url, "no such page")),
                }
            };

            match tokio::time::timeout(timeout, load).await {
                Ok(result) => result,
                Err(_) => Err(CrawlError::navigation(url, "navigation timed out")),
            }
        }

        async fn current_markup(&mut self) -> Result<String, CrawlError> {
            Ok(self.markup.clone())
        }

        async fn close(&mut self) -> Result<(), CrawlError> {
            Ok(())
        }
    }
}

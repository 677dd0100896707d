// src/render/http.rs
// =============================================================================
// The default render backend: a plain HTTP client.
//
// "Navigation" here is an HTTP GET. The body is streamed chunk by chunk into
// the handle's buffer rather than read in one call, which is what makes
// force mode meaningful on this backend: when the salvage timer cancels a
// navigation mid-download, the buffer holds every chunk received so far -
// genuinely partial markup, not nothing.
//
// One reqwest Client is shared by every handle (it is internally
// reference-counted and pools connections); the per-handle state is just
// the markup buffer.
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{RenderBackend, RenderHandle};
use crate::error::CrawlError;

pub struct HttpBackend {
    client: Client,
}

impl HttpBackend {
    /// Builds the shared HTTP client; failure here is structural
    pub fn new() -> Result<HttpBackend, CrawlError> {
        let client = Client::builder()
            .user_agent(concat!("crawldown/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CrawlError::Structural(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpBackend { client })
    }
}

#[async_trait]
impl RenderBackend for HttpBackend {
    async fn new_handle(&self) -> Result<Box<dyn RenderHandle>, CrawlError> {
        Ok(Box::new(HttpHandle {
            client: self.client.clone(),
            markup: String::new(),
        }))
    }
}

struct HttpHandle {
    client: Client,
    /// Markup accumulated by the most recent navigation (complete or not)
    markup: String,
}

#[async_trait]
impl RenderHandle for HttpHandle {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), CrawlError> {
        // A new navigation owns the buffer; stale markup from the previous
        // fetch must not masquerade as this page's content
        self.markup.clear();

        let client = self.client.clone();
        let markup = &mut self.markup;

        let load = async move {
            let response = client
                .get(url)
                .send()
                .await
                .map_err(|e| CrawlError::navigation(url, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(CrawlError::navigation(url, format!("HTTP {status}")));
            }

            // Stream the body so a cancelled navigation leaves partial
            // markup behind for force mode to salvage
            let mut response = response;
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| CrawlError::navigation(url, e))?
            {
                markup.push_str(&String::from_utf8_lossy(&chunk));
            }

            Ok(())
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
        // Nothing to tear down: the client is shared and closes with the run
        Ok(())
    }
}

// src/crawl/orchestrator.rs
// =============================================================================
// The orchestrator drives one crawl run from seed to finished result list.
//
// The traversal is breadth-first over depth levels: starting at the request
// depth, every URL queued at the current level is dispatched with bounded
// concurrency, the level is joined (every fetch resolved - success, skip, or
// failure), discovered links are queued one level down, and only then does
// the next level begin. Within a level fetches complete in whatever order
// the network decides; across levels the ordering is strict.
//
// All mutable run state - the visited set, the frontier, the result list -
// is owned right here and mutated by this single writer. The fan-out tasks
// share nothing: each one returns a value describing what it found, and the
// orchestrator folds those values back in between levels. Marking a whole
// level visited BEFORE dispatching it is what makes the check-then-insert
// atomic: no two tasks can ever race on the same URL.
//
// Failure policy:
// - a bad scope or seed URL fails the run before any fetch
// - pool construction failure fails the run (structural)
// - anything that goes wrong for ONE page - navigation, extraction,
//   conversion - is logged and costs exactly that page, never the run
// =============================================================================

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use super::frontier::Frontier;
use super::scope::{self, Scope};
use super::{CrawlRequest, CrawlResult};
use crate::error::CrawlError;
use crate::extract;
use crate::render::{fetch_page, RenderBackend, RenderPool};

/// Crawls a website per the request, returning results in completion order
/// within each depth level
///
/// The render pool is built from `backend` and closed again before this
/// returns, on success and failure alike. The backend itself outlives the
/// run and stays the caller's responsibility.
pub async fn crawl(
    request: &CrawlRequest,
    backend: Arc<dyn RenderBackend>,
) -> Result<Vec<CrawlResult>, CrawlError> {
    // Validate scope and seed before acquiring anything
    let scope_raw = request.scope_url.as_deref().unwrap_or(&request.url);
    let scope = Scope::parse(scope_raw)?;
    let seed = scope::canonicalize(&request.url)?;

    let pool = RenderPool::new(backend.as_ref(), request.concurrency).await?;

    let outcome = run_levels(request, &scope, seed, &pool).await;

    // Close handles on every path; a teardown failure only surfaces when
    // the run itself succeeded
    match (outcome, pool.close().await) {
        (Ok(results), Ok(())) => Ok(results),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(run_err), close_outcome) => {
            if let Err(close_err) = close_outcome {
                warn!(error = %close_err, "render pool teardown failed");
            }
            Err(run_err)
        }
    }
}

async fn run_levels(
    request: &CrawlRequest,
    scope: &Scope,
    seed: String,
    pool: &RenderPool,
) -> Result<Vec<CrawlResult>, CrawlError> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut frontier = Frontier::new();
    let mut results = Vec::new();

    frontier.push(request.depth, seed);

    let mut depth = request.depth;
    loop {
        // Dispatch-time visited marking: the whole level is claimed before
        // any of it is fetched, so the same URL can never be in flight twice
        let batch: Vec<String> = frontier
            .take_level(depth)
            .into_iter()
            .filter(|url| visited.insert(url.clone()))
            .collect();

        if !batch.is_empty() {
            info!(depth, pages = batch.len(), "crawling level");
        }

        // Depth 0 pages are crawl leaves: fetched and extracted, but their
        // links are not harvested
        let harvest_links = depth > 0;

        let visits: Vec<PageVisit> = stream::iter(
            batch
                .into_iter()
                .map(|url| visit_page(pool, request, scope, url, harvest_links)),
        )
        .buffer_unordered(request.concurrency)
        .collect()
        .await;

        // Single-writer fold: results in completion order, new links one
        // level down (the frontier drops anything already queued)
        for visit in visits {
            if let Some(result) = visit.result {
                results.push(result);
            }
            for link in visit.links {
                if !visited.contains(&link) {
                    frontier.push(depth - 1, link);
                }
            }
        }

        // Done when the last level has run, or when no page anywhere
        // discovered anything new
        if depth == 0 || frontier.is_empty() {
            break;
        }
        depth -= 1;
    }

    Ok(results)
}

/// What one dispatched URL produced
struct PageVisit {
    result: Option<CrawlResult>,
    links: Vec<String>,
}

impl PageVisit {
    fn nothing() -> PageVisit {
        PageVisit {
            result: None,
            links: Vec::new(),
        }
    }
}

// Fetches, extracts, and converts one page. Every failure in here is
// per-URL: log it, return nothing, let the level carry on.
async fn visit_page(
    pool: &RenderPool,
    request: &CrawlRequest,
    scope: &Scope,
    url: String,
    harvest_links: bool,
) -> PageVisit {
    debug!(%url, "fetching page");

    // Lease a handle for the duration of the fetch only; the lease drops
    // (and the handle returns to the pool) before extraction starts
    let markup = {
        let mut lease = pool.lease().await;
        match fetch_page(lease.handle_mut(), &url, request.timeout, request.force).await {
            Ok(markup) => markup,
            Err(e) => {
                warn!(%url, error = %e, "fetch failed, skipping page");
                return PageVisit::nothing();
            }
        }
    };

    // The canonical URL always parses; it was built by the scope filter
    let page_url = match Url::parse(&url) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(%url, error = %e, "unparseable page URL, skipping page");
            return PageVisit::nothing();
        }
    };

    // No extractable content is a normal outcome: no result, and - by
    // design - no link harvesting either
    let article = match extract::extract_article(&markup, &page_url) {
        Some(article) => article,
        None => {
            debug!(%url, "no extractable content, skipping page");
            return PageVisit::nothing();
        }
    };

    let markdown = match extract::to_markdown(&article.content) {
        Ok(markdown) => markdown,
        Err(e) => {
            warn!(%url, error = %e, "markdown conversion failed, skipping page");
            return PageVisit::nothing();
        }
    };

    // Links come from the RAW markup, not the extracted article: navigation
    // menus are exactly where same-site links live
    let links = if harvest_links {
        scope.filter_links(&markup)
    } else {
        Vec::new()
    };

    PageVisit {
        result: Some(CrawlResult {
            url,
            title: article.title,
            markdown,
        }),
        links,
    }
}

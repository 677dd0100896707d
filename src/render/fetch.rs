// src/render/fetch.rs
// =============================================================================
// The bounded-patience fetch protocol.
//
// Normal mode: navigate, bounded by the timeout, then read the markup.
// A timeout is a failure.
//
// Force mode: availability over completeness. Two operations race:
//   (a) the normal navigate-then-capture path
//   (b) a salvage timer armed at (timeout - 1s)
// Whichever resolves FIRST wins - this is a race, not a fallback chain. If
// the timer fires while the page is still loading, we capture whatever
// markup the handle holds at that moment and call it a result. A slow page
// yields best-effort content instead of nothing.
//
// The 1s margin exists so the capture happens strictly before the outer
// timeout would cancel the navigation out from under us - racing the
// harness's own cancellation could discard markup that was actually there.
//
// Even a navigation *error* gets one salvage attempt in force mode: a direct
// markup read. Only when that also fails does the fetch fail.
// =============================================================================

use std::time::Duration;
use tracing::debug;

use super::RenderHandle;
use crate::error::CrawlError;

/// How long before the navigation timeout force mode salvages the page
const FORCE_SAFETY_MARGIN_MS: u64 = 1000;

/// Fetches one page's raw markup through a leased render handle
pub async fn fetch_page(
    handle: &mut dyn RenderHandle,
    url: &str,
    timeout: Duration,
    force: bool,
) -> Result<String, CrawlError> {
    if !force {
        handle.navigate(url, timeout).await?;
        return handle.current_markup().await;
    }

    let salvage_after = timeout.saturating_sub(Duration::from_millis(FORCE_SAFETY_MARGIN_MS));

    // select! drops the losing branch, so a navigation still in flight when
    // the timer fires is cancelled - its partial markup stays on the handle.
    // The navigation outcome is carried out of the select so the handle can
    // be borrowed again below.
    let navigation = tokio::select! {
        outcome = handle.navigate(url, timeout) => Some(outcome),
        _ = tokio::time::sleep(salvage_after) => None,
    };

    match navigation {
        // Page loaded in time: the normal capture path won the race
        Some(Ok(())) => handle.current_markup().await,
        // Navigation itself failed: one direct read may still salvage
        // whatever the handle holds
        Some(Err(e)) => {
            debug!(url, error = %e, "navigation failed, attempting salvage read");
            let markup = handle.current_markup().await.map_err(|read_err| {
                CrawlError::navigation(
                    url,
                    format!("navigation failed ({e}) and salvage read failed ({read_err})"),
                )
            })?;
            Ok(markup)
        }
        // The salvage timer won: take the in-progress page as-is
        None => {
            debug!(url, "salvage timer fired before navigation finished");
            handle.current_markup().await
        }
    }
}

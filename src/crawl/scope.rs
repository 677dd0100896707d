// src/crawl/scope.rs
// =============================================================================
// This module decides which discovered links belong to the crawl.
//
// A "scope" is a host plus a path prefix. A link is in scope when it points
// at the same host and its path is the scope path or a descendant of it.
// The prefix match is segment-aware: scope /docs matches /docs and /docs/a
// but NOT /docs-extra, which merely shares a string prefix.
//
// Canonical form of a URL, used everywhere URLs are compared or stored:
// - scheme forced to https (we do not distinguish plain vs. secure transport
//   for scoping purposes)
// - fragment and query dropped
// - trailing slash stripped
//
// One deliberate quirk: relative links are resolved against the SCOPE path
// treated as a directory, not against the page they were found on. A crawl
// scoped to https://example.com/docs resolves href="child" to
// https://example.com/docs/child no matter which page linked it.
//
// Rust concepts:
// - scraper::Html + Selector: CSS-selector access to parsed HTML
// - url::Url: parsing, joining, and mutating URLs safely
// =============================================================================

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::error::CrawlError;

// The parsed, validated crawl scope
//
// Built once per run, before any fetch happens - an unusable scope URL is a
// hard error, not something to discover three levels deep into a crawl.
#[derive(Debug, Clone)]
pub struct Scope {
    /// Host every in-scope URL must match exactly
    host: String,
    /// Path segments of the scope root (empty means "whole host")
    segments: Vec<String>,
    /// Scope URL with a trailing slash, used as the join base for
    /// relative links
    join_base: Url,
}

impl Scope {
    /// Parses and validates a scope URL
    ///
    /// Fails with CrawlError::InvalidScope if the URL cannot be parsed,
    /// is not http(s), or has no host.
    pub fn parse(raw: &str) -> Result<Scope, CrawlError> {
        let mut url =
            Url::parse(raw.trim()).map_err(|e| CrawlError::invalid_scope(raw, e))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(CrawlError::invalid_scope(
                raw,
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        let host = url
            .host_str()
            .ok_or_else(|| CrawlError::invalid_scope(raw, "URL has no host"))?
            .to_string();

        // Normalize the scope itself the same way links are normalized
        url.set_fragment(None);
        url.set_query(None);
        // set_scheme only fails for special-scheme changes; http -> https is fine
        let _ = url.set_scheme("https");

        let segments: Vec<String> = url
            .path_segments()
            .map(|parts| parts.filter(|s| !s.is_empty()).map(str::to_string).collect())
            .unwrap_or_default();

        // Give the join base a trailing slash so Url::join treats the scope
        // path as a directory: "/docs" + "child" must yield "/docs/child",
        // not "/child"
        let mut join_base = url.clone();
        if !join_base.path().ends_with('/') {
            let dir = format!("{}/", join_base.path());
            join_base.set_path(&dir);
        }

        Ok(Scope {
            host,
            segments,
            join_base,
        })
    }

    /// Extracts every in-scope hyperlink from a page's markup
    ///
    /// Returns canonical URLs, deduplicated, in order of first appearance.
    /// Malformed individual hrefs are skipped silently - one broken link
    /// never sinks the batch.
    pub fn filter_links(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        // A hardcoded selector can only fail to parse if we typo it
        let selector = Selector::parse("a[href]").unwrap();

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(&selector) {
            let href = match element.value().attr("href") {
                Some(href) => href.trim(),
                None => continue,
            };

            // Skip empty hrefs, same-page anchors, and non-navigational schemes
            if href.is_empty()
                || href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
            {
                continue;
            }

            // Resolve relative to the scope directory, not the current page
            let resolved = match self.join_base.join(href) {
                Ok(url) => url,
                Err(_) => continue,
            };

            let canonical = match canonical_url(resolved) {
                Some(url) => url,
                None => continue,
            };

            if !self.contains(&canonical) {
                continue;
            }

            let canonical = canonical_string(&canonical);
            if seen.insert(canonical.clone()) {
                links.push(canonical);
            }
        }

        links
    }

    /// True when the URL's host matches and its path sits at or below the
    /// scope root, compared segment by segment
    fn contains(&self, url: &Url) -> bool {
        if url.host_str() != Some(self.host.as_str()) {
            return false;
        }

        let mut candidate = url
            .path_segments()
            .map(|parts| parts.filter(|s| !s.is_empty()))
            .into_iter()
            .flatten();

        self.segments
            .iter()
            .all(|scope_segment| candidate.next() == Some(scope_segment.as_str()))
    }
}

/// Canonicalizes a URL string; used for the seed before it enters the frontier
///
/// Idempotent: canonicalizing an already-canonical URL returns it unchanged.
pub fn canonicalize(raw: &str) -> Result<String, CrawlError> {
    let url = Url::parse(raw.trim()).map_err(|e| CrawlError::invalid_scope(raw, e))?;

    if url.host_str().is_none() {
        return Err(CrawlError::invalid_scope(raw, "URL has no host"));
    }

    let url = canonical_url(url)
        .ok_or_else(|| CrawlError::invalid_scope(raw, "URL cannot be made canonical"))?;

    Ok(canonical_string(&url))
}

// Applies the canonical-form rules that operate on the parsed URL:
// https scheme, no fragment, no query. Returns None for URLs whose scheme
// cannot be rewritten (e.g. ftp:), which are never crawlable anyway.
fn canonical_url(mut url: Url) -> Option<Url> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    url.set_query(None);
    let _ = url.set_scheme("https");
    Some(url)
}

// Renders the canonical string form: no trailing path separator
fn canonical_string(url: &Url) -> String {
    url.as_str().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(raw: &str) -> Scope {
        Scope::parse(raw).unwrap()
    }

    #[test]
    fn extracts_basic_links() {
        let html = r#"
            <a href="/docs/other">Other</a>
            <a href="https://example.com/docs/another">Another</a>
        "#;
        assert_eq!(
            scope("https://example.com/docs").filter_links(html),
            vec![
                "https://example.com/docs/other",
                "https://example.com/docs/another",
            ]
        );
    }

    #[test]
    fn ignores_non_navigational_links() {
        let html = r##"
            <a href="javascript:void(0)">JS Link</a>
            <a href="mailto:test@example.com">Email</a>
            <a href="tel:123456789">Phone</a>
            <a href="#section">Anchor</a>
            <a href="">Empty</a>
            <a href="  ">Whitespace</a>
        "##;
        assert!(scope("https://example.com/docs").filter_links(html).is_empty());
    }

    #[test]
    fn resolves_relative_paths_against_scope() {
        let html = r#"
            <a href="../parent">Parent</a>
            <a href="./child">Child</a>
            <a href="sibling">Sibling</a>
        "#;
        // ../parent escapes the scope and is dropped; the others resolve
        // against the scope path as a directory
        assert_eq!(
            scope("https://example.com/docs").filter_links(html),
            vec![
                "https://example.com/docs/child",
                "https://example.com/docs/sibling",
            ]
        );
    }

    #[test]
    fn filters_out_foreign_hosts() {
        let html = r#"
            <a href="https://external.com/page">External</a>
            <a href="https://example.com/docs/internal">Internal</a>
        "#;
        assert_eq!(
            scope("https://example.com/docs").filter_links(html),
            vec!["https://example.com/docs/internal"]
        );
    }

    #[test]
    fn sibling_path_prefix_is_out_of_scope() {
        // /docs-extra shares a string prefix with /docs but is a different
        // path segment, so it must not match
        let html = r#"
            <a href="https://example.com/docs/a">In</a>
            <a href="https://example.com/docs-extra">Out</a>
        "#;
        assert_eq!(
            scope("https://example.com/docs").filter_links(html),
            vec!["https://example.com/docs/a"]
        );
    }

    #[test]
    fn normalizes_scheme_and_deduplicates() {
        let html = r#"
            <a href="http://example.com/docs/page">HTTP</a>
            <a href="https://example.com/docs/page">HTTPS</a>
            <a href="/docs/page">Relative</a>
        "#;
        assert_eq!(
            scope("https://example.com/docs").filter_links(html),
            vec!["https://example.com/docs/page"]
        );
    }

    #[test]
    fn strips_fragments_queries_and_trailing_slashes() {
        let html = r#"
            <a href="/docs/page/">Trailing</a>
            <a href="/docs/page?tab=1">Query</a>
            <a href="/docs/page#section">Fragment</a>
        "#;
        assert_eq!(
            scope("https://example.com/docs").filter_links(html),
            vec!["https://example.com/docs/page"]
        );
    }

    #[test]
    fn host_root_scope_accepts_whole_host() {
        let html = r#"<a href="/anywhere/at/all">Deep</a>"#;
        assert_eq!(
            scope("https://example.com").filter_links(html),
            vec!["https://example.com/anywhere/at/all"]
        );
    }

    #[test]
    fn invalid_scope_is_an_error() {
        assert!(matches!(
            Scope::parse("not a url"),
            Err(CrawlError::InvalidScope { .. })
        ));
        assert!(matches!(
            Scope::parse("mailto:someone@example.com"),
            Err(CrawlError::InvalidScope { .. })
        ));
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let once = canonicalize("http://example.com/docs/page/?q=1#frag").unwrap();
        assert_eq!(once, "https://example.com/docs/page");
        assert_eq!(canonicalize(&once).unwrap(), once);
    }

    #[test]
    fn canonicalize_rejects_hostless_urls() {
        assert!(canonicalize("relative/path").is_err());
    }
}

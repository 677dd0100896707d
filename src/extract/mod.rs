// src/extract/mod.rs
// =============================================================================
// Content extraction and Markdown conversion - the two pure transformations
// between "raw page markup" and "portable text".
//
// Extraction uses the `readability` crate (a port of Mozilla's Readability
// heuristic): given a whole page, it strips navigation, ads, and chrome, and
// returns the title plus the article body. Pages with no recognizable
// article - link hubs, empty shells, error pages - come back as None. That
// is a normal outcome, not an error: the crawler skips them silently.
//
// Conversion uses `htmd` to turn the extracted body HTML into Markdown.
// =============================================================================

use htmd::HtmlToMarkdown;
use tracing::debug;
use url::Url;

/// The readable content pulled out of one page
#[derive(Debug, Clone)]
pub struct Article {
    /// Best-effort page title
    pub title: String,
    /// Cleaned article body, still HTML
    pub content: String,
}

/// Extracts the primary readable content from raw page markup
///
/// Returns None when the page has no extractable article. `page_url` anchors
/// relative references inside the extracted content.
pub fn extract_article(markup: &str, page_url: &Url) -> Option<Article> {
    let product = match readability::extractor::extract(&mut markup.as_bytes(), page_url) {
        Ok(product) => product,
        Err(e) => {
            debug!(url = %page_url, error = %e, "extraction failed, treating as no content");
            return None;
        }
    };

    // An "article" with no text is no article at all
    if product.text.trim().is_empty() {
        return None;
    }

    Some(Article {
        title: product.title,
        content: product.content,
    })
}

/// Converts extracted body HTML into Markdown
pub fn to_markdown(content: &str) -> anyhow::Result<String> {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style"])
        .build();

    converter
        .convert(content)
        .map_err(|e| anyhow::anyhow!("markdown conversion failed: {e}"))
}

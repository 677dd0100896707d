// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Build the crawl request and the HTTP render backend
// 3. Run the crawl (all the interesting work lives in src/crawl/)
// 4. Write the results: one Markdown file per page, a single concatenated
//    file, or JSON on stdout
// 5. Exit with proper code (0 = success, 1 = error)
//
// The render backend's lifecycle is owned here: it is created before the
// crawl and dropped after, whether the crawl succeeded or not. The crawl
// itself guarantees its pooled handles are closed internally.
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli; // src/cli.rs - command-line parsing
mod crawl; // src/crawl/ - scope filter, frontier, orchestrator
mod error; // src/error.rs - error taxonomy
mod extract; // src/extract/ - readability extraction + Markdown conversion
mod render; // src/render/ - render backend, handle pool, fetch protocol

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use url::Url;

use cli::Cli;
use crawl::{CrawlRequest, CrawlResult};
use render::HttpBackend;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still wins when set; --verbose turns on debug logging for
    // the crawl internals
    let default_filter = if cli.verbose { "crawldown=debug" } else { "crawldown=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let request = CrawlRequest {
        url: cli.url,
        depth: cli.depth,
        concurrency: cli.concurrency as usize,
        scope_url: cli.scope_url,
        timeout: Duration::from_millis(cli.timeout),
        force: cli.force,
    };

    println!("🔍 Crawling: {}", request.url);
    println!("📊 Depth: {}, concurrency: {}", request.depth, request.concurrency);

    let backend = HttpBackend::new()?;
    let results = crawl::crawl(&request, Arc::new(backend)).await?;

    println!("📄 Crawled {} page(s)", results.len());

    if cli.json {
        // Machine-readable mode: everything on stdout, nothing on disk
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if cli.single_file {
        // If output ends with .md, use it directly, otherwise append .md
        let output_file = if cli.output.ends_with(".md") {
            cli.output.clone()
        } else {
            format!("{}.md", cli.output)
        };
        write_single_file(Path::new(&output_file), &results).await?;
        return Ok(());
    }

    write_page_files(Path::new(&cli.output), &results).await
}

// Writes one Markdown file per crawled page under the output directory,
// mirroring the site's host and path structure
async fn write_page_files(output_dir: &Path, results: &[CrawlResult]) -> Result<()> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;

    for result in results {
        // One unwritable page shouldn't abandon the rest of the output
        if let Err(e) = write_page_file(output_dir, result).await {
            eprintln!("Failed to write file for {}: {e:#}", result.url);
        }
    }

    Ok(())
}

async fn write_page_file(output_dir: &Path, result: &CrawlResult) -> Result<()> {
    let (dir_path, file_name) = page_output_path(output_dir, &result.url)?;

    tokio::fs::create_dir_all(&dir_path)
        .await
        .with_context(|| format!("failed to create {}", dir_path.display()))?;

    let file_path = dir_path.join(file_name);
    tokio::fs::write(&file_path, frontmatter_document(result))
        .await
        .with_context(|| format!("failed to write {}", file_path.display()))?;

    println!("✅ Written: {}", file_path.display());
    Ok(())
}

// Maps a page URL to (directory, file name) under the output root:
// host/path with special characters flattened to underscores, and the
// host root landing in host/index.md
fn page_output_path(output_dir: &Path, url: &str) -> Result<(PathBuf, String)> {
    let parsed = Url::parse(url).with_context(|| format!("unparseable result URL {url}"))?;
    let host = parsed
        .host_str()
        .with_context(|| format!("result URL {url} has no host"))?;

    let sanitized: String = parsed
        .path()
        .trim_matches('/')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '/' { c } else { '_' })
        .collect();

    if sanitized.is_empty() {
        return Ok((output_dir.join(host), "index.md".to_string()));
    }

    let mut parts: Vec<&str> = sanitized.split('/').collect();
    // split on a non-empty string always yields at least one part
    let file_name = format!("{}.md", parts.pop().unwrap());
    let mut dir_path = output_dir.join(host);
    for part in parts {
        dir_path.push(part);
    }

    Ok((dir_path, file_name))
}

// A page document: minimal frontmatter, then the Markdown body.
// The title is JSON-quoted so embedded quotes and colons stay valid.
fn frontmatter_document(result: &CrawlResult) -> String {
    let quoted_title =
        serde_json::to_string(&result.title).unwrap_or_else(|_| "\"\"".to_string());

    format!(
        "---\ntitle: {}\nurl: {}\n---\n\n{}",
        quoted_title, result.url, result.markdown
    )
}

// Concatenates every result into one Markdown file
async fn write_single_file(path: &Path, results: &[CrawlResult]) -> Result<()> {
    let content: String = results
        .iter()
        .map(|result| {
            format!(
                "# {}\n\nSource: {}\n\n{}\n\n---\n\n",
                result.title, result.url, result.markdown
            )
        })
        .collect();

    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("✅ Written all content to: {}", path.display());
    Ok(())
}

// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// crawldown takes a single positional URL plus flags - no subcommands -
// so the whole interface is one Parser struct.
// =============================================================================

use clap::Parser;

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug)]
#[command(
    name = "crawldown",
    version = "0.1.0",
    about = "Crawl websites and convert their content into clean, readable Markdown",
    long_about = "crawldown crawls a website from a seed URL, extracts the primary readable \
                  content of each page with a Readability-style heuristic, converts it to \
                  Markdown, and follows same-scope links up to a bounded depth."
)]
pub struct Cli {
    /// URL to start crawling from (e.g., https://example.com/docs)
    ///
    /// This is a positional argument (required, no flag needed)
    pub url: String,

    /// Number of levels to crawl below the seed
    ///
    /// Depth 0 = just the seed page, depth 1 = seed + pages it links to, etc.
    #[arg(short, long, default_value_t = 1)]
    pub depth: usize,

    /// Number of concurrent page fetches
    ///
    /// This is also the size of the render handle pool, so it is a hard
    /// upper bound on in-flight fetches. Must be at least 1.
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub concurrency: u64,

    /// URL that defines the crawling scope
    ///
    /// Links outside this scope (different host, or a path that is not the
    /// scope path or a descendant of it) are ignored. Defaults to the seed URL.
    #[arg(long)]
    pub scope_url: Option<String>,

    /// Navigation timeout in milliseconds
    #[arg(short, long, default_value_t = 60_000)]
    pub timeout: u64,

    /// Force scraping content even if a page hasn't fully loaded,
    /// 1 second before the timeout
    #[arg(short, long, default_value_t = false)]
    pub force: bool,

    /// Output directory (or file name with --single-file)
    #[arg(short, long, default_value = "output")]
    pub output: String,

    /// Output all results to a single markdown file
    #[arg(long, default_value_t = false)]
    pub single_file: bool,

    /// Print results as JSON to stdout instead of writing files
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Verbose logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

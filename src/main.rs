//! # Scripture Scrape
//!
//! Scrapes chapter-per-page religious-text websites and reassembles each one
//! into a single Markdown book.
//!
//! ## Features
//!
//! - Six built-in sites (十二篮, 马太福音查经记录, 教会的事务, Augustine's
//!   Tractates on John, 歌中之歌, 聖經 文理和合), each a declarative site
//!   configuration over one shared extraction engine
//! - Declared per-site character encodings (GB18030 or UTF-8), never sniffed
//! - Optional bounded concurrency that keeps output byte-identical to a
//!   sequential run
//! - A `clean` subcommand for post-processing stray characters
//!
//! ## Usage
//!
//! ```sh
//! scripture_scrape scrape song-of-songs
//! scripture_scrape clean 歌中之歌.md --inplace
//! ```
//!
//! ## Architecture
//!
//! 1. **Indexing**: read the site's table of contents into ordered entries
//! 2. **Fetching**: download each page behind a shared politeness gate
//! 3. **Extraction**: turn each page's content node into Markdown blocks
//! 4. **Output**: write the assembled Markdown book and, optionally, JSON

use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod clean;
mod cli;
mod config;
mod error;
mod extract;
mod fetcher;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cli::{CleanArgs, Cli, Command, ScrapeArgs};
use config::load_settings;
use error::CleanError;
use fetcher::{HttpFetcher, encoding_for};
use outputs::{json, markdown};
use scrapers::SiteKind;
use utils::ensure_parent_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    match args.command {
        Command::Scrape(args) => scrape(args).await,
        Command::Clean(args) => {
            if let Err(e) = clean_file(args).await {
                error!(error = %e, "Cleanup failed");
                eprintln!("{e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Sites => {
            list_sites();
            Ok(())
        }
    }
}

async fn scrape(args: ScrapeArgs) -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    let settings = load_settings(args.config.as_deref())?;

    let mut site = args.site.site();
    if let Some(label) = args.encoding.as_deref() {
        site.encoding = encoding_for(label)?;
        info!(encoding = site.encoding.name(), "Overriding site encoding");
    }
    let politeness = settings.politeness.unwrap_or(site.politeness);
    let concurrency = args.concurrency.map(usize::from).unwrap_or(settings.concurrency).max(1);
    let output = args.output.unwrap_or_else(|| PathBuf::from(site.output_file));
    info!(
        site = site.key,
        output = %output.display(),
        concurrency,
        min_delay_ms = politeness.min_ms,
        max_delay_ms = politeness.max_ms,
        "Starting scrape"
    );

    let fetcher = HttpFetcher::new(&settings, politeness)?;
    let document = scrapers::run(args.site, &site, &fetcher, concurrency, args.limit).await?;

    let md = markdown::render(&document, &site.layout);
    ensure_parent_dir(&output).await?;
    tokio::fs::write(&output, md).await?;
    info!(path = %output.display(), "Wrote Markdown");

    if let Some(path) = args.json.as_deref() {
        json::write_document(&document, path).await?;
    }

    let missing = document.missing_count();
    if missing > 0 {
        warn!(missing, total = document.sections.len(), "Some sections have no content");
    }
    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Execution complete");
    Ok(())
}

async fn clean_file(args: CleanArgs) -> Result<(), CleanError> {
    let target = match (args.inplace, args.output) {
        (true, _) => clean::Target::InPlace,
        (false, Some(path)) => clean::Target::File(path),
        (false, None) => clean::Target::Stdout,
    };
    let outcome = clean::run(&args.input, target).await?;
    match outcome {
        clean::Outcome::Printed(text) => print!("{text}"),
        other => {
            if let Some(message) = other.message() {
                println!("{message}");
            }
        }
    }
    Ok(())
}

fn list_sites() {
    for kind in SiteKind::ALL {
        let site = kind.site();
        println!("{:<16} {:<32} {}", site.key, site.title, site.output_file);
    }
}

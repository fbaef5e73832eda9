//! Command-line interface definitions.
//!
//! Three subcommands: `scrape` runs one site end to end, `clean` post-processes
//! a generated Markdown file, `sites` lists the known site keys.

use crate::scrapers::SiteKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Scrape religious-text websites into Markdown.
///
/// # Examples
///
/// ```sh
/// # Fetch 十二篮 into its default output file
/// scripture_scrape scrape twelve-baskets
///
/// # Spot-check the first three chapters, four fetches at a time
/// scripture_scrape scrape church-affairs --limit 3 --concurrency 4 -o /tmp/check.md
///
/// # Clean a generated file in place
/// scripture_scrape clean 十二篮.md --inplace
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape one site into a Markdown document
    Scrape(ScrapeArgs),
    /// Replace and delete stray characters in a Markdown file
    Clean(CleanArgs),
    /// List the known sites
    Sites,
}

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Site to scrape
    #[arg(value_enum)]
    pub site: SiteKind,

    /// Markdown output file (default: the site's own file name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the assembled document as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Optional path to a settings YAML file
    #[arg(short, long, env = "SCRIPTURE_SCRAPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Pages fetched at a time (overrides the settings file)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: Option<u16>,

    /// Only process the first N index entries
    #[arg(long)]
    pub limit: Option<usize>,

    /// Decode pages with this encoding label instead of the site's (e.g. gbk)
    #[arg(long)]
    pub encoding: Option<String>,
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Input Markdown file
    pub input: PathBuf,

    /// Output file (default: stdout unless --inplace)
    #[arg(short, long, conflicts_with = "inplace")]
    pub output: Option<PathBuf>,

    /// Overwrite the input (creates <input>.bak)
    #[arg(long)]
    pub inplace: bool,
}

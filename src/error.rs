//! Error types for fetching pages and cleaning files.
//!
//! Page-level errors ([`FetchError`]) are always recovered by the scrape
//! pipeline: the page is replaced by a placeholder and the run continues.
//! Settings ([`ConfigError`]) and cleanup ([`CleanError`]) errors are fatal
//! and surface as a non-zero exit.

use std::path::PathBuf;
use thiserror::Error;

/// A failure to fetch or decode a single page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("unknown character encoding label {0:?}")]
    UnknownEncoding(String),
    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// A settings file that cannot be read or parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read settings file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// A fatal failure of the `clean` subcommand.
#[derive(Debug, Error)]
pub enum CleanError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("{} is not valid UTF-8: {source}", .path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

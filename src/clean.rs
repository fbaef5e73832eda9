//! Character cleanup for generated Markdown.
//!
//! Scraped GB18030 pages carry box-drawing dashes, vertical-form quotation
//! marks, private-use glyphs and stray control characters. Cleanup runs two
//! passes over the text:
//!
//! 1. ordered literal replacements ([`REPLACEMENTS`])
//! 2. deletion of everything [`DELETE`] matches
//!
//! Replacement comes first so `U+2500` becomes a dash before the deletion
//! pass can treat it as a stray symbol.

use crate::error::CleanError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Literal replacements, applied in this order.
pub const REPLACEMENTS: [(&str, &str); 4] = [
    ("\u{2500}", "——"),
    ("——声", ""),
    ("﹃", "『"),
    ("﹄", "』"),
];

/// C0 controls except tab, newline and carriage return; DEL; the Private Use
/// Area; the Geometric Shapes block.
static DELETE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]|[\u{E000}-\u{F8FF}]|[\u{25A0}-\u{25FF}]")
        .expect("valid delete regex")
});

pub fn clean_text(text: &str) -> String {
    let replaced = REPLACEMENTS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to));
    DELETE.replace_all(&replaced, "").into_owned()
}

/// Where cleaned text goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Stdout,
    File(PathBuf),
    /// Overwrite the input after copying it to `<input>.bak`.
    InPlace,
}

/// What a cleanup run did, for the closing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The cleaned text, for the caller to print.
    Printed(String),
    Wrote(PathBuf),
    Replaced { path: PathBuf, backup: PathBuf },
}

impl Outcome {
    pub fn message(&self) -> Option<String> {
        match self {
            Outcome::Printed(_) => None,
            Outcome::Wrote(path) => Some(format!("Done. Wrote: {}", path.display())),
            Outcome::Replaced { path, backup } => Some(format!(
                "Done. In-place cleaned: {} (backup: {})",
                file_name(path),
                file_name(backup)
            )),
        }
    }
}

/// `notes.md` → `notes.md.bak`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Read `input` as strict UTF-8, clean it, and deliver it to `target`.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub async fn run(input: &Path, target: Target) -> Result<Outcome, CleanError> {
    if !fs::try_exists(input).await.unwrap_or(false) {
        return Err(CleanError::NotFound(input.to_path_buf()));
    }
    let bytes = fs::read(input).await.map_err(|source| io_error(input, source))?;
    let text = String::from_utf8(bytes).map_err(|source| CleanError::Encoding {
        path: input.to_path_buf(),
        source,
    })?;

    let cleaned = clean_text(&text);
    info!(
        before = text.chars().count(),
        after = cleaned.chars().count(),
        "Cleaned text"
    );

    match target {
        Target::Stdout => Ok(Outcome::Printed(cleaned)),
        Target::File(path) => {
            fs::write(&path, cleaned).await.map_err(|source| io_error(&path, source))?;
            Ok(Outcome::Wrote(path))
        }
        Target::InPlace => {
            let backup = backup_path(input);
            fs::copy(input, &backup).await.map_err(|source| io_error(&backup, source))?;
            fs::write(input, cleaned).await.map_err(|source| io_error(input, source))?;
            Ok(Outcome::Replaced {
                path: input.to_path_buf(),
                backup,
            })
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> CleanError {
    CleanError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

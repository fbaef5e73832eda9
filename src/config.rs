//! Runtime settings for the HTTP side of a scrape.
//!
//! Settings come from three layers, later ones winning:
//! 1. Built-in defaults ([`Settings::default`]) and each site's own politeness delay
//! 2. An optional YAML file passed with `--config`
//! 3. Command-line flags
//!
//! ```yaml
//! user_agent: "Mozilla/5.0 ..."
//! accept_language: "zh-CN,zh;q=0.9,en;q=0.8"
//! timeout_secs: 25
//! politeness:
//!   min_ms: 500
//!   max_ms: 1500
//! concurrency: 1
//! ```

use crate::error::ConfigError;
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Browser user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Pause between two requests, drawn uniformly from `min_ms..=max_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Politeness {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Politeness {
    pub const fn between(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn fixed(ms: u64) -> Self {
        Self::between(ms, ms)
    }

    /// Draw one delay. A reversed range is treated as fixed at `min_ms`.
    pub fn sample(&self) -> Duration {
        let ms = if self.max_ms > self.min_ms {
            rng().random_range(self.min_ms..=self.max_ms)
        } else {
            self.min_ms
        };
        Duration::from_millis(ms)
    }
}

/// HTTP and scheduling settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub user_agent: String,
    pub accept_language: Option<String>,
    pub timeout_secs: u64,
    /// Overrides the site's own politeness delay when set.
    pub politeness: Option<Politeness>,
    /// Number of pages fetched at once; 1 keeps the run strictly sequential.
    pub concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: Some("zh-CN,zh;q=0.9,en;q=0.8".to_string()),
            timeout_secs: 25,
            politeness: None,
            concurrency: 1,
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Load settings from `path`, or the defaults when no path is given.
#[instrument(level = "info")]
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = parse_settings(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "Loaded settings");
    Ok(settings)
}

fn parse_settings(raw: &str) -> Result<Settings, serde_yaml::Error> {
    if raw.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(raw)
}

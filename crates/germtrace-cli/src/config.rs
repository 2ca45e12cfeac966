//! # CLI Configuration
//!
//! Optional YAML file named by `--config`. Every key has a default, so the
//! CLI runs without a file; unknown keys are rejected to catch typos.
//!
//! ```yaml
//! ledger_path: /var/lib/germtrace/ledger.json
//! log_format: json
//! log_level: info
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default ledger document, relative to the working directory.
pub const DEFAULT_LEDGER_PATH: &str = "germtrace-ledger.json";

/// Log line format on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Settings loaded from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CliConfig {
    /// File-backed ledger document.
    pub ledger_path: PathBuf,
    pub log_format: LogFormat,
    /// `EnvFilter` directive used when no `-v` flag is given.
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
            log_format: LogFormat::Pretty,
            log_level: "warn".to_string(),
        }
    }
}

impl CliConfig {
    /// Load `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("parsing config: {}", path.display()))
    }

    /// Parse a YAML document. An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Filter directive for a `-v` count; zero falls back to `log_level`.
    pub fn filter_directive(&self, verbose: u8) -> &str {
        match verbose {
            0 => &self.log_level,
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

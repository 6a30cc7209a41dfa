use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ChromeDumpError, Result};

/// Project-level configuration, loaded from `.chromedump.toml`.
///
/// Every field has a sensible default so chromedump works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Browser whose secret store is consulted when `--browser` is not
    /// given (e.g. "chrome").
    #[serde(default = "default_browser")]
    pub default_browser: String,

    /// Emit a row-progress event every this many rows.
    #[serde(default = "default_row_progress_interval")]
    pub row_progress_interval: u64,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_browser() -> String {
    "chrome".to_string()
}

fn default_row_progress_interval() -> u64 {
    100
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_browser: default_browser(),
            row_progress_interval: default_row_progress_interval(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the working directory.
    const FILE_NAME: &'static str = ".chromedump.toml";

    /// Load settings from `<dir>/.chromedump.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            ChromeDumpError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;
pub mod progress;

use std::path::{Path, PathBuf};

use chrono::Local;
use clap::Parser;

use crate::config::Settings;
use crate::errors::Result;
use crate::keysource::Browser;

/// chromedump CLI: decrypt Chromium SQLite databases to JSON.
#[derive(Parser)]
#[command(
    name = "chromedump",
    about = "Chromium SQLite database decryptor and JSON exporter",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Browser whose secret store holds the master key
    #[arg(short, long, global = true)]
    pub browser: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Decrypt a database and export every table to JSON
    Dump {
        /// Path to the SQLite database (e.g. Chrome's Cookies file)
        database: PathBuf,

        /// Output directory (default: dump_<name>_<timestamp> in the
        /// working directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Explicit master key, base64-encoded (skips the OS secret store)
        #[arg(long, value_name = "BASE64")]
        master_key: Option<String>,

        /// Only export tables whose name matches this regex
        #[arg(long, value_name = "REGEX")]
        tables: Option<String>,

        /// Write into an existing output directory without asking
        #[arg(short, long)]
        force: bool,
    },

    /// List the tables in a database with row counts
    Tables {
        /// Path to the SQLite database
        database: PathBuf,
    },

    /// Check whether a master key can be recovered on this machine
    Key,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Default output directory for a database:
/// `dump_<stem>_<YYYYMMDD_HHMMSS>` in the current working directory.
pub fn default_output_dir(db_path: &Path) -> PathBuf {
    let stem = db_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "db".to_string());
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("dump_{stem}_{timestamp}"))
}

/// Resolve the browser to target: `--browser` flag first, then the
/// config file's default.
pub fn resolve_browser(cli: &Cli, settings: &Settings) -> Result<Browser> {
    let name = cli.browser.as_deref().unwrap_or(&settings.default_browser);
    Browser::from_name(name)
}

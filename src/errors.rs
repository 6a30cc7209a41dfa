use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in chromedump.
///
/// Only run-level failures ever reach the caller: per-cell decryption
/// failures are absorbed by the codec, and per-table failures are
/// converted into `TableFailed` events by the exporter.
#[derive(Debug, Error)]
pub enum ChromeDumpError {
    // --- Key retrieval ---
    #[error("Key retrieval failed: {0}")]
    KeySource(String),

    // --- Database ---
    #[error("Database not found at {0}")]
    DatabaseNotFound(PathBuf),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Schema error: {0}")]
    Schema(String),

    // --- Output ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

/// Convenience type alias for chromedump results.
pub type Result<T> = std::result::Result<T, ChromeDumpError>;

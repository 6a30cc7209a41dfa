//! Structured export events.
//!
//! The core never prints. Everything observable about a run flows
//! through [`ExportEvent`] values handed to an [`EventSink`], so the
//! CLI, tests, or any other caller can render, record, or drop them.

use std::path::PathBuf;

/// One observable step of an export run.
#[derive(Debug, Clone)]
pub enum ExportEvent {
    /// Master key retrieval failed; binary cells will fall back to
    /// best-effort decoding for the rest of the run.
    KeyUnavailable { source: String, reason: String },

    /// A table is about to be processed.
    TableStarted { table: String },

    /// Row-level progress inside a table. Emitted once with
    /// `processed == 0` when the row count is known, then at the
    /// configured interval.
    RowProgress {
        table: String,
        processed: u64,
        total: u64,
    },

    /// A table was exported to `file`.
    TableSucceeded {
        table: String,
        rows: u64,
        file: PathBuf,
    },

    /// A table failed and was skipped; the run continues.
    TableFailed { table: String, reason: String },

    /// The run is complete.
    Summary(ExportSummary),
}

/// Final accounting for a run.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub output_dir: PathBuf,
}

/// Receives events from the exporter.
///
/// Any `FnMut(&ExportEvent)` closure is a sink.
pub trait EventSink {
    fn emit(&mut self, event: &ExportEvent);
}

impl<F: FnMut(&ExportEvent)> EventSink for F {
    fn emit(&mut self, event: &ExportEvent) {
        self(event)
    }
}

/// Sink that discards everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &ExportEvent) {}
}

//! `chromedump dump` — decrypt a database and export each table to JSON.
//!
//! The core exporter yields a progress percentage per table and
//! reports everything else through events; this command renders both.

use std::path::Path;

use dialoguer::Confirm;
use regex::Regex;

use crate::cli::{default_output_dir, output, progress, resolve_browser, Cli};
use crate::config::Settings;
use crate::errors::{ChromeDumpError, Result};
use crate::export::{ExportEvent, Exporter};
use crate::keysource::{self, KeySource, StaticKeySource};

/// Execute the `dump` command.
pub fn execute(
    cli: &Cli,
    database: &Path,
    output_dir: Option<&Path>,
    master_key: Option<&str>,
    tables: Option<&str>,
    force: bool,
) -> Result<()> {
    let settings = Settings::load(&std::env::current_dir()?)?;

    let out_dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_output_dir(database),
    };

    // Unless --force is set, ask before writing into a non-empty directory.
    if !force && dir_is_non_empty(&out_dir) {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Output directory {} is not empty — write into it?",
                out_dir.display()
            ))
            .default(false)
            .interact()
            .map_err(|e| ChromeDumpError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let source: Box<dyn KeySource> = match master_key {
        Some(encoded) => Box::new(StaticKeySource::new(encoded)),
        None => keysource::platform_source(resolve_browser(cli, &settings)?),
    };

    let filter = tables
        .map(Regex::new)
        .transpose()
        .map_err(|e| ChromeDumpError::CommandFailed(format!("invalid --tables pattern: {e}")))?;

    let mut exporter = Exporter::new(source.as_ref(), Box::new(render_event))
        .with_row_progress_interval(settings.row_progress_interval);
    if let Some(filter) = filter {
        exporter = exporter.with_table_filter(filter);
    }

    let mut run = exporter.export(database, &out_dir)?;
    output::info(&format!(
        "Exporting {} table(s) from {}",
        run.table_count(),
        database.display()
    ));

    let pb = progress::export_progress_bar("exporting");
    for percent in &mut run {
        pb.set_position(percent.round() as u64);
    }
    progress::finish_with_success(&pb, "done");

    output::print_results_table(run.results());
    if let Some(summary) = run.summary() {
        if summary.failed == 0 {
            output::success(&format!(
                "Exported {} table(s) to {}",
                summary.succeeded,
                summary.output_dir.display()
            ));
        } else {
            output::warning(&format!(
                "Exported {} of {} table(s) ({} failed) to {}",
                summary.succeeded,
                summary.total,
                summary.failed,
                summary.output_dir.display()
            ));
        }
    }

    Ok(())
}

/// Render a core event as terminal output.
fn render_event(event: &ExportEvent) {
    match event {
        ExportEvent::KeyUnavailable { source, reason } => {
            output::warning(&format!("Could not get master key from {source}: {reason}"));
            output::tip("Encrypted cells will be exported with best-effort decoding.");
        }
        ExportEvent::TableStarted { table } => {
            output::info(&format!("Processing table {table}"));
        }
        ExportEvent::RowProgress {
            table,
            processed: 0,
            total,
        } => {
            output::info(&format!("{table}: {total} row(s)"));
        }
        ExportEvent::RowProgress {
            table,
            processed,
            total,
        } => {
            output::info(&format!("{table}: {processed}/{total} rows"));
        }
        ExportEvent::TableSucceeded { rows, file, .. } => {
            output::success(&format!("Saved {rows} row(s) to {}", file.display()));
        }
        ExportEvent::TableFailed { table, reason } => {
            output::error(&format!("Table {table} failed: {reason}"));
            output::info("Continuing with next table...");
        }
        ExportEvent::Summary(_) => {}
    }
}

fn dir_is_non_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

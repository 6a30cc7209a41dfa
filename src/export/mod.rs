//! Table walker and JSON exporter.
//!
//! Enumerates a database's tables, normalizes every cell through the
//! codec, and writes one pretty-printed JSON file per table. The walk
//! is lazy: [`ExportRun`] yields a progress percentage after each
//! table and suspends until the caller pulls again. A table's failure
//! is absorbed into a `TableFailed` event and never stops the run.

pub mod events;

pub use events::{EventSink, ExportEvent, ExportSummary, NullSink};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use regex::Regex;
use rusqlite::{Connection, OpenFlags};
use serde_json::{Map, Value};

use crate::codec;
use crate::errors::{ChromeDumpError, Result};
use crate::keysource::{KeySource, MasterKey};

/// Outcome of one table.
#[derive(Debug, Clone)]
pub struct TableResult {
    pub table: String,
    pub rows: u64,
    pub error: Option<String>,
}

impl TableResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Walks a database and exports every table to JSON.
///
/// The master key is fetched once at construction and cached for the
/// exporter's lifetime; a fresh run needs a fresh exporter.
pub struct Exporter {
    key: Option<MasterKey>,
    sink: Box<dyn EventSink>,
    table_filter: Option<Regex>,
    row_progress_interval: u64,
}

impl Exporter {
    /// Build an exporter, fetching the master key from `source`.
    ///
    /// Key retrieval failure is reported as a `KeyUnavailable` event,
    /// not an error: the run proceeds with pass-through decoding of
    /// encrypted cells.
    pub fn new(source: &dyn KeySource, mut sink: Box<dyn EventSink>) -> Self {
        let key = match source.fetch() {
            Ok(key) => Some(key),
            Err(e) => {
                sink.emit(&ExportEvent::KeyUnavailable {
                    source: source.describe(),
                    reason: e.to_string(),
                });
                None
            }
        };

        Self {
            key,
            sink,
            table_filter: None,
            row_progress_interval: 100,
        }
    }

    /// Only export tables whose name matches `filter`.
    pub fn with_table_filter(mut self, filter: Regex) -> Self {
        self.table_filter = Some(filter);
        self
    }

    /// Emit a `RowProgress` event every `interval` rows (default 100).
    pub fn with_row_progress_interval(mut self, interval: u64) -> Self {
        self.row_progress_interval = interval.max(1);
        self
    }

    /// True if a master key was recovered.
    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// Open `db_path` read-only, enumerate its tables, and prepare the
    /// output directory.
    ///
    /// Errors here are run-level: nothing has been exported yet.
    pub fn export(&mut self, db_path: &Path, output_dir: &Path) -> Result<ExportRun<'_>> {
        if !db_path.exists() {
            return Err(ChromeDumpError::DatabaseNotFound(db_path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let mut tables = list_tables(&conn)?;
        if let Some(filter) = &self.table_filter {
            tables.retain(|table| filter.is_match(table));
        }

        std::fs::create_dir_all(output_dir)?;

        Ok(ExportRun {
            exporter: self,
            conn,
            tables,
            output_dir: output_dir.to_path_buf(),
            next_index: 0,
            results: Vec::new(),
            summary: None,
        })
    }
}

/// A lazy export in progress: one table per `next()` call.
///
/// Yields the percentage of tables attempted so far, in [0, 100].
/// Dropping the run early closes the database connection.
pub struct ExportRun<'a> {
    exporter: &'a mut Exporter,
    conn: Connection,
    tables: Vec<String>,
    output_dir: PathBuf,
    next_index: usize,
    results: Vec<TableResult>,
    summary: Option<ExportSummary>,
}

impl ExportRun<'_> {
    /// Number of tables this run will attempt.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Per-table outcomes recorded so far.
    pub fn results(&self) -> &[TableResult] {
        &self.results
    }

    /// Final accounting; `None` until the run is exhausted.
    pub fn summary(&self) -> Option<&ExportSummary> {
        self.summary.as_ref()
    }

    /// Export one table: schema, rows, JSON file.
    fn process_table(&mut self, table: &str) -> Result<u64> {
        let columns = table_columns(&self.conn, table)?;

        let total = table_row_count(&self.conn, table)?;
        self.exporter.sink.emit(&ExportEvent::RowProgress {
            table: table.to_string(),
            processed: 0,
            total,
        });

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {}", quote_ident(table)))?;
        let mut rows = stmt.query([])?;

        let mut records: Vec<Value> = Vec::new();
        let mut processed: u64 = 0;
        while let Some(row) = rows.next()? {
            let mut record = Map::with_capacity(columns.len());
            for (idx, column) in columns.iter().enumerate() {
                let cell = row.get_ref(idx)?;
                record.insert(
                    column.name.clone(),
                    codec::normalize(cell, &column.declared_type, self.exporter.key.as_ref()),
                );
            }
            records.push(Value::Object(record));

            processed += 1;
            if processed % self.exporter.row_progress_interval == 0 {
                self.exporter.sink.emit(&ExportEvent::RowProgress {
                    table: table.to_string(),
                    processed,
                    total,
                });
            }
        }

        let file = self.output_dir.join(format!("{table}.json"));
        let mut writer = BufWriter::new(File::create(&file)?);
        serde_json::to_writer_pretty(&mut writer, &records)
            .map_err(|e| ChromeDumpError::Serialization(format!("{table}: {e}")))?;
        writer.flush()?;

        Ok(processed)
    }

    fn finish(&mut self) {
        let succeeded = self.results.iter().filter(|r| r.succeeded()).count();
        let summary = ExportSummary {
            total: self.tables.len(),
            succeeded,
            failed: self.tables.len() - succeeded,
            output_dir: self.output_dir.clone(),
        };
        self.exporter.sink.emit(&ExportEvent::Summary(summary.clone()));
        self.summary = Some(summary);
    }
}

impl Iterator for ExportRun<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.next_index >= self.tables.len() {
            if self.summary.is_none() {
                self.finish();
            }
            return None;
        }

        let table = self.tables[self.next_index].clone();
        self.next_index += 1;

        self.exporter.sink.emit(&ExportEvent::TableStarted {
            table: table.clone(),
        });

        match self.process_table(&table) {
            Ok(rows) => {
                self.exporter.sink.emit(&ExportEvent::TableSucceeded {
                    table: table.clone(),
                    rows,
                    file: self.output_dir.join(format!("{table}.json")),
                });
                self.results.push(TableResult {
                    table,
                    rows,
                    error: None,
                });
            }
            Err(e) => {
                self.exporter.sink.emit(&ExportEvent::TableFailed {
                    table: table.clone(),
                    reason: e.to_string(),
                });
                self.results.push(TableResult {
                    table,
                    rows: 0,
                    error: Some(e.to_string()),
                });
            }
        }

        let progress = self.next_index as f64 / self.tables.len() as f64 * 100.0;
        if self.next_index == self.tables.len() {
            self.finish();
        }
        Some(progress)
    }
}

/// One column of a table schema.
struct ColumnInfo {
    name: String,
    declared_type: String,
}

/// Tables in catalog order.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Row count of one table.
pub fn table_row_count(conn: &Connection, table: &str) -> Result<u64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
        [],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}

/// Column names and declared types, in schema order.
fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                declared_type: row.get::<_, String>(2)?.to_lowercase(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if columns.is_empty() {
        return Err(ChromeDumpError::Schema(format!(
            "no column info for table '{table}'"
        )));
    }
    Ok(columns)
}

/// Quote an identifier for embedding in SQL (doubles inner quotes).
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_ident_wraps_and_escapes() {
        assert_eq!(quote_ident("cookies"), "\"cookies\"");
        assert_eq!(quote_ident("weird\"name"), "\"weird\"\"name\"");
    }

    #[test]
    fn list_tables_reads_the_catalog() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE cookies (name TEXT);
             CREATE TABLE meta (key TEXT);
             CREATE VIEW v AS SELECT name FROM cookies;",
        )
        .unwrap();

        let tables = list_tables(&conn).unwrap();
        assert_eq!(tables, vec!["cookies".to_string(), "meta".to_string()]);
    }

    #[test]
    fn table_row_count_counts() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (x INTEGER);
             INSERT INTO t VALUES (1), (2), (3);",
        )
        .unwrap();

        assert_eq!(table_row_count(&conn, "t").unwrap(), 3);
    }

    #[test]
    fn table_columns_reads_names_and_types() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE cookies (name TEXT, value BLOB, expires_utc INTEGER);")
            .unwrap();

        let columns = table_columns(&conn, "cookies").unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let types: Vec<&str> = columns.iter().map(|c| c.declared_type.as_str()).collect();
        assert_eq!(names, vec!["name", "value", "expires_utc"]);
        assert_eq!(types, vec!["text", "blob", "integer"]);
    }

    #[test]
    fn table_columns_errors_on_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(table_columns(&conn, "nope").is_err());
    }
}

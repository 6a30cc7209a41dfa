//! `chromedump tables` — list a database's tables without exporting.

use std::path::Path;

use comfy_table::{ContentArrangement, Table};
use rusqlite::{Connection, OpenFlags};

use crate::cli::output;
use crate::errors::{ChromeDumpError, Result};
use crate::export::{list_tables, table_row_count};

/// Execute the `tables` command.
pub fn execute(database: &Path) -> Result<()> {
    if !database.exists() {
        return Err(ChromeDumpError::DatabaseNotFound(database.to_path_buf()));
    }

    let conn = Connection::open_with_flags(
        database,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    let tables = list_tables(&conn)?;
    if tables.is_empty() {
        output::info("No tables in this database.");
        return Ok(());
    }

    let mut listing = Table::new();
    listing.set_content_arrangement(ContentArrangement::Dynamic);
    listing.set_header(vec!["Table", "Rows"]);

    for name in &tables {
        // A count failure for one table should not hide the others.
        let rows = match table_row_count(&conn, name) {
            Ok(count) => count.to_string(),
            Err(_) => "?".to_string(),
        };
        listing.add_row(vec![name.clone(), rows]);
    }

    println!("{listing}");
    output::info(&format!(
        "{} table(s) in {}",
        tables.len(),
        database.display()
    ));

    Ok(())
}

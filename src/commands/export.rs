// ABOUTME: Export command implementation - Write one table as keyed JSON
// ABOUTME: Reshapes pipe-delimited columns into arrays and reports row count and size

use crate::migration::{self, ExportOptions};
use crate::{sqlite, utils};
use anyhow::{Context, Result};
use std::path::Path;

/// Export `table` from the source database to a pretty-printed JSON file
///
/// The output is one object keyed by each row's identifier. Columns listed in
/// `options.array_columns` become string arrays.
///
/// # Errors
///
/// Returns an error if the source cannot be read, the identifier column is
/// missing, or the output cannot be written.
pub fn export(source: &Path, output: &Path, table: &str, options: &ExportOptions) -> Result<()> {
    tracing::info!("Starting JSON export of '{}'", table);

    let conn = sqlite::open_read_only(source).context("Failed to connect to source database")?;
    let summary = migration::export_to_file(&conn, table, output, options)?;
    let size = utils::file_size(output)?;

    if summary.keys != summary.rows {
        tracing::warn!(
            "⚠ {} rows collapsed into {} keys (duplicate '{}' values)",
            summary.rows,
            summary.keys,
            options.id_column
        );
    }

    println!(
        "✅ Exported {} repositories to {}",
        summary.rows,
        output.display()
    );
    println!("📦 File size: {}", utils::format_kibibytes(size));

    Ok(())
}

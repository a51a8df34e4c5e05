// ABOUTME: Logical dump of a SQLite database to SQL text
// ABOUTME: Emits schema and row statements that rebuild the database when replayed

use crate::sqlite::{list_schema_objects, quote_identifier, table_columns};
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Counters reported after a dump
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpStats {
    pub tables: usize,
    pub rows: usize,
    pub statements: usize,
}

/// Write a logical dump of the whole database to `writer`
///
/// Output order:
/// 1. `BEGIN TRANSACTION;`
/// 2. per table (by name): its `CREATE` statement, then one `INSERT` per row;
///    `sqlite_sequence` is reset and refilled after the other tables
/// 3. indexes, triggers and views
/// 4. `COMMIT;`
///
/// Row values are rendered by SQLite's `quote()`, so NULLs, reals, text and
/// blobs replay exactly. Each statement ends with a newline.
pub fn write_dump<W: Write>(conn: &Connection, writer: &mut W) -> Result<DumpStats> {
    let mut stats = DumpStats::default();

    emit(writer, "BEGIN TRANSACTION;", &mut stats)?;

    // sqlite_sequence refers to AUTOINCREMENT tables, so it is replayed after them
    let mut tables = list_schema_objects(conn, &["table"])?;
    tables.sort_by_key(|table| table.name == "sqlite_sequence");

    for table in tables {
        match table.name.as_str() {
            "sqlite_sequence" => {
                emit(writer, "DELETE FROM \"sqlite_sequence\";", &mut stats)?;
            }
            "sqlite_stat1" => {
                emit(writer, "ANALYZE \"sqlite_master\";", &mut stats)?;
            }
            name if name.starts_with("sqlite_") => {
                tracing::debug!("Skipping internal table '{}'", name);
                continue;
            }
            _ => {
                emit(writer, &format!("{};", table.sql), &mut stats)?;
                stats.tables += 1;
            }
        }

        let query = insert_query(conn, &table.name)?;
        let mut stmt = conn
            .prepare(&query)
            .with_context(|| format!("Failed to prepare dump query for '{}'", table.name))?;
        let mut rows = stmt
            .query([])
            .with_context(|| format!("Failed to read rows from '{}'", table.name))?;

        let mut table_rows = 0usize;
        while let Some(row) = rows
            .next()
            .with_context(|| format!("Failed to read rows from '{}'", table.name))?
        {
            let insert: String = row.get(0)?;
            emit(writer, &format!("{};", insert), &mut stats)?;
            table_rows += 1;
        }

        tracing::debug!("Dumped {} rows from '{}'", table_rows, table.name);
        stats.rows += table_rows;
    }

    for object in list_schema_objects(conn, &["index", "trigger", "view"])? {
        emit(writer, &format!("{};", object.sql), &mut stats)?;
    }

    emit(writer, "COMMIT;", &mut stats)?;
    writer.flush().context("Failed to flush dump output")?;

    Ok(stats)
}

fn emit<W: Write>(writer: &mut W, statement: &str, stats: &mut DumpStats) -> Result<()> {
    writeln!(writer, "{}", statement).context("Failed to write dump statement")?;
    stats.statements += 1;
    Ok(())
}

/// Dump the database to a file, replacing any existing file
pub fn dump_to_file(conn: &Connection, output_path: &Path) -> Result<DumpStats> {
    tracing::info!("Dumping database to {}", output_path.display());

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create dump file {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    let stats = write_dump(conn, &mut writer)?;

    tracing::info!(
        "✓ Dumped {} tables ({} rows, {} statements)",
        stats.tables,
        stats.rows,
        stats.statements
    );
    Ok(stats)
}

/// Build a query returning one ready-made `INSERT INTO "t" VALUES(...)` per row
fn insert_query(conn: &Connection, table: &str) -> Result<String> {
    let columns = table_columns(conn, table)?;

    let values = columns
        .iter()
        .map(|col| format!("quote({})", quote_identifier(col)))
        .collect::<Vec<_>>()
        .join(" || ',' || ");

    // The quoted table name is embedded inside a string literal
    let literal_table = quote_identifier(table).replace('\'', "''");

    Ok(format!(
        "SELECT 'INSERT INTO {} VALUES(' || {} || ')' FROM {}",
        literal_table,
        values,
        quote_identifier(table)
    ))
}

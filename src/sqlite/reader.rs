// ABOUTME: Full-table reads from the source SQLite database
// ABOUTME: Loads every row of a table into memory with its column names

use super::quote_identifier;
use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::Connection;

/// All rows of one table, loaded in memory
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl TableData {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Read every row and column of a table
///
/// Rows come back in the table's natural (rowid) order.
pub fn read_table(conn: &Connection, table: &str) -> Result<TableData> {
    tracing::debug!("Reading all rows from '{}'", table);

    let query = format!("SELECT * FROM {}", quote_identifier(table));
    let mut stmt = conn
        .prepare(&query)
        .with_context(|| format!("Failed to prepare query for table '{}'", table))?;

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|idx| row.get::<_, Value>(idx))
                .collect::<rusqlite::Result<Vec<Value>>>()
        })
        .with_context(|| format!("Failed to query table '{}'", table))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("Failed to read rows from table '{}'", table))?;

    tracing::debug!("Read {} rows ({} columns) from '{}'", rows.len(), width, table);

    Ok(TableData {
        table: table.to_string(),
        columns,
        rows,
    })
}

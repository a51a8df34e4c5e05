// ABOUTME: Schema introspection for the source SQLite database
// ABOUTME: Lists tables, indexes, triggers and views recorded in sqlite_master

use anyhow::{Context, Result};
use rusqlite::Connection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaObject {
    pub name: String,
    /// `table`, `index`, `trigger` or `view`
    pub kind: String,
    pub sql: String,
}

impl SchemaObject {
    pub fn is_table(&self) -> bool {
        self.kind == "table"
    }
}

/// List schema objects of the given kinds that carry a `CREATE` statement
///
/// Objects without SQL (automatic indexes) are excluded. Results are ordered
/// by name.
pub fn list_schema_objects(conn: &Connection, kinds: &[&str]) -> Result<Vec<SchemaObject>> {
    let mut stmt = conn
        .prepare(
            "SELECT name, type, sql FROM sqlite_master \
             WHERE sql NOT NULL ORDER BY name",
        )
        .context("Failed to prepare sqlite_master query")?;

    let objects = stmt
        .query_map([], |row| {
            Ok(SchemaObject {
                name: row.get(0)?,
                kind: row.get(1)?,
                sql: row.get(2)?,
            })
        })
        .context("Failed to query sqlite_master")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read schema objects")?;

    Ok(objects
        .into_iter()
        .filter(|object| kinds.contains(&object.kind.as_str()))
        .collect())
}

/// Column names of a table, in declaration order
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
        .context("Failed to prepare table_info query")?;

    let columns = stmt
        .query_map([table], |row| row.get(0))
        .with_context(|| format!("Failed to get columns for table '{}'", table))?
        .collect::<rusqlite::Result<Vec<String>>>()
        .with_context(|| format!("Failed to read columns for table '{}'", table))?;

    if columns.is_empty() {
        anyhow::bail!("Table '{}' does not exist or has no columns", table);
    }

    Ok(columns)
}

// ABOUTME: Dump command implementation - Write the whole database as SQL text
// ABOUTME: Opens the source read-only, writes the logical dump and reports its size

use crate::{migration, sqlite, utils};
use anyhow::{Context, Result};
use std::path::Path;

/// Dump every table of the source database to an SQL file
///
/// The file replays into an empty database to rebuild schema and rows. On
/// failure a partially written file is left in place.
///
/// # Errors
///
/// Returns an error if the source cannot be opened or the dump cannot be written.
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use std::path::Path;
/// # use repodb_tools::commands::dump;
/// # fn example() -> Result<()> {
/// dump(
///     Path::new("server/db/repositories.db"),
///     Path::new("repositories_dump.sql"),
/// )?;
/// # Ok(())
/// # }
/// ```
pub fn dump(source: &Path, output: &Path) -> Result<()> {
    tracing::info!("Starting SQL dump of {}", source.display());

    let conn = sqlite::open_read_only(source).context("Failed to connect to source database")?;
    let stats = migration::dump_to_file(&conn, output)?;
    let size = utils::file_size(output)?;

    tracing::debug!("Dump wrote {} statements", stats.statements);

    println!("✅ SQL dump created: {}", output.display());
    println!("📦 File size: {}", utils::format_mebibytes(size));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_dump_command_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("repositories.db");
        let output = dir.path().join("repositories_dump.sql");
        Connection::open(&source)
            .unwrap()
            .execute_batch("CREATE TABLE repositories (id INTEGER); INSERT INTO repositories VALUES (1);")
            .unwrap();

        dump(&source, &output).unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.contains("INSERT INTO \"repositories\" VALUES(1);"));
    }

    #[test]
    fn test_dump_command_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let result = dump(&dir.path().join("nope.db"), &dir.path().join("out.sql"));
        assert!(result.is_err());
        assert!(!dir.path().join("out.sql").exists());
    }
}

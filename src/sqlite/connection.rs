// ABOUTME: SQLite connection utilities for the source database
// ABOUTME: Opens the database read-only and turns open failures into actionable errors

use anyhow::Result;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

/// Open the source database without write access
///
/// The database is never created: a missing file is an error rather than a
/// new empty database.
pub fn open_read_only(path: &Path) -> Result<Connection> {
    if !path.exists() {
        anyhow::bail!(
            "Database file does not exist: {}\n\
             Please check the --source path.",
            path.display()
        );
    }

    tracing::debug!("Opening {} read-only", path.display());

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| {
        let error_msg = e.to_string();

        if error_msg.contains("not a database") {
            anyhow::anyhow!(
                "File is not a SQLite database: {}\n\
                 Error: {}",
                path.display(),
                error_msg
            )
        } else if error_msg.contains("unable to open") {
            anyhow::anyhow!(
                "Unable to open database {}.\n\
                 Please check file permissions.\n\
                 Error: {}",
                path.display(),
                error_msg
            )
        } else {
            anyhow::anyhow!(
                "Failed to open database {}: {}",
                path.display(),
                error_msg
            )
        }
    })?;

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");

        let err = open_read_only(&path).unwrap_err().to_string();
        assert!(err.contains("does not exist"));
        assert!(!path.exists(), "read-only open must not create the file");
    }

    #[test]
    fn test_open_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE t (id INTEGER)")
            .unwrap();

        let conn = open_read_only(&path).unwrap();
        assert!(conn.execute("INSERT INTO t VALUES (1)", []).is_err());
    }

    #[test]
    fn test_open_non_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "this is not a database file at all, just some text").unwrap();

        // SQLite defers header validation until the first query
        let result = open_read_only(&path).and_then(|conn| {
            conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
                row.get::<_, i64>(0)
            })
            .map_err(anyhow::Error::from)
        });
        assert!(result.is_err());
    }
}

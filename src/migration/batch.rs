// ABOUTME: Batched upsert migration of one table through a SqlShell
// ABOUTME: Serializes rows into multi-row INSERT OR REPLACE statements and submits them in order

use super::shell::SqlShell;
use crate::sqlite::{quote_identifier, TableData};
use crate::utils::validate_table_name;
use anyhow::{bail, Result};
use rusqlite::types::Value;

/// Rows per submitted statement
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Encode one cell as a SQL literal
///
/// Values are trusted: they come from the source database we control, and the
/// destination only accepts SQL text, so no bound parameters are available.
/// Text gets its single quotes doubled and nothing else.
///
/// # Examples
///
/// ```
/// # use repodb_tools::migration::batch::encode_value;
/// # use rusqlite::types::Value;
/// assert_eq!(encode_value(&Value::Text("O'Brien".into())), "'O''Brien'");
/// assert_eq!(encode_value(&Value::Null), "NULL");
/// assert_eq!(encode_value(&Value::Integer(42)), "42");
/// ```
pub fn encode_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => encode_real(*f),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Blob(bytes) => format!("X'{}'", hex::encode_upper(bytes)),
    }
}

/// REAL literal; non-finite values use the same forms as SQLite's `quote()`
fn encode_real(f: f64) -> String {
    if f.is_nan() {
        "NULL".to_string()
    } else if f == f64::INFINITY {
        "9e999".to_string()
    } else if f == f64::NEG_INFINITY {
        "-9e999".to_string()
    } else {
        // Debug keeps a decimal point or exponent so the value stays REAL
        format!("{:?}", f)
    }
}

/// Build `INSERT OR REPLACE INTO <table> (<columns>) VALUES (...), (...);`
pub fn build_upsert(table: &str, columns: &[String], rows: &[Vec<Value>]) -> String {
    let values = rows
        .iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(encode_value).collect();
            format!("({})", cells.join(", "))
        })
        .collect::<Vec<_>>()
        .join(", ");

    let columns = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT OR REPLACE INTO {} ({}) VALUES {};",
        table, columns, values
    )
}

/// Number of batches needed for `rows` rows
pub fn batch_count(rows: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    rows.div_ceil(batch_size)
}

/// Progress after a batch has been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based number of the batch just applied
    pub batch: usize,
    pub batches: usize,
    pub processed: usize,
    pub total: usize,
}

impl BatchProgress {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.processed as f64 / self.total as f64 * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub batches: usize,
    pub rows: usize,
}

/// Submit every row of `data` in batches of `batch_size`
///
/// Batches go out strictly in order. The first batch the shell rejects stops
/// the migration: later batches are never submitted and already-applied
/// batches stay applied. `on_batch` runs after each successful batch.
pub fn migrate_rows<S, F>(
    shell: &mut S,
    data: &TableData,
    batch_size: usize,
    mut on_batch: F,
) -> Result<MigrationReport>
where
    S: SqlShell + ?Sized,
    F: FnMut(&BatchProgress),
{
    validate_table_name(&data.table)?;
    if batch_size == 0 {
        bail!("Batch size must be at least 1");
    }

    let total = data.row_count();
    let batches = batch_count(total, batch_size);
    let mut processed = 0;

    tracing::debug!(
        "Migrating {} rows from '{}' in {} batches of up to {}",
        total,
        data.table,
        batches,
        batch_size
    );

    for (idx, chunk) in data.rows.chunks(batch_size).enumerate() {
        let sql = build_upsert(&data.table, &data.columns, chunk);
        let output = shell.submit(&sql)?;

        if !output.success() {
            let detail = if output.stderr.trim().is_empty() {
                output.stdout.trim()
            } else {
                output.stderr.trim()
            };
            bail!(
                "Error executing batch {}/{} (exit code {}):\n{}",
                idx + 1,
                batches,
                output
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                detail
            );
        }

        processed += chunk.len();
        on_batch(&BatchProgress {
            batch: idx + 1,
            batches,
            processed,
            total,
        });
    }

    Ok(MigrationReport {
        batches,
        rows: processed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::shell::ShellOutput;

    /// Records statements; fails the call numbered `fail_on` (1-based)
    struct RecordingShell {
        statements: Vec<String>,
        fail_on: Option<usize>,
    }

    impl SqlShell for RecordingShell {
        fn submit(&mut self, sql: &str) -> Result<ShellOutput> {
            self.statements.push(sql.to_string());
            let failed = self.fail_on == Some(self.statements.len());
            Ok(ShellOutput {
                stdout: String::new(),
                stderr: if failed {
                    "SQLITE_CONSTRAINT".to_string()
                } else {
                    String::new()
                },
                exit_code: Some(if failed { 1 } else { 0 }),
            })
        }

        fn describe(&self) -> String {
            "recording".to_string()
        }
    }

    fn table(rows: usize) -> TableData {
        TableData {
            table: "repositories".to_string(),
            columns: vec!["id".to_string(), "description".to_string()],
            rows: (0..rows)
                .map(|i| vec![Value::Integer(i as i64), Value::Text(format!("repo {}", i))])
                .collect(),
        }
    }

    #[test]
    fn test_encode_value() {
        assert_eq!(encode_value(&Value::Text("O'Brien".into())), "'O''Brien'");
        assert_eq!(encode_value(&Value::Text("it''s".into())), "'it''''s'");
        assert_eq!(encode_value(&Value::Text("back\\slash\n".into())), "'back\\slash\n'");
        assert_eq!(encode_value(&Value::Null), "NULL");
        assert_eq!(encode_value(&Value::Integer(42)), "42");
        assert_eq!(encode_value(&Value::Integer(-7)), "-7");
        assert_eq!(encode_value(&Value::Real(3.0)), "3.0");
        assert_eq!(encode_value(&Value::Real(0.25)), "0.25");
        assert_eq!(encode_value(&Value::Blob(vec![0xde, 0xad])), "X'DEAD'");
    }

    #[test]
    fn test_build_upsert() {
        let sql = build_upsert(
            "repositories",
            &["id".to_string(), "description".to_string()],
            &[
                vec![Value::Integer(1), Value::Text("O'Brien".into())],
                vec![Value::Integer(2), Value::Null],
            ],
        );
        assert_eq!(
            sql,
            "INSERT OR REPLACE INTO repositories (\"id\", \"description\") \
             VALUES (1, 'O''Brien'), (2, NULL);"
        );
    }

    #[test]
    fn test_build_upsert_quotes_reserved_column_names() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"CREATE TABLE repositories (id INTEGER PRIMARY KEY, "order" INTEGER, "group" TEXT)"#,
        )
        .unwrap();

        let sql = build_upsert(
            "repositories",
            &["id".to_string(), "order".to_string(), "group".to_string()],
            &[vec![Value::Integer(1), Value::Integer(2), Value::Text("core".into())]],
        );
        conn.execute_batch(&sql).unwrap();

        let (order, group): (i64, String) = conn
            .query_row(r#"SELECT "order", "group" FROM repositories"#, [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!((order, group.as_str()), (2, "core"));
    }

    #[test]
    fn test_encode_non_finite_reals() {
        assert_eq!(encode_value(&Value::Real(f64::INFINITY)), "9e999");
        assert_eq!(encode_value(&Value::Real(f64::NEG_INFINITY)), "-9e999");
        assert_eq!(encode_value(&Value::Real(f64::NAN)), "NULL");

        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (x REAL)").unwrap();
        let sql = build_upsert(
            "t",
            &["x".to_string()],
            &[vec![Value::Real(f64::INFINITY)], vec![Value::Real(f64::NEG_INFINITY)]],
        );
        conn.execute_batch(&sql).unwrap();
        let values: Vec<f64> = conn
            .prepare("SELECT x FROM t ORDER BY rowid")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(values, vec![f64::INFINITY, f64::NEG_INFINITY]);
    }

    #[test]
    fn test_batch_count() {
        assert_eq!(batch_count(0, 100), 0);
        assert_eq!(batch_count(100, 100), 1);
        assert_eq!(batch_count(101, 100), 2);
        assert_eq!(batch_count(250, 100), 3);
    }

    #[test]
    fn test_migrate_250_rows_in_three_batches() {
        let data = table(250);
        let mut shell = RecordingShell {
            statements: Vec::new(),
            fail_on: None,
        };
        let mut seen = Vec::new();

        let report = migrate_rows(&mut shell, &data, 100, |p| seen.push(*p)).unwrap();

        assert_eq!(report, MigrationReport { batches: 3, rows: 250 });
        assert_eq!(shell.statements.len(), 3);
        let sizes: Vec<usize> = shell
            .statements
            .iter()
            .map(|sql| sql.matches("), (").count() + 1)
            .collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert!(shell.statements[2].contains("(249, 'repo 249');"));

        let processed: Vec<usize> = seen.iter().map(|p| p.processed).collect();
        assert_eq!(processed, vec![100, 200, 250]);
        assert_eq!(seen[2].batch, 3);
        assert!((seen[0].percentage() - 40.0).abs() < 1e-9);
        assert!((seen[2].percentage() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_migrate_stops_at_first_failed_batch() {
        let data = table(250);
        let mut shell = RecordingShell {
            statements: Vec::new(),
            fail_on: Some(2),
        };
        let mut progress_calls = 0;

        let err = migrate_rows(&mut shell, &data, 100, |_| progress_calls += 1).unwrap_err();

        assert_eq!(shell.statements.len(), 2, "batch 3 must not be submitted");
        assert_eq!(progress_calls, 1);
        let msg = err.to_string();
        assert!(msg.contains("batch 2/3"));
        assert!(msg.contains("SQLITE_CONSTRAINT"));
    }

    #[test]
    fn test_migrate_empty_table_submits_nothing() {
        let data = table(0);
        let mut shell = RecordingShell {
            statements: Vec::new(),
            fail_on: None,
        };
        let report = migrate_rows(&mut shell, &data, 100, |_| {}).unwrap();
        assert_eq!(report, MigrationReport { batches: 0, rows: 0 });
        assert!(shell.statements.is_empty());
    }

    #[test]
    fn test_migrate_rejects_bad_input() {
        let mut shell = RecordingShell {
            statements: Vec::new(),
            fail_on: None,
        };
        assert!(migrate_rows(&mut shell, &table(3), 0, |_| {}).is_err());

        let mut data = table(3);
        data.table = "repositories; DROP TABLE users".to_string();
        assert!(migrate_rows(&mut shell, &data, 100, |_| {}).is_err());
        assert!(shell.statements.is_empty());
    }
}

// ABOUTME: SQLite row to JSON conversion for the repository details export
// ABOUTME: Splits pipe-delimited columns into arrays and keys rows by identifier

use crate::sqlite::{read_table, TableData};
use anyhow::{bail, Context, Result};
use base64::Engine;
use rusqlite::types::Value;
use rusqlite::Connection;
use serde_json::{Map, Value as JsonValue};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Separator used inside multi-value text columns
pub const LIST_DELIMITER: char = '|';

/// How rows are reshaped into the JSON export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Column whose value becomes the object key
    pub id_column: String,
    /// Pipe-delimited columns exported as string arrays
    pub array_columns: Vec<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            id_column: "id".to_string(),
            array_columns: vec!["topics".to_string(), "languages".to_string()],
        }
    }
}

/// Rows read and keys written by an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub rows: usize,
    pub keys: usize,
}

/// Convert a SQLite value to JSON
///
/// - Integer/Real → number (non-finite reals → string)
/// - Text → string
/// - Blob → base64 string
/// - Null → null
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(i) => JsonValue::Number((*i).into()),
        Value::Real(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(f.to_string())),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Blob(bytes) => {
            JsonValue::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
    }
}

/// Split a pipe-delimited cell into a JSON array of strings
///
/// NULL and the empty string both become `[]`, never `[""]`.
///
/// # Examples
///
/// ```
/// # use repodb_tools::migration::export::split_delimited;
/// # use rusqlite::types::Value;
/// assert_eq!(
///     split_delimited(&Value::Text("rust|cli".into())).unwrap(),
///     serde_json::json!(["rust", "cli"])
/// );
/// assert_eq!(split_delimited(&Value::Null).unwrap(), serde_json::json!([]));
/// ```
pub fn split_delimited(value: &Value) -> Result<JsonValue> {
    let text = match value {
        Value::Null => return Ok(JsonValue::Array(Vec::new())),
        Value::Text(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Blob(_) => bail!("Cannot split a BLOB value into a list"),
    };

    if text.is_empty() {
        return Ok(JsonValue::Array(Vec::new()));
    }

    Ok(JsonValue::Array(
        text.split(LIST_DELIMITER)
            .map(|item| JsonValue::String(item.to_string()))
            .collect(),
    ))
}

/// Render an identifier cell as a JSON object key
pub fn value_to_key(value: &Value) -> Result<String> {
    match value {
        Value::Integer(i) => Ok(i.to_string()),
        Value::Text(s) => Ok(s.clone()),
        Value::Real(f) => Ok(format!("{:?}", f)),
        Value::Null => Ok("null".to_string()),
        Value::Blob(_) => bail!("BLOB values cannot be used as export keys"),
    }
}

/// Convert one row into a JSON object, preserving column order
pub fn row_to_json(
    columns: &[String],
    row: &[Value],
    options: &ExportOptions,
) -> Result<Map<String, JsonValue>> {
    let mut object = Map::with_capacity(columns.len());

    for (column, value) in columns.iter().zip(row) {
        let json = if options.array_columns.contains(column) {
            split_delimited(value)
                .with_context(|| format!("Failed to convert column '{}'", column))?
        } else {
            value_to_json(value)
        };
        object.insert(column.clone(), json);
    }

    Ok(object)
}

/// Build the keyed export object for a whole table
///
/// Keys keep row order. A later row with a duplicate identifier replaces the
/// earlier one.
pub fn build_export(data: &TableData, options: &ExportOptions) -> Result<Map<String, JsonValue>> {
    let Some(id_index) = data.column_index(&options.id_column) else {
        bail!(
            "Table '{}' has no identifier column '{}'",
            data.table,
            options.id_column
        );
    };

    for column in &options.array_columns {
        if data.column_index(column).is_none() {
            tracing::warn!(
                "⚠ Array column '{}' not found in table '{}'",
                column,
                data.table
            );
        }
    }

    let mut export = Map::with_capacity(data.rows.len());

    for (row_num, row) in data.rows.iter().enumerate() {
        let key = value_to_key(&row[id_index])
            .with_context(|| format!("Invalid identifier in row {}", row_num + 1))?;
        let object = row_to_json(&data.columns, row, options)
            .with_context(|| format!("Failed to convert row {} (id {})", row_num + 1, key))?;

        if export.insert(key.clone(), JsonValue::Object(object)).is_some() {
            tracing::warn!("⚠ Duplicate identifier '{}', keeping the later row", key);
        }
    }

    Ok(export)
}

/// Write the export object as pretty-printed JSON
///
/// Missing parent directories are created.
pub fn write_export(output_path: &Path, export: &Map<String, JsonValue>) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, export)
        .with_context(|| format!("Failed to write JSON to {}", output_path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", output_path.display()))?;

    Ok(())
}

/// Read `table` and write it as keyed JSON to `output_path`
pub fn export_to_file(
    conn: &Connection,
    table: &str,
    output_path: &Path,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    tracing::info!("Exporting table '{}' to {}", table, output_path.display());

    let data = read_table(conn, table)?;
    let export = build_export(&data, options)?;
    write_export(output_path, &export)?;

    let summary = ExportSummary {
        rows: data.row_count(),
        keys: export.len(),
    };

    tracing::debug!("Exported {} rows as {} keys", summary.rows, summary.keys);
    Ok(summary)
}

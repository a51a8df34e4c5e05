// ABOUTME: SQLite utilities module
// ABOUTME: Exports read-only connection management, schema introspection and table reads

pub mod connection;
pub mod reader;
pub mod schema;

pub use connection::open_read_only;
pub use reader::{read_table, TableData};
pub use schema::{list_schema_objects, table_columns, SchemaObject};

/// Quote an identifier with double quotes, doubling any embedded quote
///
/// ```
/// # use repodb_tools::sqlite::quote_identifier;
/// assert_eq!(quote_identifier("repositories"), "\"repositories\"");
/// assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
/// ```
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

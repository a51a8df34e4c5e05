// ABOUTME: Utility functions for validation and reporting
// ABOUTME: Provides identifier validation, tool discovery, and file size formatting

use anyhow::{bail, Context, Result};
use std::path::Path;
use which::which;

/// Validate a table name before it is interpolated into SQL text
///
/// Accepts plain SQL identifiers only:
/// - Non-empty
/// - Starts with an ASCII letter or underscore
/// - Contains only ASCII letters, digits and underscores
///
/// # Errors
///
/// Returns an error describing why the name was rejected.
///
/// # Examples
///
/// ```
/// # use repodb_tools::utils::validate_table_name;
/// assert!(validate_table_name("repositories").is_ok());
/// assert!(validate_table_name("repositories; DROP TABLE x").is_err());
/// assert!(validate_table_name("1table").is_err());
/// ```
pub fn validate_table_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Table name cannot be empty");
    }

    let mut chars = name.chars();
    let first_ok = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);

    if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!(
            "Invalid table name '{}'. \
             Table names must start with a letter or underscore and contain only \
             letters, digits and underscores",
            sanitize_identifier(name)
        );
    }

    Ok(())
}

/// Check that the external command-line tools are available on `PATH`
///
/// # Errors
///
/// Returns an error with installation instructions if any tool is missing.
pub fn check_required_tools(tools: &[&str]) -> Result<()> {
    let missing: Vec<&str> = tools
        .iter()
        .copied()
        .filter(|tool| which(tool).is_err())
        .collect();

    if !missing.is_empty() {
        bail!(
            "Missing required command-line tools: {}\n\
             \n\
             Please install the Turso CLI:\n\
             - macOS: brew install tursodatabase/tap/turso\n\
             - Linux/WSL: curl -sSfL https://get.tur.so/install.sh | bash\n\
             Then authenticate with: turso auth login",
            missing.join(", ")
        );
    }

    Ok(())
}

/// Size of a file on disk in bytes
pub fn file_size(path: &Path) -> Result<u64> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;
    Ok(metadata.len())
}

/// Format a byte count as mebibytes with two decimals
///
/// ```
/// # use repodb_tools::utils::format_mebibytes;
/// assert_eq!(format_mebibytes(1_048_576), "1.00 MB");
/// ```
pub fn format_mebibytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Format a byte count as kibibytes with two decimals
///
/// ```
/// # use repodb_tools::utils::format_kibibytes;
/// assert_eq!(format_kibibytes(1536), "1.50 KB");
/// ```
pub fn format_kibibytes(bytes: u64) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

/// Sanitize an identifier for display
///
/// Removes control characters and limits length so that rejected input cannot
/// corrupt log output. Display only; never use the result in SQL.
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_table_name_valid() {
        assert!(validate_table_name("repositories").is_ok());
        assert!(validate_table_name("_staging").is_ok());
        assert!(validate_table_name("repos_2024").is_ok());
    }

    #[test]
    fn test_validate_table_name_invalid() {
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("2024_repos").is_err());
        assert!(validate_table_name("repos-old").is_err());
        assert!(validate_table_name("repos\"; DROP TABLE x; --").is_err());
    }

    #[test]
    fn test_validate_table_name_has_no_length_cap() {
        assert!(validate_table_name(&"a".repeat(200)).is_ok());
    }

    #[test]
    fn test_check_required_tools() {
        let result = check_required_tools(&["definitely-not-a-real-tool-xyz"]);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Missing required command-line tools"));
        assert!(err.contains("definitely-not-a-real-tool-xyz"));
    }

    #[test]
    fn test_format_sizes() {
        assert_eq!(format_mebibytes(0), "0.00 MB");
        assert_eq!(format_mebibytes(5 * 1024 * 1024 + 512 * 1024), "5.50 MB");
        assert_eq!(format_kibibytes(0), "0.00 KB");
        assert_eq!(format_kibibytes(2048), "2.00 KB");
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("normal_table"), "normal_table");
        assert_eq!(sanitize_identifier("table\x00name"), "tablename");
        assert_eq!(sanitize_identifier("table\nname"), "tablename");
        assert_eq!(sanitize_identifier(&"a".repeat(200)).len(), 100);
    }

    #[test]
    fn test_file_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sized.txt");
        std::fs::write(&path, b"hello").unwrap();
        assert_eq!(file_size(&path).unwrap(), 5);
        assert!(file_size(&dir.path().join("missing.txt")).is_err());
    }
}

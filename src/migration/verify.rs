// ABOUTME: Post-migration row count check against the remote database
// ABOUTME: Queries COUNT(*) through the shell and compares it with the local count

use super::shell::SqlShell;
use crate::utils::validate_table_name;
use anyhow::Result;

/// Outcome of the remote count query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCount {
    /// Shell succeeded; the last non-empty output line, trimmed
    Reported(String),
    /// Shell succeeded but printed nothing
    Empty,
    /// Shell exited non-zero
    Failed { exit_code: Option<i32>, stderr: String },
}

/// Comparison of the local and remote row counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountCheck {
    Match(u64),
    Mismatch { local: u64, remote: u64 },
    /// Remote output was not a plain integer
    Unparsed { local: u64, remote: String },
    Unavailable,
}

/// Last non-empty line of shell output, trimmed
///
/// Shells print a header before the value, so only the last line counts.
///
/// ```
/// # use repodb_tools::migration::verify::parse_count_output;
/// assert_eq!(parse_count_output("COUNT (*)\n250\n\n"), Some("250".to_string()));
/// assert_eq!(parse_count_output("  \n"), None);
/// ```
pub fn parse_count_output(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(String::from)
}

/// Ask the remote database how many rows `table` holds
pub fn remote_row_count<S: SqlShell + ?Sized>(shell: &mut S, table: &str) -> Result<RemoteCount> {
    validate_table_name(table)?;

    let output = shell.submit(&format!("SELECT COUNT(*) FROM {};", table))?;

    if !output.success() {
        return Ok(RemoteCount::Failed {
            exit_code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        });
    }

    Ok(parse_count_output(&output.stdout)
        .map(RemoteCount::Reported)
        .unwrap_or(RemoteCount::Empty))
}

/// Compare the local row count with what the remote reported
///
/// Never fails: a mismatch is for the operator to judge.
pub fn compare_counts(local: u64, remote: &RemoteCount) -> CountCheck {
    match remote {
        RemoteCount::Reported(text) => match text.parse::<u64>() {
            Ok(n) if n == local => CountCheck::Match(n),
            Ok(n) => CountCheck::Mismatch { local, remote: n },
            Err(_) => CountCheck::Unparsed {
                local,
                remote: text.clone(),
            },
        },
        RemoteCount::Empty | RemoteCount::Failed { .. } => CountCheck::Unavailable,
    }
}

// ABOUTME: Migrate command implementation - Upsert one table into the remote database
// ABOUTME: Loads env-file settings, batches rows through the database shell, then checks the remote count

use crate::config::{EnvConfig, DATABASE_NAME_KEY};
use crate::migration::batch::{batch_count, DEFAULT_BATCH_SIZE};
use crate::migration::shell::{DEFAULT_DATABASE_NAME, DEFAULT_SHELL_PROGRAM};
use crate::migration::{
    compare_counts, migrate_rows, remote_row_count, CommandShell, CountCheck, MigrationReport,
    RemoteCount, SqlShell,
};
use crate::sqlite::{self, TableData};
use crate::utils;
use anyhow::{bail, Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

/// Settings for one migration run
#[derive(Debug, Clone)]
pub struct MigrateOptions {
    pub source: PathBuf,
    pub table: String,
    pub env_file: PathBuf,
    /// Remote database name; falls back to the env file, then the default
    pub database: Option<String>,
    pub shell_program: String,
    pub batch_size: usize,
    pub skip_confirmation: bool,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        Self {
            source: PathBuf::from("server/db/repositories.db"),
            table: "repositories".to_string(),
            env_file: PathBuf::from(".env"),
            database: None,
            shell_program: DEFAULT_SHELL_PROGRAM.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            skip_confirmation: false,
        }
    }
}

/// What a completed migration saw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub report: MigrationReport,
    pub remote: RemoteCount,
    pub check: CountCheck,
}

/// Migrate a local table to the remote database through its command-line shell
///
/// Steps:
/// 1. Loads the optional environment file into an explicit config
/// 2. Reads every row of the table from the source database (read-only)
/// 3. Prompts for confirmation (unless skip_confirmation is set)
/// 4. Submits `INSERT OR REPLACE` batches, stopping at the first rejected batch
/// 5. Prints the remote row count next to the local one
///
/// # Errors
///
/// This function will return an error if:
/// - The table name is not a plain identifier
/// - The shell program is not installed
/// - The source database or table cannot be read
/// - The user declines the confirmation prompt
/// - Any batch exits non-zero (later batches are not attempted)
pub fn migrate(options: &MigrateOptions) -> Result<()> {
    tracing::info!("🚀 Starting migration of '{}'...", options.table);

    utils::validate_table_name(&options.table)?;

    let config = EnvConfig::load(&options.env_file)?;
    let database = resolve_database_name(options.database.as_deref(), &config);

    utils::check_required_tools(&[options.shell_program.as_str()])?;

    let conn =
        sqlite::open_read_only(&options.source).context("Failed to connect to source database")?;
    println!("✅ Connected to local SQLite database");

    let data = sqlite::read_table(&conn, &options.table)?;
    println!("📦 Found {} repositories to migrate", data.row_count());

    let mut shell =
        CommandShell::database_shell(&options.shell_program, &database).with_env(&config);

    if !options.skip_confirmation && !confirm_migration(&data, options.batch_size, &shell)? {
        bail!("Migration cancelled by user");
    }

    migrate_with_shell(&mut shell, &data, options.batch_size)?;
    Ok(())
}

/// Run the batch loop and the count check against any [`SqlShell`]
///
/// Prints a single-line progress indicator while batches are applied and the
/// remote count afterwards. A count mismatch is reported, never an error.
pub fn migrate_with_shell<S: SqlShell + ?Sized>(
    shell: &mut S,
    data: &TableData,
    batch_size: usize,
) -> Result<MigrationOutcome> {
    let progress = ProgressBar::new(data.row_count() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("⏳ Progress: {msg} [{elapsed_precise}] {bar:40.cyan/blue}")
            .context("Invalid progress bar template")?
            .progress_chars("##-"),
    );
    progress.set_message(format!("0/{} (0.0%)", data.row_count()));

    let result = migrate_rows(shell, data, batch_size, |p| {
        progress.set_position(p.processed as u64);
        progress.set_message(format!(
            "{}/{} ({:.1}%)",
            p.processed,
            p.total,
            p.percentage()
        ));
        tracing::debug!("Batch {}/{} applied", p.batch, p.batches);
    });

    let report = match result {
        Ok(report) => {
            progress.finish();
            report
        }
        Err(e) => {
            progress.abandon();
            return Err(e);
        }
    };

    println!("✅ Migration completed successfully!");

    let remote = remote_row_count(shell, &data.table)?;
    let check = compare_counts(data.row_count() as u64, &remote);
    report_remote_count(&remote, &check);

    Ok(MigrationOutcome {
        report,
        remote,
        check,
    })
}

/// CLI value, else env-file value, else the built-in default
fn resolve_database_name(cli: Option<&str>, config: &EnvConfig) -> String {
    cli.or_else(|| config.get(DATABASE_NAME_KEY))
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(DEFAULT_DATABASE_NAME)
        .to_string()
}

fn report_remote_count(remote: &RemoteCount, check: &CountCheck) {
    match remote {
        RemoteCount::Reported(count) => {
            println!("📊 Total repositories in remote database: {}", count);
        }
        RemoteCount::Empty => {
            tracing::warn!("⚠ Remote row count query returned no output");
        }
        RemoteCount::Failed { exit_code, stderr } => {
            tracing::warn!(
                "⚠ Could not verify remote row count (exit code {:?}): {}",
                exit_code,
                stderr
            );
        }
    }

    match check {
        CountCheck::Match(n) => {
            tracing::info!("✓ Remote row count matches local row count ({})", n);
        }
        CountCheck::Mismatch { local, remote } => {
            println!(
                "⚠ Remote row count {} differs from local row count {}",
                remote, local
            );
        }
        CountCheck::Unparsed { local, remote } => {
            println!(
                "⚠ Compare the remote count '{}' with the local row count {} manually",
                remote, local
            );
        }
        CountCheck::Unavailable => {}
    }
}

/// Show what is about to be written and ask before touching the remote database
fn confirm_migration<S: SqlShell + ?Sized>(
    data: &TableData,
    batch_size: usize,
    shell: &S,
) -> Result<bool> {
    println!();
    println!("{:<14} {}", "Table:", data.table);
    println!("{:<14} {}", "Rows:", data.row_count());
    println!(
        "{:<14} {} (up to {} rows each)",
        "Batches:",
        batch_count(data.row_count(), batch_size),
        batch_size
    );
    println!("{:<14} {}", "Destination:", shell.describe());
    println!();

    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Upsert these rows into the remote database?")
        .default(false)
        .interact()
        .context("Failed to get migration confirmation")
}

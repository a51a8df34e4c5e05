// ABOUTME: Command implementations for each data movement tool
// ABOUTME: Exports dump, export, and migrate commands

pub mod dump;
pub mod export;
pub mod migrate;

pub use dump::dump;
pub use export::export;
pub use migrate::{migrate, migrate_with_shell, MigrateOptions, MigrationOutcome};

// ABOUTME: Data movement module
// ABOUTME: Handles SQL dumps, JSON export, batched upserts and remote verification

pub mod batch;
pub mod dump;
pub mod export;
pub mod shell;
pub mod verify;

pub use batch::{build_upsert, encode_value, migrate_rows, BatchProgress, MigrationReport};
pub use dump::{dump_to_file, write_dump, DumpStats};
pub use export::{build_export, export_to_file, ExportOptions, ExportSummary};
pub use shell::{CommandShell, ShellOutput, SqlShell};
pub use verify::{compare_counts, remote_row_count, CountCheck, RemoteCount};

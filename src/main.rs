// ABOUTME: CLI entry point for repodb-tools
// ABOUTME: Parses commands, routes to handlers and maps failures to exit status 1

use clap::builder::TypedValueParser;
use clap::{Parser, Subcommand};
use repodb_tools::commands::{self, MigrateOptions};
use repodb_tools::migration::batch::DEFAULT_BATCH_SIZE;
use repodb_tools::migration::shell::DEFAULT_SHELL_PROGRAM;
use repodb_tools::migration::ExportOptions;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "repodb-tools")]
#[command(about = "Dump, export and migrate the local repositories database", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write every table as SQL statements that rebuild the database
    Dump {
        /// Source SQLite database
        #[arg(long, default_value = "server/db/repositories.db")]
        source: PathBuf,
        /// Destination SQL file
        #[arg(long, default_value = "repositories_dump.sql")]
        output: PathBuf,
    },
    /// Export one table as a JSON object keyed by row identifier
    Export {
        /// Source SQLite database
        #[arg(long, default_value = "server/db/repositories.db")]
        source: PathBuf,
        /// Destination JSON file
        #[arg(long, default_value = "public/repositories_details.json")]
        output: PathBuf,
        #[arg(long, default_value = "repositories")]
        table: String,
        /// Column whose value keys each exported row
        #[arg(long, default_value = "id")]
        id_column: String,
        /// Pipe-delimited columns exported as arrays (comma-separated)
        #[arg(long, value_delimiter = ',', default_value = "topics,languages")]
        array_columns: Vec<String>,
    },
    /// Upsert one table into the remote database in batches
    Migrate {
        /// Source SQLite database
        #[arg(long, default_value = "server/db/repositories.db")]
        source: PathBuf,
        #[arg(long, default_value = "repositories")]
        table: String,
        /// KEY=VALUE settings passed to the database shell
        #[arg(long, default_value = ".env")]
        env_file: PathBuf,
        /// Remote database name (default: TURSO_DATABASE_NAME from the env file, then the-git-bang)
        #[arg(long)]
        database: Option<String>,
        /// Database shell program, invoked as `<shell> db shell <database>`
        #[arg(long, default_value = DEFAULT_SHELL_PROGRAM)]
        shell: String,
        /// Rows per INSERT OR REPLACE statement
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE,
              value_parser = clap::value_parser!(u64).range(1..).map(|n| n as usize))]
        batch_size: usize,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Dump { .. } => "Dump",
            Commands::Export { .. } => "Export",
            Commands::Migrate { .. } => "Migration",
        }
    }
}

fn main() -> ExitCode {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let name = cli.command.name();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {} failed: {:#}", name, e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Dump { source, output } => commands::dump(&source, &output),
        Commands::Export {
            source,
            output,
            table,
            id_column,
            array_columns,
        } => {
            let options = ExportOptions {
                id_column,
                array_columns,
            };
            commands::export(&source, &output, &table, &options)
        }
        Commands::Migrate {
            source,
            table,
            env_file,
            database,
            shell,
            batch_size,
            yes,
        } => commands::migrate(&MigrateOptions {
            source,
            table,
            env_file,
            database,
            shell_program: shell,
            batch_size,
            skip_confirmation: yes,
        }),
    }
}

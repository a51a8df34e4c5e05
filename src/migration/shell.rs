// ABOUTME: Transport for SQL statements sent to the remote database
// ABOUTME: Defines the SqlShell seam and its subprocess implementation (turso db shell)

use crate::config::EnvConfig;
use anyhow::{anyhow, Context, Result};
use std::io::{ErrorKind, Write};
use std::process::{ChildStdin, Command, Stdio};

/// Program used to reach the remote database when none is configured
pub const DEFAULT_SHELL_PROGRAM: &str = "turso";

/// Remote database name used when neither the CLI nor the env file sets one
pub const DEFAULT_DATABASE_NAME: &str = "the-git-bang";

/// Captured result of one submitted statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` if the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Anything that can execute SQL text against the destination database
///
/// Errors are reserved for failures to run the transport at all. A statement
/// the destination rejects comes back as a non-successful [`ShellOutput`].
pub trait SqlShell {
    fn submit(&mut self, sql: &str) -> Result<ShellOutput>;

    /// Human-readable destination, for logs and prompts
    fn describe(&self) -> String;
}

/// Runs a command-line database shell, feeding SQL on stdin
///
/// Each submission spawns a fresh process and waits for it without a timeout.
#[derive(Debug, Clone)]
pub struct CommandShell {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl CommandShell {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            env: Vec::new(),
        }
    }

    /// `<program> db shell <database>`
    pub fn database_shell(program: impl Into<String>, database: &str) -> Self {
        Self::new(
            program,
            vec!["db".to_string(), "shell".to_string(), database.to_string()],
        )
    }

    /// `turso db shell <database>`
    pub fn turso(database: &str) -> Self {
        Self::database_shell(DEFAULT_SHELL_PROGRAM, database)
    }

    /// Pass env-file settings to the child process only
    pub fn with_env(mut self, config: &EnvConfig) -> Self {
        self.env.extend(
            config
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string())),
        );
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl SqlShell for CommandShell {
    fn submit(&mut self, sql: &str) -> Result<ShellOutput> {
        tracing::debug!(
            "Submitting {} bytes of SQL to {}",
            sql.len(),
            self.describe()
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| {
                format!(
                    "Failed to execute {}. Is it installed and on PATH?",
                    self.program
                )
            })?;

        let stdin = child
            .stdin
            .take()
            .context("Failed to open stdin of database shell")?;

        // Feed stdin on its own thread while this one drains stdout and stderr,
        // so neither side can block on a full pipe.
        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(|| feed_stdin(stdin, sql.as_bytes()));
            let output = child.wait_with_output();
            (writer.join(), output)
        });

        let output = output.with_context(|| format!("Failed to wait for {}", self.program))?;
        written
            .map_err(|_| anyhow!("SQL writer thread for {} panicked", self.program))?
            .with_context(|| format!("Failed to write SQL to {}", self.program))?;

        Ok(ShellOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Write all of `input`, then close the pipe so the shell sees end of input
///
/// A shell that exits before reading everything closes its end first. That is
/// not an error here: its exit status and stderr say what went wrong.
fn feed_stdin(mut stdin: ChildStdin, input: &[u8]) -> std::io::Result<()> {
    match stdin.write_all(input) {
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            tracing::debug!("Database shell closed stdin before reading all SQL");
            Ok(())
        }
        result => result,
    }
}

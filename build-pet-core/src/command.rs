//! External command execution for the pollers.
//!
//! This module provides the `ExternalCommand` struct for spawning a single
//! short-lived process in a working directory, capturing its stdout and
//! stderr, and bounding how long it may run.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

/// A command that is spawned once per poll.
///
/// Nothing is reused between invocations: every call to [`ExternalCommand::run`]
/// starts a fresh process.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    /// The program to run.
    program: String,
    /// Arguments to pass to the program.
    args: Vec<String>,
    /// Directory the process runs in.
    working_dir: PathBuf,
    /// Upper bound on how long the process may run.
    timeout: Duration,
}

impl ExternalCommand {
    /// Create a new command.
    ///
    /// # Examples
    ///
    /// ```
    /// use build_pet_core::ExternalCommand;
    /// use std::time::Duration;
    ///
    /// let command = ExternalCommand::new(
    ///     "cargo",
    ///     vec!["check".to_string()],
    ///     ".",
    ///     Duration::from_secs(120),
    /// );
    /// assert_eq!(command.display(), "cargo check");
    /// ```
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        working_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: working_dir.into(),
            timeout,
        }
    }

    /// Get the program this command will run.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Get the directory the command runs in.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The command line as it would appear in a shell.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    /// Run the command to completion and capture its output.
    ///
    /// A non-zero exit status is not an error: the output is still returned
    /// and the caller decides what it means.
    ///
    /// # Errors
    ///
    /// Returns `Error::CommandNotFound` if the program cannot be found.
    /// Returns `Error::CommandFailed` if the process fails to spawn or run.
    /// Returns `Error::CommandTimeout` if the process outlives its timeout;
    /// the child is killed in that case.
    pub async fn run(&self) -> Result<CommandOutput> {
        let start = Instant::now();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.current_dir(&self.working_dir);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::command_not_found(&self.program)
            } else {
                Error::command_failed(format!("failed to spawn '{}': {}", self.display(), e))
            }
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(Error::command_failed(format!("wait failed: {}", e))),
            Err(_) => {
                return Err(Error::CommandTimeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let combined = format!("{}{}", stderr, stdout);

        Ok(CommandOutput {
            stdout,
            stderr,
            combined,
            exit_code: output.status.code(),
            duration_secs: start.elapsed().as_secs_f64(),
        })
    }
}

/// Output captured from one command run.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Everything written to stdout.
    pub stdout: String,
    /// Everything written to stderr.
    pub stderr: String,
    /// stderr followed by stdout.
    pub combined: String,
    /// Exit code of the process, if it exited normally.
    pub exit_code: Option<i32>,
    /// Wall time of the run in seconds.
    pub duration_secs: f64,
}

impl CommandOutput {
    /// Check if the process exited successfully (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

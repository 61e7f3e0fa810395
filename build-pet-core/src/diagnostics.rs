//! Build diagnostics polling.
//!
//! Runs the configured build-check command and counts the lines of its
//! output that start with `warning:` or `error:`. Nothing here parses
//! diagnostics properly; the counts are all the mood machine needs.

use crate::command::ExternalCommand;
use crate::config::PollConfig;
use crate::mood::DiagnosticsResult;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static WARNING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^warning:").expect("warning pattern is valid"));
static ERROR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^error:").expect("error pattern is valid"));

/// Count `warning:` and `error:` lines in build output.
///
/// Matching is case-sensitive and anchored to the start of each line.
///
/// # Examples
///
/// ```
/// use build_pet_core::diagnostics::count_diagnostics;
///
/// let output = "warning: unused variable `x`\n  --> src/main.rs:2:9\nerror: aborting\n";
/// let result = count_diagnostics(output);
/// assert_eq!(result.warning_count, 1);
/// assert_eq!(result.error_count, 1);
/// ```
pub fn count_diagnostics(output: &str) -> DiagnosticsResult {
    let warnings = WARNING_LINE.find_iter(output).count();
    let errors = ERROR_LINE.find_iter(output).count();
    DiagnosticsResult::from_raw(warnings as i64, errors as i64)
}

/// Polls the build tool for warning and error counts.
#[derive(Debug, Clone)]
pub struct DiagnosticsPoller {
    command: ExternalCommand,
}

impl DiagnosticsPoller {
    /// Create a poller from its configuration.
    pub fn new(config: &PollConfig) -> Self {
        Self {
            command: config.to_command(),
        }
    }

    /// The command run on every poll.
    pub fn command(&self) -> &ExternalCommand {
        &self.command
    }

    /// Run one poll.
    ///
    /// Never fails: any execution problem is logged and reported as a clean
    /// result with zero counts.
    pub async fn poll(&self) -> DiagnosticsResult {
        match self.command.run().await {
            Ok(output) => {
                let result = count_diagnostics(&output.combined);
                debug!(
                    command = %self.command.display(),
                    exit_code = ?output.exit_code,
                    duration_secs = output.duration_secs,
                    warnings = result.warning_count,
                    errors = result.error_count,
                    "diagnostics poll finished"
                );
                result
            }
            Err(e) => {
                warn!(command = %self.command.display(), error = %e, "diagnostics poll failed");
                DiagnosticsResult::clean()
            }
        }
    }
}

//! Project activity polling.
//!
//! Runs a command that prints the newest modification time (Unix epoch
//! seconds) across the project's visible files, and decides whether the
//! project has been idle for longer than the threshold.

use crate::command::ExternalCommand;
use crate::config::PollConfig;
use crate::error::{Error, Result};
use crate::mood::ActivityResult;
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, warn};

/// Parse the single integer the activity command prints.
///
/// # Errors
///
/// Returns `Error::ParseError` if the trimmed output is not an integer.
pub fn parse_timestamp(stdout: &str) -> Result<i64> {
    let trimmed = stdout.trim();
    trimmed
        .parse::<i64>()
        .map_err(|e| Error::parse_error(format!("expected epoch seconds, got '{}': {}", trimmed, e)))
}

/// Whether more than `threshold` has passed between `last_modified` and `now`.
pub fn is_idle(last_modified: i64, now: i64, threshold: Duration) -> bool {
    let elapsed = now.saturating_sub(last_modified);
    elapsed as f64 > threshold.as_secs_f64()
}

/// Polls the project for recent file modifications.
#[derive(Debug, Clone)]
pub struct ActivityPoller {
    command: ExternalCommand,
    idle_threshold: Duration,
}

impl ActivityPoller {
    /// Create a poller from its configuration and idle threshold.
    pub fn new(config: &PollConfig, idle_threshold: Duration) -> Self {
        Self {
            command: config.to_command(),
            idle_threshold,
        }
    }

    /// The command run on every poll.
    pub fn command(&self) -> &ExternalCommand {
        &self.command
    }

    /// Run one poll against the wall clock.
    ///
    /// Never fails: command or parse failures are logged and reported as
    /// not idle.
    pub async fn poll(&self) -> ActivityResult {
        let last_modified = match self.last_modified().await {
            Ok(timestamp) => timestamp,
            Err(e) => {
                warn!(command = %self.command.display(), error = %e, "activity poll failed");
                return ActivityResult::awake();
            }
        };

        let now = Utc::now().timestamp();
        let result = ActivityResult::new(is_idle(last_modified, now, self.idle_threshold));
        debug!(
            last_modified,
            idle_secs = now.saturating_sub(last_modified),
            is_idle = result.is_idle,
            "activity poll finished"
        );
        result
    }

    async fn last_modified(&self) -> Result<i64> {
        let output = self.command.run().await?;
        if !output.success() && output.stdout.trim().is_empty() {
            return Err(Error::command_failed(format!(
                "exited with {:?}: {}",
                output.exit_code,
                output.stderr.trim()
            )));
        }
        parse_timestamp(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poller(script: &str, idle_threshold: Duration) -> ActivityPoller {
        let config = PollConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            working_dir: std::env::temp_dir(),
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
        };
        ActivityPoller::new(&config, idle_threshold)
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1700000000\n").unwrap(), 1_700_000_000);
        assert_eq!(parse_timestamp("  42  ").unwrap(), 42);
        assert!(matches!(parse_timestamp(""), Err(Error::ParseError { .. })));
        assert!(matches!(
            parse_timestamp("fatal: not a git repository"),
            Err(Error::ParseError { .. })
        ));
    }

    #[test]
    fn test_is_idle() {
        let threshold = Duration::from_secs(300);
        assert!(!is_idle(1000, 1000, threshold));
        assert!(!is_idle(1000, 1300, threshold));
        assert!(is_idle(1000, 1301, threshold));
        // A file from the future is never idle.
        assert!(!is_idle(2000, 1000, threshold));
    }

    #[tokio::test]
    async fn test_poll_recent_modification_is_awake() {
        let poller = poller("date +%s", Duration::from_secs(300));
        assert_eq!(poller.poll().await, ActivityResult::new(false));
    }

    #[tokio::test]
    async fn test_poll_old_modification_is_idle() {
        let poller = poller("echo $(( $(date +%s) - 1000 ))", Duration::from_secs(300));
        assert_eq!(poller.poll().await, ActivityResult::new(true));
    }

    #[tokio::test]
    async fn test_poll_command_failure_is_awake() {
        let poller = poller("echo 'fatal: not a git repository' >&2; exit 128", Duration::from_secs(0));
        assert_eq!(poller.poll().await, ActivityResult::awake());
    }

    #[tokio::test]
    async fn test_poll_extreme_timestamp_with_debug_logging() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let distant_past = poller("echo -9223372036854775808", Duration::from_secs(300));
        assert_eq!(distant_past.poll().await, ActivityResult::new(true));

        let distant_future = poller("echo 9223372036854775807", Duration::from_secs(300));
        assert_eq!(distant_future.poll().await, ActivityResult::new(false));
    }

    #[tokio::test]
    async fn test_poll_garbage_output_is_awake() {
        let poller = poller("echo yesterday", Duration::from_secs(0));
        assert_eq!(poller.poll().await, ActivityResult::awake());
    }
}

//! Configuration for the build pet.
//!
//! This module provides the `Config` struct with a builder pattern for the
//! two pollers, the mood thresholds, the pacing bounds, and the asset map.

use crate::assets::AssetMap;
use crate::command::ExternalCommand;
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default project directory.
const DEFAULT_WORKING_DIR: &str = ".";

/// Default build-check program.
const DEFAULT_DIAGNOSTICS_COMMAND: &str = "cargo";

/// Default build-check arguments.
const DEFAULT_DIAGNOSTICS_ARGS: &str = "check";

/// Default shell used to run the activity script.
const DEFAULT_ACTIVITY_SHELL: &str = "/bin/bash";

/// Default activity script: newest mtime across tracked and untracked, non-ignored files.
const DEFAULT_ACTIVITY_SCRIPT: &str =
    "git ls-files -c -o --exclude-standard -z | xargs -0 stat --format='%Y' | sort -n | tail -n 1";

/// Default interval between diagnostics polls in milliseconds.
const DEFAULT_DIAGNOSTICS_INTERVAL_MS: u64 = 1000;

/// Default interval between activity polls in milliseconds.
const DEFAULT_ACTIVITY_INTERVAL_MS: u64 = 1000;

/// Default diagnostics command timeout in seconds.
const DEFAULT_DIAGNOSTICS_TIMEOUT_SECS: u64 = 120;

/// Default activity command timeout in seconds.
const DEFAULT_ACTIVITY_TIMEOUT_SECS: u64 = 30;

/// Default idle threshold in seconds (five minutes).
const DEFAULT_IDLE_THRESHOLD_SECS: u64 = 300;

/// Default excited cooldown in seconds.
const DEFAULT_EXCITED_COOLDOWN_SECS: u64 = 5;

/// Default warning count above which the pet gets worried.
const DEFAULT_WARNING_THRESHOLD: u32 = 10;

/// Default animation playback speed, in percent.
const DEFAULT_BASE_SPEED: f32 = 100.0;

/// Default pacing tick interval in milliseconds.
const DEFAULT_PACING_INTERVAL_MS: u64 = 100;

/// Fastest pacing tick interval in milliseconds.
const DEFAULT_MIN_PACING_INTERVAL_MS: u64 = 20;

/// Slowest pacing tick interval in milliseconds.
const DEFAULT_MAX_PACING_INTERVAL_MS: u64 = 100;

/// Default number of steps in one pacing sweep.
const DEFAULT_MAX_STEPS: u32 = 20;

/// Default horizontal pixels moved per pacing tick.
const DEFAULT_MOVE_OFFSET: i32 = 2;

/// Static configuration for one poller.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Program to run.
    pub command: String,

    /// Arguments to pass to the program.
    pub args: Vec<String>,

    /// Directory the program runs in.
    pub working_dir: PathBuf,

    /// Time between polls.
    pub poll_interval: Duration,

    /// Upper bound on a single run of the program.
    pub timeout: Duration,
}

impl PollConfig {
    /// Build the external command this poller spawns on every trigger.
    pub fn to_command(&self) -> ExternalCommand {
        ExternalCommand::new(
            &self.command,
            self.args.clone(),
            &self.working_dir,
            self.timeout,
        )
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(Error::config_error(format!("{} command is empty", name)));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::config_error(format!(
                "{} poll interval must be greater than zero",
                name
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::config_error(format!(
                "{} timeout must be greater than zero",
                name
            )));
        }
        Ok(())
    }
}

/// Bounds and cadence for the pacing scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingConfig {
    /// Tick interval when the pet is calm.
    pub default_interval: Duration,

    /// Lower clamp for the warning-adjusted interval.
    pub min_interval: Duration,

    /// Upper clamp for the warning-adjusted interval.
    pub max_interval: Duration,

    /// Number of steps before the pet turns around.
    pub max_steps: u32,

    /// Horizontal delta emitted on each tick.
    pub move_offset: i32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            default_interval: Duration::from_millis(DEFAULT_PACING_INTERVAL_MS),
            min_interval: Duration::from_millis(DEFAULT_MIN_PACING_INTERVAL_MS),
            max_interval: Duration::from_millis(DEFAULT_MAX_PACING_INTERVAL_MS),
            max_steps: DEFAULT_MAX_STEPS,
            move_offset: DEFAULT_MOVE_OFFSET,
        }
    }
}

/// Configuration for the build pet.
#[derive(Debug, Clone)]
pub struct Config {
    /// The build-check poller.
    pub diagnostics: PollConfig,

    /// The file-activity poller.
    pub activity: PollConfig,

    /// How long the project must go untouched before the pet falls asleep.
    pub idle_threshold: Duration,

    /// How long the excited override lasts after an interaction.
    pub excited_cooldown: Duration,

    /// Warning count above which the pet switches to the warning mood.
    pub warning_threshold: u32,

    /// Base animation playback speed, in percent.
    pub base_speed: f32,

    /// Pacing bounds and cadence.
    pub pacing: PacingConfig,

    /// Presentation record for each mood.
    pub assets: AssetMap,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            diagnostics: PollConfig {
                command: DEFAULT_DIAGNOSTICS_COMMAND.to_string(),
                args: DEFAULT_DIAGNOSTICS_ARGS
                    .split_whitespace()
                    .map(String::from)
                    .collect(),
                working_dir: PathBuf::from(DEFAULT_WORKING_DIR),
                poll_interval: Duration::from_millis(DEFAULT_DIAGNOSTICS_INTERVAL_MS),
                timeout: Duration::from_secs(DEFAULT_DIAGNOSTICS_TIMEOUT_SECS),
            },
            activity: PollConfig {
                command: DEFAULT_ACTIVITY_SHELL.to_string(),
                args: vec!["-c".to_string(), DEFAULT_ACTIVITY_SCRIPT.to_string()],
                working_dir: PathBuf::from(DEFAULT_WORKING_DIR),
                poll_interval: Duration::from_millis(DEFAULT_ACTIVITY_INTERVAL_MS),
                timeout: Duration::from_secs(DEFAULT_ACTIVITY_TIMEOUT_SECS),
            },
            idle_threshold: Duration::from_secs(DEFAULT_IDLE_THRESHOLD_SECS),
            excited_cooldown: Duration::from_secs(DEFAULT_EXCITED_COOLDOWN_SECS),
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            base_speed: DEFAULT_BASE_SPEED,
            pacing: PacingConfig::default(),
            assets: AssetMap::default(),
        }
    }
}

impl Config {
    /// Create a new Config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the project directory both pollers run in.
    pub fn working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.diagnostics.working_dir = path.clone();
        self.activity.working_dir = path;
        self
    }

    /// Set the build-check program and its arguments.
    pub fn diagnostics_command(mut self, command: impl Into<String>, args: Vec<String>) -> Self {
        self.diagnostics.command = command.into();
        self.diagnostics.args = args;
        self
    }

    /// Set the build-check command from a string (space-separated).
    pub fn diagnostics_command_str(mut self, command_line: impl Into<String>) -> Self {
        let command_line = command_line.into();
        let mut parts = command_line.split_whitespace().map(String::from);
        self.diagnostics.command = parts.next().unwrap_or_default();
        self.diagnostics.args = parts.collect();
        self
    }

    /// Set the activity program and its arguments.
    pub fn activity_command(mut self, command: impl Into<String>, args: Vec<String>) -> Self {
        self.activity.command = command.into();
        self.activity.args = args;
        self
    }

    /// Run the given shell script as the activity query.
    pub fn activity_script(self, script: impl Into<String>) -> Self {
        self.activity_command(DEFAULT_ACTIVITY_SHELL, vec!["-c".to_string(), script.into()])
    }

    /// Set the interval between diagnostics polls.
    pub fn diagnostics_interval(mut self, interval: Duration) -> Self {
        self.diagnostics.poll_interval = interval;
        self
    }

    /// Set the interval between activity polls.
    pub fn activity_interval(mut self, interval: Duration) -> Self {
        self.activity.poll_interval = interval;
        self
    }

    /// Set the timeout for one diagnostics run.
    pub fn diagnostics_timeout(mut self, timeout: Duration) -> Self {
        self.diagnostics.timeout = timeout;
        self
    }

    /// Set the timeout for one activity run.
    pub fn activity_timeout(mut self, timeout: Duration) -> Self {
        self.activity.timeout = timeout;
        self
    }

    /// Set the idle threshold.
    pub fn idle_threshold(mut self, threshold: Duration) -> Self {
        self.idle_threshold = threshold;
        self
    }

    /// Set the excited cooldown.
    pub fn excited_cooldown(mut self, cooldown: Duration) -> Self {
        self.excited_cooldown = cooldown;
        self
    }

    /// Set the warning threshold.
    pub fn warning_threshold(mut self, threshold: u32) -> Self {
        self.warning_threshold = threshold;
        self
    }

    /// Set the base playback speed, in percent.
    pub fn base_speed(mut self, speed: f32) -> Self {
        self.base_speed = speed;
        self
    }

    /// Set the default pacing tick interval.
    pub fn pacing_interval(mut self, interval: Duration) -> Self {
        self.pacing.default_interval = interval;
        self
    }

    /// Set the clamp range for warning-adjusted pacing intervals.
    pub fn pacing_interval_bounds(mut self, min: Duration, max: Duration) -> Self {
        self.pacing.min_interval = min;
        self.pacing.max_interval = max;
        self
    }

    /// Set the number of steps in one pacing sweep.
    pub fn max_steps(mut self, steps: u32) -> Self {
        self.pacing.max_steps = steps;
        self
    }

    /// Set the horizontal delta emitted on each pacing tick.
    pub fn move_offset(mut self, offset: i32) -> Self {
        self.pacing.move_offset = offset;
        self
    }

    /// Set the mood asset map.
    pub fn assets(mut self, assets: AssetMap) -> Self {
        self.assets = assets;
        self
    }

    /// Check the configuration for values the pet cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.diagnostics.validate("diagnostics")?;
        self.activity.validate("activity")?;

        if self.excited_cooldown.is_zero() {
            return Err(Error::config_error("excited cooldown must be greater than zero"));
        }
        if !self.base_speed.is_finite() || self.base_speed <= 0.0 {
            return Err(Error::config_error(format!(
                "base speed must be a positive number, got {}",
                self.base_speed
            )));
        }

        let pacing = &self.pacing;
        if pacing.default_interval.is_zero() || pacing.min_interval.is_zero() {
            return Err(Error::config_error("pacing intervals must be greater than zero"));
        }
        if pacing.min_interval > pacing.max_interval {
            return Err(Error::config_error(format!(
                "pacing interval bounds are inverted: {}ms > {}ms",
                pacing.min_interval.as_millis(),
                pacing.max_interval.as_millis()
            )));
        }
        if pacing.max_steps == 0 {
            return Err(Error::config_error("max_steps must be at least 1"));
        }
        if pacing.move_offset == 0 {
            return Err(Error::config_error("move_offset must not be zero"));
        }

        Ok(())
    }
}

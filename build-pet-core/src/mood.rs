//! The mood state machine.
//!
//! `MoodMachine` owns the current mood, the excited cooldown and the playback
//! speed. Every input takes the current instant so callers (and tests) control
//! time. Each input returns an [`Outcome`] describing what was committed and
//! what the pacing scheduler should do about it.
//!
//! Rules, highest priority first:
//!
//! 1. Idle activity forces `Asleep` and suspends pacing. Diagnostics are
//!    ignored while asleep.
//! 2. Non-idle activity wakes an `Asleep` pet to `Happy` at the default pace.
//! 3. A user interaction forces `Excited` for the cooldown and suspends pacing.
//! 4. Diagnostics pick `Panic`, `Warning` or `Happy`, but cannot displace
//!    `Excited` until its cooldown has elapsed.

use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

/// The character's current animation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Clean build, recent activity.
    #[default]
    Happy,
    /// Just picked up by the user.
    Excited,
    /// Too many warnings.
    Warning,
    /// At least one error.
    Panic,
    /// Nobody has touched the project in a while.
    Asleep,
}

impl Mood {
    /// Every mood, in declaration order.
    pub const ALL: [Mood; 5] = [
        Mood::Happy,
        Mood::Excited,
        Mood::Warning,
        Mood::Panic,
        Mood::Asleep,
    ];

    /// Whether the pacing scheduler stays paused in this mood.
    pub fn suspends_pacing(self) -> bool {
        matches!(self, Mood::Panic | Mood::Asleep | Mood::Excited)
    }

    /// Lowercase name, matching the asset map keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Excited => "excited",
            Mood::Warning => "warning",
            Mood::Panic => "panic",
            Mood::Asleep => "asleep",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Warning and error counts from one diagnostics poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiagnosticsResult {
    /// Lines starting with `warning:`.
    pub warning_count: u32,
    /// Lines starting with `error:`.
    pub error_count: u32,
}

impl DiagnosticsResult {
    /// Create a result from counts.
    pub fn new(warning_count: u32, error_count: u32) -> Self {
        Self {
            warning_count,
            error_count,
        }
    }

    /// Create a result from signed counts, treating negatives as zero.
    pub fn from_raw(warning_count: i64, error_count: i64) -> Self {
        let clamp = |n: i64| u32::try_from(n.max(0)).unwrap_or(u32::MAX);
        Self::new(clamp(warning_count), clamp(error_count))
    }

    /// The neutral result used when a poll fails.
    pub fn clean() -> Self {
        Self::default()
    }
}

/// Idleness from one activity poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivityResult {
    /// Whether the project has gone untouched longer than the idle threshold.
    pub is_idle: bool,
}

impl ActivityResult {
    /// Create a result.
    pub fn new(is_idle: bool) -> Self {
        Self { is_idle }
    }

    /// The neutral result used when a poll fails.
    pub fn awake() -> Self {
        Self::default()
    }
}

/// What the pacing scheduler should do after an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingDirective {
    /// Leave pacing as it is.
    Keep,
    /// Pause pacing, keeping its position.
    Suspend,
    /// Run pacing at the given interval.
    Resume {
        /// Tick interval to use.
        interval: Duration,
    },
}

/// The result of feeding one input to the machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    /// Mood before the input.
    pub previous: Mood,
    /// Mood after the input.
    pub mood: Mood,
    /// Whether a transition was committed. False when the input was ignored
    /// or the candidate was dropped by the excited cooldown.
    pub committed: bool,
    /// Whether asset and playback speed were reset to the new mood's defaults.
    pub visuals_reset: bool,
    /// What pacing should do next.
    pub pacing: PacingDirective,
}

impl Outcome {
    fn unchanged(mood: Mood) -> Self {
        Self {
            previous: mood,
            mood,
            committed: false,
            visuals_reset: false,
            pacing: PacingDirective::Keep,
        }
    }

    /// Whether the mood is different after the input.
    pub fn mood_changed(&self) -> bool {
        self.previous != self.mood
    }
}

/// Thresholds and defaults the machine needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodSettings {
    /// How long an interaction keeps the character excited.
    pub excited_cooldown: Duration,
    /// Warnings above this count mean Warning.
    pub warning_threshold: u32,
    /// Playback speed in percent outside of Warning.
    pub base_speed: f32,
    /// Pacing interval for calm moods.
    pub default_interval: Duration,
    /// Lower bound for the Warning pacing interval.
    pub min_interval: Duration,
    /// Upper bound for the Warning pacing interval.
    pub max_interval: Duration,
}

impl From<&Config> for MoodSettings {
    fn from(config: &Config) -> Self {
        Self {
            excited_cooldown: config.excited_cooldown,
            warning_threshold: config.warning_threshold,
            base_speed: config.base_speed,
            default_interval: config.pacing.default_interval,
            min_interval: config.pacing.min_interval,
            max_interval: config.pacing.max_interval,
        }
    }
}

impl Default for MoodSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// The mood state machine.
#[derive(Debug, Clone)]
pub struct MoodMachine {
    settings: MoodSettings,
    mood: Mood,
    /// `None` until the first interaction.
    excited_until: Option<Instant>,
    current_speed: f32,
}

impl MoodMachine {
    /// Create a machine in the `Happy` mood at base speed.
    pub fn new(settings: MoodSettings) -> Self {
        Self {
            settings,
            mood: Mood::Happy,
            excited_until: None,
            current_speed: settings.base_speed,
        }
    }

    /// The current mood.
    pub fn mood(&self) -> Mood {
        self.mood
    }

    /// The current animation playback speed, in percent.
    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    /// When the excited override expires, if one was ever set.
    pub fn excited_until(&self) -> Option<Instant> {
        self.excited_until
    }

    /// The settings this machine was built with.
    pub fn settings(&self) -> &MoodSettings {
        &self.settings
    }

    /// Pacing interval for a warning count: `default - warnings` milliseconds,
    /// clamped to the configured bounds.
    pub fn warning_interval(&self, warning_count: u32) -> Duration {
        let default_ms = self.settings.default_interval.as_millis() as i64;
        let min_ms = self.settings.min_interval.as_millis() as i64;
        let max_ms = self.settings.max_interval.as_millis() as i64;
        let ms = (default_ms - i64::from(warning_count)).clamp(min_ms, max_ms);
        Duration::from_millis(ms as u64)
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        match self.excited_until {
            Some(until) => now >= until,
            None => true,
        }
    }

    /// Switch to `mood`, resetting visuals when it differs from the current one.
    fn commit(&mut self, mood: Mood, pacing: PacingDirective) -> Outcome {
        let previous = self.mood;
        let visuals_reset = previous != mood;
        if visuals_reset {
            self.current_speed = self.settings.base_speed;
        }
        self.mood = mood;
        Outcome {
            previous,
            mood,
            committed: true,
            visuals_reset,
            pacing,
        }
    }

    /// Apply a diagnostics poll result.
    pub fn on_diagnostics(&mut self, result: DiagnosticsResult, now: Instant) -> Outcome {
        if self.mood == Mood::Asleep {
            debug!(?result, "ignoring diagnostics while asleep");
            return Outcome::unchanged(self.mood);
        }

        let (candidate, speed, pacing) = if result.error_count > 0 {
            (Mood::Panic, None, PacingDirective::Suspend)
        } else if result.warning_count > self.settings.warning_threshold {
            (
                Mood::Warning,
                Some(self.settings.base_speed + result.warning_count as f32),
                PacingDirective::Resume {
                    interval: self.warning_interval(result.warning_count),
                },
            )
        } else {
            (
                Mood::Happy,
                Some(self.settings.base_speed),
                PacingDirective::Resume {
                    interval: self.settings.default_interval,
                },
            )
        };

        if self.mood == Mood::Excited && !self.cooldown_elapsed(now) {
            debug!(%candidate, "excited cooldown active, dropping candidate mood");
            return Outcome::unchanged(self.mood);
        }

        let outcome = self.commit(candidate, pacing);
        if let Some(speed) = speed {
            self.current_speed = speed;
        }
        outcome
    }

    /// Apply an activity poll result.
    pub fn on_activity(&mut self, result: ActivityResult, _now: Instant) -> Outcome {
        if result.is_idle {
            return self.commit(Mood::Asleep, PacingDirective::Suspend);
        }

        if self.mood == Mood::Asleep {
            let interval = self.settings.default_interval;
            return self.commit(Mood::Happy, PacingDirective::Resume { interval });
        }

        Outcome::unchanged(self.mood)
    }

    /// Apply a user interaction (drag start). Always re-arms the cooldown.
    pub fn on_user_interaction(&mut self, now: Instant) -> Outcome {
        self.excited_until = Some(now + self.settings.excited_cooldown);
        self.commit(Mood::Excited, PacingDirective::Suspend)
    }
}

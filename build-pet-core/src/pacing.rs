//! Side-to-side pacing.
//!
//! The pacer walks `step` between `0` and `max_steps`, emitting a horizontal
//! delta on every tick and turning around at each end. Suspending it keeps
//! its position so it picks up exactly where it stopped.

use crate::config::PacingConfig;
use crate::mood::PacingDirective;
use std::time::Duration;

/// Which way the pet is walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `step` is increasing.
    Forward,
    /// `step` is decreasing.
    Backward,
}

/// The pacing scheduler.
#[derive(Debug, Clone)]
pub struct Pacer {
    step: u32,
    max_steps: u32,
    direction: Direction,
    move_offset: i32,
    interval: Duration,
    suspended: bool,
}

impl Pacer {
    /// Create a pacer at step 0, walking forward at the default interval.
    pub fn new(config: &PacingConfig) -> Self {
        Self {
            step: 0,
            max_steps: config.max_steps.max(1),
            direction: Direction::Forward,
            move_offset: config.move_offset,
            interval: config.default_interval,
            suspended: false,
        }
    }

    /// Current position in the sweep, from 0 to `max_steps`.
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Direction of the next step.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Signed pixel offset the next tick emits.
    pub fn move_offset(&self) -> i32 {
        self.move_offset
    }

    /// Time between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether ticks are paused.
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Pause pacing. Position and direction are kept.
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Resume pacing at the given interval.
    pub fn resume(&mut self, interval: Duration) {
        self.suspended = false;
        self.interval = interval;
    }

    /// Apply a directive from the mood machine.
    ///
    /// Returns `true` if the tick interval changed, so the caller can re-arm
    /// its timer.
    pub fn apply(&mut self, directive: PacingDirective) -> bool {
        match directive {
            PacingDirective::Keep => false,
            PacingDirective::Suspend => {
                self.suspend();
                false
            }
            PacingDirective::Resume { interval } => {
                let changed = interval != self.interval;
                self.resume(interval);
                changed
            }
        }
    }

    /// Advance one tick and return the horizontal delta, or `None` while
    /// suspended.
    pub fn tick(&mut self) -> Option<i32> {
        if self.suspended {
            return None;
        }

        self.step = match self.direction {
            Direction::Forward => (self.step + 1).min(self.max_steps),
            Direction::Backward => self.step.saturating_sub(1),
        };
        let delta = self.move_offset;

        // Turn around at either end; the new offset applies from the next tick.
        if self.step >= self.max_steps && self.direction == Direction::Forward {
            self.direction = Direction::Backward;
            self.move_offset = -self.move_offset;
        } else if self.step == 0 && self.direction == Direction::Backward {
            self.direction = Direction::Forward;
            self.move_offset = -self.move_offset;
        }

        Some(delta)
    }
}

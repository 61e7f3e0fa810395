//! The single-owner character state.
//!
//! `CharacterState` ties the mood machine to the pacer and the asset map.
//! Every input goes through here so that a committed outcome always reaches
//! the pacer and the rendering layer together.

use crate::assets::AssetMap;
use crate::config::Config;
use crate::event::Frame;
use crate::mood::{ActivityResult, DiagnosticsResult, Mood, MoodMachine, MoodSettings, Outcome};
use crate::pacing::Pacer;
use std::time::Instant;

/// What changed after applying one input.
#[derive(Debug, Clone)]
pub struct Update {
    /// What the mood machine decided.
    pub outcome: Outcome,
    /// A frame to draw, when asset or speed changed.
    pub frame: Option<Frame>,
    /// Whether the pacing interval changed and its timer needs re-arming.
    pub interval_changed: bool,
}

/// Mood, pacing and presentation for the one character on screen.
#[derive(Debug, Clone)]
pub struct CharacterState {
    machine: MoodMachine,
    pacer: Pacer,
    assets: AssetMap,
}

impl CharacterState {
    /// Create the startup state: happy, at step 0, pacing at the default interval.
    pub fn new(config: &Config) -> Self {
        Self {
            machine: MoodMachine::new(MoodSettings::from(config)),
            pacer: Pacer::new(&config.pacing),
            assets: config.assets.clone(),
        }
    }

    /// The committed mood.
    pub fn mood(&self) -> Mood {
        self.machine.mood()
    }

    /// The mood machine, for inspecting cooldowns and speed.
    pub fn machine(&self) -> &MoodMachine {
        &self.machine
    }

    /// The pacer, for its interval and position.
    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// The frame for the current mood and speed.
    pub fn frame(&self, position_delta: Option<(i32, i32)>) -> Frame {
        let mood = self.machine.mood();
        let asset = self.assets.get(mood);
        Frame {
            mood,
            asset: asset.asset.clone(),
            caption: asset.caption.clone(),
            playback_speed: self.machine.current_speed(),
            position_delta,
        }
    }

    /// Apply a finished diagnostics poll.
    pub fn apply_diagnostics(&mut self, result: DiagnosticsResult, now: Instant) -> Update {
        let speed_before = self.machine.current_speed();
        let outcome = self.machine.on_diagnostics(result, now);
        self.finish(outcome, speed_before)
    }

    /// Apply a finished activity poll.
    pub fn apply_activity(&mut self, result: ActivityResult, now: Instant) -> Update {
        let speed_before = self.machine.current_speed();
        let outcome = self.machine.on_activity(result, now);
        self.finish(outcome, speed_before)
    }

    /// Apply a drag start from the user.
    pub fn apply_interaction(&mut self, now: Instant) -> Update {
        let speed_before = self.machine.current_speed();
        let outcome = self.machine.on_user_interaction(now);
        self.finish(outcome, speed_before)
    }

    /// Advance pacing one tick. Returns a moving frame unless pacing is suspended.
    pub fn tick(&mut self) -> Option<Frame> {
        if self.machine.mood().suspends_pacing() {
            return None;
        }
        let dx = self.pacer.tick()?;
        Some(self.frame(Some((dx, 0))))
    }

    fn finish(&mut self, outcome: Outcome, speed_before: f32) -> Update {
        let interval_changed = self.pacer.apply(outcome.pacing);
        let speed_changed = self.machine.current_speed() != speed_before;
        let frame = (outcome.visuals_reset || speed_changed).then(|| self.frame(None));
        Update {
            outcome,
            frame,
            interval_changed,
        }
    }
}

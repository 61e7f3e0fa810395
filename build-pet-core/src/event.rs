//! Event system for the build pet.
//!
//! The orchestrator publishes everything a rendering layer needs through one
//! channel: frames to draw, mood changes, poll results, and lifecycle events.

use crate::mood::{ActivityResult, DiagnosticsResult, Mood};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Default channel buffer size.
const DEFAULT_CHANNEL_SIZE: usize = 100;

/// What the rendering layer should show right now.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Mood being shown.
    pub mood: Mood,
    /// Path or identifier of the animation for that mood.
    pub asset: PathBuf,
    /// Short text form of the mood, if the asset map has one.
    pub caption: Option<String>,
    /// Animation playback speed, in percent.
    pub playback_speed: f32,
    /// Movement to apply this frame, if any.
    pub position_delta: Option<(i32, i32)>,
}

/// Events emitted by the orchestrator.
#[derive(Debug, Clone)]
pub enum Event {
    /// The orchestrator has started; carries the initial frame.
    Started {
        /// First frame to draw.
        frame: Frame,
    },

    /// Something visible changed: asset, speed, or position.
    Frame(Frame),

    /// A mood transition was committed.
    MoodChanged {
        /// Mood before the transition.
        from: Mood,
        /// Mood after the transition.
        to: Mood,
    },

    /// A diagnostics poll reported back.
    DiagnosticsPolled {
        /// The counts that were applied.
        result: DiagnosticsResult,
    },

    /// An activity poll reported back.
    ActivityPolled {
        /// The idleness that was applied.
        result: ActivityResult,
    },

    /// The orchestrator has stopped.
    Stopped {
        /// Why it stopped.
        reason: StopReason,
    },
}

/// Reasons for the orchestrator stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The user chose Quit.
    Quit,
    /// Cancelled through a handle.
    Cancelled,
}

/// Sender for events.
pub type EventSender = mpsc::Sender<Event>;

/// Receiver for events.
pub type EventReceiver = mpsc::Receiver<Event>;

/// Create a new event channel with the default buffer size.
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_SIZE)
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Quit => write!(f, "quit"),
            StopReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

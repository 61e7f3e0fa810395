//! Build pet core library
//!
//! This crate provides the core of a desktop pet that mirrors a project's
//! build health: the diagnostics and activity pollers, the mood state
//! machine, the pacing scheduler, the event system, configuration, and the
//! orchestrator loop tying them together. Rendering is left to consumers of
//! the event channel.

pub mod activity;
pub mod assets;
pub mod command;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod mood;
pub mod orchestrator;
pub mod pacing;
pub mod state;

pub use activity::ActivityPoller;
pub use assets::{AssetMap, MoodAsset};
pub use command::{CommandOutput, ExternalCommand};
pub use config::{Config, PacingConfig, PollConfig};
pub use diagnostics::DiagnosticsPoller;
pub use error::{Error, Result};
pub use event::{Event, EventReceiver, Frame, StopReason};
pub use mood::{ActivityResult, DiagnosticsResult, Mood, MoodMachine, Outcome};
pub use orchestrator::{Input, Orchestrator, PetHandle};
pub use pacing::{Direction, Pacer};
pub use state::CharacterState;

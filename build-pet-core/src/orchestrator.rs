//! Main loop for the build pet.
//!
//! This module provides the `Orchestrator` that owns the character state and
//! three timers: the diagnostics poll, the activity poll and the pacing tick.
//! Polls run on their own tasks and report back over a channel, so a slow
//! build never stalls pacing. Results are applied in arrival order; when two
//! polls of the same kind overlap, whichever finishes last wins.
//!
//! Pacing frames are offered to the event channel without waiting. Mood
//! changes, poll results and lifecycle events are always delivered, so a
//! renderer must keep draining the channel for those to flow.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, interval_at, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::activity::ActivityPoller;
use crate::config::Config;
use crate::diagnostics::DiagnosticsPoller;
use crate::error::Result;
use crate::event::{channel, Event, EventReceiver, EventSender, Frame, StopReason};
use crate::mood::{ActivityResult, DiagnosticsResult};
use crate::state::{CharacterState, Update};

/// Buffer size for user input.
const INPUT_CHANNEL_SIZE: usize = 16;

/// Buffer size for poll results coming back from workers.
const RESULT_CHANNEL_SIZE: usize = 32;

/// User input delivered to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// The user started dragging the character.
    Interaction,
    /// The user chose Quit.
    Quit,
}

/// A finished poll, sent from a worker task back to the owner.
#[derive(Debug, Clone, Copy)]
enum PollResult {
    Diagnostics(DiagnosticsResult),
    Activity(ActivityResult),
}

/// Handle for talking to a running orchestrator.
///
/// Cheap to clone; every clone feeds the same orchestrator.
#[derive(Debug, Clone)]
pub struct PetHandle {
    cancel_flag: Arc<AtomicBool>,
    inputs: mpsc::Sender<Input>,
}

impl PetHandle {
    /// Report a drag start. Returns `false` if the input was dropped because
    /// the orchestrator is gone or its input queue is full.
    pub fn interact(&self) -> bool {
        self.send(Input::Interaction)
    }

    /// Ask the orchestrator to stop as if the user chose Quit.
    pub fn quit(&self) -> bool {
        self.send(Input::Quit)
    }

    /// Signal the orchestrator to cancel at the next opportunity.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
        // Wake the loop; the flag decides the stop reason.
        let _ = self.inputs.try_send(Input::Quit);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::SeqCst)
    }

    fn send(&self, input: Input) -> bool {
        match self.inputs.try_send(input) {
            Ok(()) => true,
            Err(e) => {
                warn!(?input, error = %e, "dropping user input");
                false
            }
        }
    }
}

/// Owns the character state and drives polls and pacing.
#[derive(Debug)]
pub struct Orchestrator {
    /// Configuration for the pet.
    config: Config,
    /// Event sender for the rendering layer.
    events: EventSender,
    /// User input from handles.
    inputs: mpsc::Receiver<Input>,
    /// Shared cancellation flag.
    cancel_flag: Arc<AtomicBool>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given configuration.
    ///
    /// Returns a tuple of (Orchestrator, EventReceiver, PetHandle).
    /// - The `Orchestrator` runs the main loop.
    /// - The `EventReceiver` delivers frames and state changes to a renderer.
    /// - The `PetHandle` feeds user input and can cancel the loop.
    ///
    /// # Examples
    ///
    /// ```
    /// use build_pet_core::{Config, Orchestrator};
    ///
    /// let config = Config::new().working_dir("/tmp");
    /// let (orchestrator, events, handle) = Orchestrator::new(config);
    ///
    /// // The handle can be cloned and sent to an input task
    /// let handle_clone = handle.clone();
    /// ```
    pub fn new(config: Config) -> (Self, EventReceiver, PetHandle) {
        let (tx, rx) = channel();
        let (input_tx, input_rx) = mpsc::channel(INPUT_CHANNEL_SIZE);
        let cancel_flag = Arc::new(AtomicBool::new(false));

        let orchestrator = Self {
            config,
            events: tx,
            inputs: input_rx,
            cancel_flag: cancel_flag.clone(),
        };

        let handle = PetHandle {
            cancel_flag,
            inputs: input_tx,
        };

        (orchestrator, rx, handle)
    }

    /// Check if cancellation has been requested.
    fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::SeqCst)
    }

    /// Run until the user quits or the handle cancels.
    ///
    /// Both polls fire once immediately and then on their own intervals.
    /// Pacing ticks at the interval the mood machine last committed.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the configuration is invalid. Nothing
    /// after startup is fatal.
    pub async fn run(mut self) -> Result<StopReason> {
        self.config.validate()?;

        let diagnostics = DiagnosticsPoller::new(&self.config.diagnostics);
        let activity = ActivityPoller::new(&self.config.activity, self.config.idle_threshold);
        let mut state = CharacterState::new(&self.config);

        let (results_tx, mut results_rx) = mpsc::channel(RESULT_CHANNEL_SIZE);

        let mut diagnostics_timer = interval(self.config.diagnostics.poll_interval);
        diagnostics_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut activity_timer = interval(self.config.activity.poll_interval);
        activity_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut pacing_timer = new_pacing_timer(state.pacer().interval());

        info!(
            project = %self.config.diagnostics.working_dir.display(),
            diagnostics = %diagnostics.command().display(),
            "build pet started"
        );
        let _ = self
            .events
            .send(Event::Started {
                frame: state.frame(None),
            })
            .await;

        let mut inputs_open = true;
        loop {
            if self.is_cancelled() {
                return Ok(self.stop(StopReason::Cancelled).await);
            }

            tokio::select! {
                _ = diagnostics_timer.tick() => {
                    let poller = diagnostics.clone();
                    let tx = results_tx.clone();
                    tokio::spawn(async move {
                        let result = poller.poll().await;
                        let _ = tx.send(PollResult::Diagnostics(result)).await;
                    });
                }
                _ = activity_timer.tick() => {
                    let poller = activity.clone();
                    let tx = results_tx.clone();
                    tokio::spawn(async move {
                        let result = poller.poll().await;
                        let _ = tx.send(PollResult::Activity(result)).await;
                    });
                }
                _ = pacing_timer.tick() => {
                    if let Some(frame) = state.tick() {
                        self.send_pacing_frame(frame);
                    }
                }
                Some(result) = results_rx.recv() => {
                    let now = std::time::Instant::now();
                    let update = match result {
                        PollResult::Diagnostics(result) => {
                            let _ = self.events.send(Event::DiagnosticsPolled { result }).await;
                            state.apply_diagnostics(result, now)
                        }
                        PollResult::Activity(result) => {
                            let _ = self.events.send(Event::ActivityPolled { result }).await;
                            state.apply_activity(result, now)
                        }
                    };
                    if self.publish(update).await {
                        pacing_timer = pacing_timer_for(&state);
                    }
                }
                input = self.inputs.recv(), if inputs_open => {
                    match input {
                        Some(Input::Interaction) => {
                            let update = state.apply_interaction(std::time::Instant::now());
                            if self.publish(update).await {
                                pacing_timer = pacing_timer_for(&state);
                            }
                        }
                        Some(Input::Quit) => {
                            let reason = if self.is_cancelled() {
                                StopReason::Cancelled
                            } else {
                                StopReason::Quit
                            };
                            return Ok(self.stop(reason).await);
                        }
                        None => {
                            debug!("all pet handles dropped, continuing without input");
                            inputs_open = false;
                        }
                    }
                }
            }
        }
    }

    /// Send the events for one update. Returns whether the pacing timer
    /// needs re-arming.
    async fn publish(&self, update: Update) -> bool {
        let outcome = update.outcome;
        if outcome.mood_changed() {
            info!(from = %outcome.previous, to = %outcome.mood, "mood changed");
            let _ = self
                .events
                .send(Event::MoodChanged {
                    from: outcome.previous,
                    to: outcome.mood,
                })
                .await;
        }
        if let Some(frame) = update.frame {
            let _ = self.events.send(Event::Frame(frame)).await;
        }
        update.interval_changed
    }

    /// Pacing frames never wait on the renderer. One that does not fit in
    /// the channel is dropped; the next tick carries on from the pacer.
    fn send_pacing_frame(&self, frame: Frame) {
        match self.events.try_send(Event::Frame(frame)) {
            Ok(()) | Err(mpsc::error::TrySendError::Closed(_)) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("event channel full, dropping pacing frame");
            }
        }
    }

    async fn stop(&self, reason: StopReason) -> StopReason {
        info!(%reason, "build pet stopped");
        let _ = self.events.send(Event::Stopped { reason }).await;
        reason
    }
}

fn pacing_timer_for(state: &CharacterState) -> Interval {
    new_pacing_timer(state.pacer().interval())
}

/// A pacing timer whose first tick is one period away.
fn new_pacing_timer(period: Duration) -> Interval {
    let mut timer = interval_at(tokio::time::Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mood::Mood;

    fn quiet_config() -> Config {
        Config::new()
            .working_dir(std::env::temp_dir())
            .diagnostics_command("true", vec![])
            .activity_script("date +%s")
    }

    #[test]
    fn test_handle_cancel() {
        let (_orchestrator, _rx, handle) = Orchestrator::new(quiet_config());
        assert!(!handle.is_cancelled());
        handle.cancel();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_handle_clone_shares_flag() {
        let (_orchestrator, _rx, handle1) = Orchestrator::new(quiet_config());
        let handle2 = handle1.clone();
        handle1.cancel();
        assert!(handle2.is_cancelled());
    }

    #[test]
    fn test_handle_reports_dropped_input() {
        let (orchestrator, _rx, handle) = Orchestrator::new(quiet_config());
        drop(orchestrator);
        assert!(!handle.interact());
    }

    #[tokio::test]
    async fn test_invalid_config_fails_fast() {
        let (orchestrator, _rx, _handle) = Orchestrator::new(quiet_config().max_steps(0));
        let result = orchestrator.run().await;
        assert!(matches!(result, Err(Error::ConfigError { .. })));
    }

    #[tokio::test]
    async fn test_cancellation_before_start() {
        let (orchestrator, mut rx, handle) = Orchestrator::new(quiet_config());
        handle.cancel();

        let reason = orchestrator.run().await.expect("should stop cleanly");
        assert_eq!(reason, StopReason::Cancelled);

        match rx.recv().await {
            Some(Event::Started { frame }) => assert_eq!(frame.mood, Mood::Happy),
            other => panic!("expected Started, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_quit_stops_loop() {
        let (orchestrator, mut rx, handle) = Orchestrator::new(quiet_config());
        assert!(handle.quit());

        let reason = orchestrator.run().await.expect("should stop cleanly");
        assert_eq!(reason, StopReason::Quit);

        let mut stopped = None;
        while let Some(event) = rx.recv().await {
            if let Event::Stopped { reason } = event {
                stopped = Some(reason);
            }
        }
        assert_eq!(stopped, Some(StopReason::Quit));
    }

    #[tokio::test]
    async fn test_pacing_frames_are_emitted() {
        let config = quiet_config()
            .pacing_interval(Duration::from_millis(10))
            .pacing_interval_bounds(Duration::from_millis(5), Duration::from_millis(10));
        let (orchestrator, mut rx, handle) = Orchestrator::new(config);
        let task = tokio::spawn(orchestrator.run());

        let mut deltas = Vec::new();
        while deltas.len() < 3 {
            match rx.recv().await {
                Some(Event::Frame(frame)) => {
                    if let Some((dx, _)) = frame.position_delta {
                        deltas.push(dx);
                    }
                }
                Some(_) => {}
                None => break,
            }
        }
        handle.cancel();
        drop(rx);

        assert_eq!(deltas, vec![2, 2, 2]);
        let reason = task.await.unwrap().unwrap();
        assert_eq!(reason, StopReason::Cancelled);
    }

    #[test]
    fn test_pacing_frames_never_wait_on_a_stalled_renderer() {
        let config = quiet_config();
        let state = CharacterState::new(&config);
        let (orchestrator, mut rx, _handle) = Orchestrator::new(config);

        for _ in 0..250 {
            orchestrator.send_pacing_frame(state.frame(Some((2, 0))));
        }

        let mut queued = 0;
        while let Ok(event) = rx.try_recv() {
            assert!(matches!(event, Event::Frame(frame) if frame.position_delta == Some((2, 0))));
            queued += 1;
        }
        assert_eq!(queued, 100);
    }
}

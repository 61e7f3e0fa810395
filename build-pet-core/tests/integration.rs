//! Integration tests for the build pet orchestrator.
//!
//! These tests drive the full loop with small shell scripts standing in for
//! the build tool and the file-activity query, and watch the event channel
//! the way a renderer would.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use build_pet_core::{
    ActivityResult, Config, Event, EventReceiver, Mood, Orchestrator, StopReason,
};
use tokio::time::timeout;

/// A config that polls every 50ms, with the given shell scripts as the
/// build check and the activity query.
fn fast_config(diagnostics_script: &str, activity_script: &str) -> Config {
    Config::new()
        .working_dir(std::env::temp_dir())
        .diagnostics_command(
            "sh",
            vec!["-c".to_string(), diagnostics_script.to_string()],
        )
        .activity_command("sh", vec!["-c".to_string(), activity_script.to_string()])
        .diagnostics_interval(Duration::from_millis(50))
        .activity_interval(Duration::from_millis(50))
        .idle_threshold(Duration::from_secs(300))
}

/// A build check whose first run is slow and broken, and whose later runs
/// are instant and clean. Runs are counted in `counter_file`.
fn slow_first_check_script(counter_file: &str, delay_secs: f32) -> String {
    format!(
        r#"
COUNTER_FILE="{counter_file}"
if [ -f "$COUNTER_FILE" ]; then
    COUNT=$(cat "$COUNTER_FILE")
else
    COUNT=0
fi
COUNT=$((COUNT + 1))
echo "$COUNT" > "$COUNTER_FILE"

if [ "$COUNT" -eq 1 ]; then
    sleep {delay_secs}
    echo "error: first build was broken"
fi
"#
    )
}

const RECENT: &str = "date +%s";
const LONG_AGO: &str = "echo $(( $(date +%s) - 3600 ))";

async fn next_event(rx: &mut EventReceiver) -> Event {
    timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed")
}

/// Read events until the mood changes to `target`, returning the frame that
/// followed the change.
async fn wait_for_mood(rx: &mut EventReceiver, target: Mood) -> build_pet_core::Frame {
    let mut changed = false;
    loop {
        match next_event(rx).await {
            Event::MoodChanged { to, .. } if to == target => changed = true,
            Event::Frame(frame) if changed && frame.position_delta.is_none() => return frame,
            _ => {}
        }
    }
}

/// Collect every event that arrives within `window`.
async fn events_for(rx: &mut EventReceiver, window: Duration) -> Vec<Event> {
    let deadline = tokio::time::Instant::now() + window;
    let mut events = Vec::new();
    while let Ok(Some(event)) = tokio::time::timeout_at(deadline, rx.recv()).await {
        events.push(event);
    }
    events
}

fn mood_changes(events: &[Event]) -> Vec<(Mood, Mood)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::MoodChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_build_errors_cause_panic() {
    let config = fast_config("echo 'warning: unused'; echo 'error: broken' >&2; exit 101", RECENT);
    let (orchestrator, mut events, handle) = Orchestrator::new(config);
    let task = tokio::spawn(orchestrator.run());

    match next_event(&mut events).await {
        Event::Started { frame } => {
            assert_eq!(frame.mood, Mood::Happy);
            assert_eq!(frame.asset, PathBuf::from("assets/happy.gif"));
        }
        other => panic!("expected Started first, got {:?}", other),
    }

    let frame = wait_for_mood(&mut events, Mood::Panic).await;
    assert_eq!(frame.asset, PathBuf::from("assets/panic.gif"));

    // Pacing is suspended while panicking.
    let later = events_for(&mut events, Duration::from_millis(300)).await;
    assert!(later.iter().all(|e| !matches!(
        e,
        Event::Frame(frame) if frame.position_delta.is_some()
    )));

    handle.cancel();
    assert_eq!(task.await.unwrap().unwrap(), StopReason::Cancelled);
}

#[tokio::test]
async fn test_many_warnings_speed_up() {
    let script = "for i in $(seq 1 15); do echo \"warning: number $i\"; done";
    let (orchestrator, mut events, handle) = Orchestrator::new(fast_config(script, RECENT));
    let task = tokio::spawn(orchestrator.run());

    let frame = wait_for_mood(&mut events, Mood::Warning).await;
    assert!((frame.playback_speed - 115.0).abs() < f32::EPSILON);
    assert_eq!(frame.asset, PathBuf::from("assets/sad.gif"));

    // Warning still paces.
    let later = events_for(&mut events, Duration::from_millis(400)).await;
    assert!(later.iter().any(|e| matches!(
        e,
        Event::Frame(frame) if frame.position_delta.is_some()
    )));

    handle.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_idle_project_sleeps_through_errors() {
    let config = fast_config("echo 'error: still broken'", LONG_AGO);
    let (orchestrator, mut events, handle) = Orchestrator::new(config);
    let task = tokio::spawn(orchestrator.run());

    let frame = wait_for_mood(&mut events, Mood::Asleep).await;
    assert_eq!(frame.asset, PathBuf::from("assets/asleep.gif"));

    let later = events_for(&mut events, Duration::from_millis(400)).await;
    assert!(
        mood_changes(&later).is_empty(),
        "asleep pet should ignore diagnostics: {:?}",
        mood_changes(&later)
    );
    assert!(later
        .iter()
        .any(|e| matches!(e, Event::DiagnosticsPolled { result } if result.error_count == 1)));

    handle.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_interaction_is_sticky_until_cooldown() {
    let cooldown = Duration::from_millis(400);
    let config = fast_config("echo 'error: broken'", RECENT).excited_cooldown(cooldown);
    let (orchestrator, mut events, handle) = Orchestrator::new(config);
    let task = tokio::spawn(orchestrator.run());

    wait_for_mood(&mut events, Mood::Panic).await;

    let interacted_at = Instant::now();
    assert!(handle.interact());
    let frame = wait_for_mood(&mut events, Mood::Excited).await;
    assert_eq!(frame.asset, PathBuf::from("assets/excited.gif"));

    wait_for_mood(&mut events, Mood::Panic).await;
    assert!(
        interacted_at.elapsed() >= cooldown,
        "excited mood ended after {:?}, before the {:?} cooldown",
        interacted_at.elapsed(),
        cooldown
    );

    handle.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_failing_activity_query_keeps_pet_awake() {
    let config = fast_config("true", "echo 'fatal: not a git repository' >&2; exit 128");
    let (orchestrator, mut events, handle) = Orchestrator::new(config);
    let task = tokio::spawn(orchestrator.run());

    let seen = events_for(&mut events, Duration::from_millis(400)).await;
    assert!(mood_changes(&seen).is_empty());
    assert!(seen.iter().any(|e| matches!(
        e,
        Event::ActivityPolled { result } if *result == ActivityResult::awake()
    )));

    handle.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_quit_from_handle() {
    let (orchestrator, mut events, handle) = Orchestrator::new(fast_config("true", RECENT));
    let task = tokio::spawn(orchestrator.run());

    next_event(&mut events).await;
    assert!(handle.quit());

    assert_eq!(task.await.unwrap().unwrap(), StopReason::Quit);
    let rest = events_for(&mut events, Duration::from_millis(100)).await;
    assert!(matches!(
        rest.last(),
        Some(Event::Stopped {
            reason: StopReason::Quit
        })
    ));
}

#[tokio::test]
async fn test_overlapping_polls_apply_in_arrival_order() {
    let temp_dir = std::env::temp_dir().join(format!("build-pet-overlap-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&temp_dir);
    std::fs::create_dir_all(&temp_dir).expect("failed to create temp dir");
    let counter_path = temp_dir.join("counter");

    let script = slow_first_check_script(counter_path.to_str().unwrap(), 0.8);
    let (orchestrator, mut events, handle) = Orchestrator::new(fast_config(&script, RECENT));
    let task = tokio::spawn(orchestrator.run());

    // Everything up to the slow result landing.
    let mut before_panic = Vec::new();
    loop {
        let event = next_event(&mut events).await;
        if let Event::MoodChanged { from, to } = event {
            assert_eq!(from, Mood::Happy);
            assert_eq!(to, Mood::Panic, "only the slow first run reports errors");
            break;
        }
        before_panic.push(event);
    }

    // Later, faster runs arrived first and were applied first; the stale
    // broken result landed last.
    let polled: Vec<u32> = before_panic
        .iter()
        .filter_map(|e| match e {
            Event::DiagnosticsPolled { result } => Some(result.error_count),
            _ => None,
        })
        .collect();
    assert!(polled.len() >= 2, "expected fast polls before the slow one: {:?}", polled);
    let (last, earlier) = polled.split_last().unwrap();
    assert_eq!(*last, 1);
    assert!(earlier.iter().all(|errors| *errors == 0));

    // Pacing went on while the slow run was in flight.
    assert!(before_panic.iter().any(|e| matches!(
        e,
        Event::Frame(frame) if frame.position_delta.is_some()
    )));

    // The next clean result arrives after the stale one and wins again.
    wait_for_mood(&mut events, Mood::Happy).await;

    handle.cancel();
    task.await.unwrap().unwrap();
    let _ = std::fs::remove_dir_all(&temp_dir);
}

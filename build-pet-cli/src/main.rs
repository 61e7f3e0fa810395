//! Build Pet CLI - a desktop pet that mirrors your build health.

mod input;
mod render;

use anyhow::Context;
use build_pet_core::{AssetMap, Config, Event, PetHandle};
use clap::Parser;
use input::Command;
use render::{DisplayContext, TerminalRenderer};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Build Pet - a small character that reacts to your project's build.
///
/// The pet paces happily while the build is clean, worries when warnings pile
/// up, panics on errors, and falls asleep when nobody has touched the project
/// for a while. Type `drag`, `move <dx> <dy>`, `drop` or `quit` on stdin to
/// pick it up, carry it around, put it down, or close it.
#[derive(Parser, Debug)]
#[command(name = "build-pet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project directory to watch.
    #[arg(value_name = "PROJECT_DIR", default_value = ".", env = "BUILD_PET_PROJECT")]
    pub project: PathBuf,

    /// Build-check command, run in the project directory.
    ///
    /// Space-separated. Lines of its output starting with `warning:` or
    /// `error:` are counted.
    #[arg(long = "check", default_value = "cargo check", env = "BUILD_PET_CHECK")]
    pub check: String,

    /// Shell script printing the newest file modification time (epoch seconds).
    ///
    /// Defaults to a git query over tracked and untracked, non-ignored files.
    #[arg(long = "activity-script", env = "BUILD_PET_ACTIVITY_SCRIPT")]
    pub activity_script: Option<String>,

    /// Milliseconds between build checks.
    #[arg(long = "check-interval-ms", default_value = "1000", env = "BUILD_PET_CHECK_INTERVAL_MS")]
    pub check_interval_ms: u64,

    /// Milliseconds between activity checks.
    #[arg(
        long = "activity-interval-ms",
        default_value = "1000",
        env = "BUILD_PET_ACTIVITY_INTERVAL_MS",
    )]
    pub activity_interval_ms: u64,

    /// Seconds a single build check may run before it is killed.
    #[arg(long = "check-timeout", default_value = "120", env = "BUILD_PET_CHECK_TIMEOUT")]
    pub check_timeout: u64,

    /// Seconds a single activity check may run before it is killed.
    #[arg(long = "activity-timeout", default_value = "30", env = "BUILD_PET_ACTIVITY_TIMEOUT")]
    pub activity_timeout: u64,

    /// Seconds without file changes before the pet falls asleep.
    #[arg(long = "idle", default_value = "300", env = "BUILD_PET_IDLE")]
    pub idle: u64,

    /// Seconds the pet stays excited after being picked up.
    #[arg(long = "excited", default_value = "5", env = "BUILD_PET_EXCITED")]
    pub excited: u64,

    /// Warning count above which the pet starts to worry.
    #[arg(
        short = 'w',
        long = "warning-threshold",
        default_value = "10",
        env = "BUILD_PET_WARNING_THRESHOLD",
    )]
    pub warning_threshold: u32,

    /// Milliseconds between pacing steps when calm.
    #[arg(long = "pacing-interval-ms", default_value = "100", env = "BUILD_PET_PACING_INTERVAL_MS")]
    pub pacing_interval_ms: u64,

    /// Fastest pacing interval in milliseconds.
    #[arg(long = "min-pacing-ms", default_value = "20", env = "BUILD_PET_MIN_PACING_MS")]
    pub min_pacing_ms: u64,

    /// Slowest pacing interval in milliseconds.
    #[arg(long = "max-pacing-ms", default_value = "100", env = "BUILD_PET_MAX_PACING_MS")]
    pub max_pacing_ms: u64,

    /// Steps taken before the pet turns around.
    #[arg(long = "max-steps", default_value = "20", env = "BUILD_PET_MAX_STEPS")]
    pub max_steps: u32,

    /// Pixels moved per pacing step.
    #[arg(
        long = "move-offset",
        default_value = "2",
        allow_hyphen_values = true,
        env = "BUILD_PET_MOVE_OFFSET",
    )]
    pub move_offset: i32,

    /// Base animation speed in percent.
    #[arg(long = "base-speed", default_value = "100", env = "BUILD_PET_BASE_SPEED")]
    pub base_speed: f32,

    /// JSON file mapping moods to assets.
    #[arg(short = 'a', long = "assets", env = "BUILD_PET_ASSETS")]
    pub assets: Option<PathBuf>,

    /// Screen width in pixels.
    #[arg(long = "screen-width", default_value = "1920", env = "BUILD_PET_SCREEN_WIDTH")]
    pub screen_width: i32,

    /// Screen height in pixels.
    #[arg(long = "screen-height", default_value = "1080", env = "BUILD_PET_SCREEN_HEIGHT")]
    pub screen_height: i32,

    /// Size of the pet window in pixels.
    #[arg(long = "window-size", default_value = "100", env = "BUILD_PET_WINDOW_SIZE")]
    pub window_size: i32,

    /// Enable verbose output.
    ///
    /// Logs every poll result and pacing decision.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Convert CLI arguments to a Config.
    pub fn to_config(&self) -> anyhow::Result<Config> {
        let mut config = Config::new()
            .working_dir(&self.project)
            .diagnostics_command_str(&self.check)
            .diagnostics_interval(Duration::from_millis(self.check_interval_ms))
            .activity_interval(Duration::from_millis(self.activity_interval_ms))
            .diagnostics_timeout(Duration::from_secs(self.check_timeout))
            .activity_timeout(Duration::from_secs(self.activity_timeout))
            .idle_threshold(Duration::from_secs(self.idle))
            .excited_cooldown(Duration::from_secs(self.excited))
            .warning_threshold(self.warning_threshold)
            .pacing_interval(Duration::from_millis(self.pacing_interval_ms))
            .pacing_interval_bounds(
                Duration::from_millis(self.min_pacing_ms),
                Duration::from_millis(self.max_pacing_ms),
            )
            .max_steps(self.max_steps)
            .move_offset(self.move_offset)
            .base_speed(self.base_speed);

        if let Some(ref script) = self.activity_script {
            config = config.activity_script(script);
        }

        if let Some(ref path) = self.assets {
            let assets = AssetMap::load(path)?;
            config = config.assets(assets);
        }

        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read commands from stdin and forward them to the main task.
async fn read_commands(commands: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => {
                        if commands.send(command).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("{} (try drag, move <dx> <dy>, drop, quit)", e),
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stopped reading input");
                break;
            }
        }
    }
}

fn handle_command(command: Command, renderer: &mut TerminalRenderer, pet: &PetHandle) {
    match command {
        Command::DragStart => {
            renderer.begin_drag();
            pet.interact();
        }
        Command::DragMove { dx, dy } => renderer.drag_by(dx, dy),
        Command::DragEnd => renderer.end_drag(),
        Command::Quit => {
            pet.quit();
        }
    }
}

fn draw(renderer: &TerminalRenderer, newline: bool) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    if newline {
        writeln!(stdout)?;
    }
    write!(stdout, "\r{}", renderer.status_line())?;
    stdout.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.to_config()?;
    config.validate().context("invalid configuration")?;

    let display = DisplayContext::new(cli.screen_width, cli.screen_height);
    let mut renderer = TerminalRenderer::new(display, cli.window_size)
        .context("failed to acquire display resources")?;

    for path in config.assets.missing() {
        warn!(asset = %path.display(), "mood asset not found, showing its caption instead");
    }

    let (orchestrator, mut events, pet) = build_pet_core::Orchestrator::new(config);
    let pet_task = tokio::spawn(orchestrator.run());

    let (command_tx, mut commands) = mpsc::channel(16);
    tokio::spawn(read_commands(command_tx));

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(Event::Started { frame }) | Some(Event::Frame(frame)) => {
                        let changed = renderer.apply(&frame);
                        draw(&renderer, changed)?;
                    }
                    Some(Event::DiagnosticsPolled { result }) => {
                        debug!(
                            warnings = result.warning_count,
                            errors = result.error_count,
                            "build checked"
                        );
                    }
                    Some(Event::ActivityPolled { result }) => {
                        debug!(idle = result.is_idle, "activity checked");
                    }
                    Some(Event::MoodChanged { .. }) => {}
                    Some(Event::Stopped { .. }) | None => break,
                }
            }
            Some(command) = commands.recv() => {
                handle_command(command, &mut renderer, &pet);
                draw(&renderer, false)?;
            }
            _ = tokio::signal::ctrl_c() => {
                pet.cancel();
            }
        }
    }

    println!();
    let reason = pet_task.await.context("pet task failed")??;
    info!(%reason, "build pet exited");
    Ok(())
}

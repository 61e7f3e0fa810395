//! Terminal rendering for the pet.
//!
//! Stands in for the overlay window: keeps the window position on a virtual
//! screen, applies frames from the core, and draws a one-line status.

use build_pet_core::{Error, Frame, Mood, Result};
use std::path::PathBuf;

/// Space reserved at the bottom of the screen for a taskbar.
const BOTTOM_MARGIN: i32 = 30;

/// Screen geometry the renderer places the pet on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayContext {
    /// Screen width in pixels.
    pub width: i32,
    /// Screen height in pixels.
    pub height: i32,
}

impl DisplayContext {
    /// Create a display of the given size.
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// The pet window, drawn as text.
#[derive(Debug)]
pub struct TerminalRenderer {
    display: DisplayContext,
    window_size: i32,
    x: i32,
    y: i32,
    dragging: bool,
    mood: Mood,
    asset: PathBuf,
    caption: Option<String>,
    playback_speed: f32,
}

impl TerminalRenderer {
    /// Place a `window_size` square window at the bottom-right of the display.
    ///
    /// # Errors
    ///
    /// Returns `Error::DisplayError` if the window does not fit on the display.
    pub fn new(display: DisplayContext, window_size: i32) -> Result<Self> {
        if window_size <= 0 {
            return Err(Error::display_error(format!(
                "window size must be positive, got {}",
                window_size
            )));
        }
        let needed_height = window_size.saturating_add(BOTTOM_MARGIN);
        if display.width < window_size || display.height < needed_height {
            return Err(Error::display_error(format!(
                "a {}x{} window does not fit on a {}x{} screen",
                window_size, window_size, display.width, display.height
            )));
        }

        Ok(Self {
            display,
            window_size,
            x: display.width - window_size,
            y: display.height - window_size - BOTTOM_MARGIN,
            dragging: false,
            mood: Mood::Happy,
            asset: PathBuf::new(),
            caption: None,
            playback_speed: 0.0,
        })
    }

    /// Top-left corner of the window.
    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Apply a frame. Returns `true` if the mood or asset changed.
    pub fn apply(&mut self, frame: &Frame) -> bool {
        let changed = frame.mood != self.mood || frame.asset != self.asset;
        self.mood = frame.mood;
        self.asset = frame.asset.clone();
        self.caption = frame.caption.clone();
        self.playback_speed = frame.playback_speed;

        // The user's hand wins over pacing.
        if let Some((dx, dy)) = frame.position_delta {
            if !self.dragging {
                self.move_by(dx, dy);
            }
        }
        changed
    }

    /// The user pressed on the pet. Pacing stops moving it until the drop.
    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    /// Move with the pointer while dragging. Ignored otherwise.
    pub fn drag_by(&mut self, dx: i32, dy: i32) {
        if self.dragging {
            self.move_by(dx, dy);
        }
    }

    /// The user let go.
    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    fn move_by(&mut self, dx: i32, dy: i32) {
        let max_x = self.display.width - self.window_size;
        let max_y = self.display.height - self.window_size;
        self.x = self.x.saturating_add(dx).clamp(0, max_x);
        self.y = self.y.saturating_add(dy).clamp(0, max_y);
    }

    /// The status line for the current state.
    pub fn status_line(&self) -> String {
        let face = self.caption.as_deref().unwrap_or_else(|| self.mood.as_str());
        format!(
            "{:<10} {:<8} at ({:>4}, {:>4})  speed {:>3.0}%  [{}]",
            face,
            self.mood,
            self.x,
            self.y,
            self.playback_speed,
            self.asset.display()
        )
    }
}

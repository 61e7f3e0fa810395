//! Text commands standing in for mouse input.
//!
//! One command per line on stdin:
//!
//! - `drag` - press on the pet (drag start)
//! - `move <dx> <dy>` - drag by a delta
//! - `drop` - release (drag end)
//! - `quit` - the context menu's Quit action

use std::str::FromStr;

/// A parsed input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    DragStart,
    DragMove { dx: i32, dy: i32 },
    DragEnd,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = match words.next() {
            Some("drag") | Some("d") => Command::DragStart,
            Some("drop") => Command::DragEnd,
            Some("quit") | Some("q") => Command::Quit,
            Some("move") | Some("m") => {
                let mut delta = || -> Result<i32, String> {
                    let word = words.next().ok_or("move needs <dx> <dy>")?;
                    word.parse::<i32>()
                        .map_err(|e| format!("bad delta '{}': {}", word, e))
                };
                let dx = delta()?;
                let dy = delta()?;
                Command::DragMove { dx, dy }
            }
            Some(other) => return Err(format!("unknown command '{}'", other)),
            None => return Err("empty command".to_string()),
        };
        Ok(command)
    }
}

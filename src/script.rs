//! Pointer scripts: JSON-lines files replayed through a session.
//!
//! One event per line, tagged by `type`:
//!
//! ```text
//! {"type":"tool","tool":"rect"}
//! {"type":"down","x":20,"y":20}
//! {"type":"up","x":80,"y":60}
//! {"type":"upload","path":"photo.png"}
//! {"type":"predict"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::path::PathBuf;

use canvas::{CanvasError, Key, Point, Rgb, Tool, WheelDelta};
use serde::Deserialize;

use crate::session::Command;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("line {line}: {source}")]
    Parse { line: usize, source: serde_json::Error },

    #[error("line {line}: {source}")]
    Color { line: usize, source: CanvasError },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    Leave { x: f64, y: f64 },
    Wheel {
        x: f64,
        y: f64,
        #[serde(default)]
        dx: f64,
        dy: f64,
    },
    Key { key: String },
    Tool { tool: Tool },
    Color { color: String },
    LineWidth { width: f64 },
    ArmCrop,
    DisarmCrop,
    ZoomIn,
    ZoomOut,
    Clear,
    Resize { width: u32, height: u32 },
    Upload { path: PathBuf },
    Predict,
}

/// What the driver does for one script line.
#[derive(Debug)]
pub enum Step {
    /// Forward to the session as-is.
    Send(Command),
    /// Read the file and upload its bytes, then wait for the decode.
    Upload(PathBuf),
    /// Submit for prediction and wait for the outcome.
    Predict,
}

/// Parse a whole script. Line numbers in errors are 1-based.
///
/// # Errors
///
/// Returns [`ScriptError`] for the first malformed line.
pub fn parse(text: &str) -> Result<Vec<(usize, ScriptEvent)>, ScriptError> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line, raw)| {
            serde_json::from_str(raw)
                .map(|event| (line, event))
                .map_err(|source| ScriptError::Parse { line, source })
        })
        .collect()
}

impl ScriptEvent {
    /// # Errors
    ///
    /// Returns [`ScriptError::Color`] when a color event is not `#rrggbb`.
    pub fn into_step(self, line: usize) -> Result<Step, ScriptError> {
        let command = match self {
            Self::Down { x, y } => Command::PointerDown(Point::new(x, y)),
            Self::Move { x, y } => Command::PointerMove(Point::new(x, y)),
            Self::Up { x, y } => Command::PointerUp(Point::new(x, y)),
            Self::Leave { x, y } => Command::PointerLeave(Point::new(x, y)),
            Self::Wheel { x, y, dx, dy } => Command::Wheel { at: Point::new(x, y), delta: WheelDelta { dx, dy } },
            Self::Key { key } => Command::KeyDown(Key(key)),
            Self::Tool { tool } => Command::SetTool(tool),
            Self::Color { color } => {
                Command::SetColor(color.parse::<Rgb>().map_err(|source| ScriptError::Color { line, source })?)
            }
            Self::LineWidth { width } => Command::SetLineWidth(width),
            Self::ArmCrop => Command::ArmCrop,
            Self::DisarmCrop => Command::DisarmCrop,
            Self::ZoomIn => Command::ZoomIn,
            Self::ZoomOut => Command::ZoomOut,
            Self::Clear => Command::Clear,
            Self::Resize { width, height } => Command::Resize { width, height },
            Self::Upload { path } => return Ok(Step::Upload(path)),
            Self::Predict => return Ok(Step::Predict),
        };
        Ok(Step::Send(command))
    }
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;

//! Input model: tools, stroke color, and the interaction-mode state machine.
//!
//! `Tool` and `UiState` capture what the user has selected between gestures.
//! `Mode` is the single gesture tracked between pointer-down and pointer-up,
//! carrying the context needed to apply incremental motion and to finalize
//! on release. Exactly one variant is live at a time, so combinations like
//! dragging while cropping cannot be expressed.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_LINE_WIDTH;
use crate::error::CanvasError;
use crate::geom::{Point, Rect};

/// Which drawing tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Freehand pen (default).
    #[default]
    Pen,
    /// Rectangle outline dragged from a corner.
    Rect,
    /// Circle outline dragged from its center.
    Circle,
}

impl Tool {
    /// The outline shape this tool produces, or `None` for the pen.
    #[must_use]
    pub fn shape(self) -> Option<Shape> {
        match self {
            Self::Pen => None,
            Self::Rect => Some(Shape::Rect),
            Self::Circle => Some(Shape::Circle),
        }
    }
}

/// Outline shapes committed on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Rect,
    Circle,
}

/// Opaque stroke color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = CanvasError;

    /// Parse `#rrggbb` (the leading `#` is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(CanvasError::InvalidColor(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| CanvasError::InvalidColor(s.to_string()))
        };
        Ok(Self { r: channel(0..2)?, g: channel(2..4)?, b: channel(4..6)? })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the host (e.g. `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Persistent UI state that survives between gestures.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    /// Currently active drawing tool.
    pub tool: Tool,
    /// Stroke color for pen and shapes.
    pub color: Rgb,
    /// Stroke width in buffer units.
    pub line_width: f64,
    /// Whether the next pointer-down on an image starts a crop.
    pub crop_armed: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self { tool: Tool::default(), color: Rgb::BLACK, line_width: DEFAULT_LINE_WIDTH, crop_armed: false }
    }
}

/// The interaction mode, resolved once per pointer-down and held until pointer-up.
#[derive(Debug, Clone, Default)]
pub enum Mode {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Freehand pen stroke. Segments are rasterized as they arrive.
    Freehand {
        /// Every sampled point since pointer-down, origin first.
        points: Vec<Point>,
    },
    /// Rectangle or circle being sized; previewed, not committed, until release.
    Shape {
        shape: Shape,
        /// Pointer-down position: rectangle corner or circle center.
        start: Point,
        /// Most recent pointer position.
        current: Point,
    },
    /// Moving the active image.
    ///
    /// The placement follows the pointer delta so the grab point stays under
    /// the pointer. This intentionally differs from re-centering the image on
    /// the pointer, which would make it jump on the first motion sample.
    DraggingImage {
        /// Pointer position at the previous event, used to compute the delta.
        last: Point,
    },
    /// Dragging the active image's bottom-right handle.
    ResizingImage,
    /// Selecting a region of the active image to keep.
    Cropping {
        /// Pointer-down position.
        start: Point,
        /// Normalized selection; `None` until the first motion sample.
        rect: Option<Rect>,
    },
}

/// Fieldless discriminant of [`Mode`], for assertions and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Idle,
    Freehand,
    Shape,
    DraggingImage,
    ResizingImage,
    Cropping,
}

impl Mode {
    #[must_use]
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Idle => ModeKind::Idle,
            Self::Freehand { .. } => ModeKind::Freehand,
            Self::Shape { .. } => ModeKind::Shape,
            Self::DraggingImage { .. } => ModeKind::DraggingImage,
            Self::ResizingImage => ModeKind::ResizingImage,
            Self::Cropping { .. } => ModeKind::Cropping,
        }
    }

    /// Whether this gesture depends on the active image staying put.
    #[must_use]
    pub fn targets_image(&self) -> bool {
        matches!(self, Self::DraggingImage { .. } | Self::ResizingImage | Self::Cropping { .. })
    }

    /// The crop selection to overlay, if a crop gesture is in progress.
    #[must_use]
    pub fn crop_overlay(&self) -> Option<Rect> {
        match self {
            Self::Cropping { rect, .. } => *rect,
            _ => None,
        }
    }
}

//! Shared numeric constants for the canvas crate.

use crate::geom::Point;

// ── Hit-testing ─────────────────────────────────────────────────

/// Side of the square resize handle at the image's bottom-right corner, in buffer units.
pub const HANDLE_SIZE: f64 = 10.0;

// ── Image transform ─────────────────────────────────────────────

/// Lower bound for the image scale factor; keeps sizing from collapsing or inverting.
pub const MIN_IMAGE_SCALE: f64 = 0.1;

/// Multiplicative step for one zoom-in / zoom-out increment.
pub const ZOOM_STEP: f64 = 1.1;

/// Smallest extent an image may be rasterized at, in buffer units.
pub const MIN_IMAGE_EXTENT: f64 = 1.0;

/// Where a freshly uploaded image is placed.
pub const DEFAULT_IMAGE_ORIGIN: Point = Point { x: 50.0, y: 50.0 };

// ── Strokes ─────────────────────────────────────────────────────

/// Default pen width in buffer units.
pub const DEFAULT_LINE_WIDTH: f64 = 3.0;

/// Crop outline dash pattern (on, off) in buffer units.
pub const CROP_DASH: [f32; 2] = [6.0, 4.0];

/// Crop outline width in buffer units.
pub const CROP_OUTLINE_WIDTH: f32 = 2.0;

/// Crop outline color (RGB).
pub const CROP_OUTLINE_RGB: [u8; 3] = [0x25, 0x63, 0xeb];

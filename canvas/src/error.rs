//! Error type for the canvas crate.
//!
//! Geometry problems never surface here: degenerate gestures are clamped or
//! ignored by the engine. Only buffer allocation and codec work can fail.

/// Errors produced by buffer allocation, image decode, and export encode.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// A buffer or bitmap was requested with a zero or oversized dimension.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Uploaded bytes could not be decoded as a raster image.
    #[error("image decode failed: {0}")]
    Decode(String),

    /// The buffer could not be encoded for export.
    #[error("image encode failed: {0}")]
    Encode(String),

    /// A color string was not of the form `#rrggbb`.
    #[error("invalid color: {0}")]
    InvalidColor(String),
}

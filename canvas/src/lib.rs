//! Raster canvas engine for the whiteboard.
//!
//! This crate owns the drawing surface: translating pointer input into
//! strokes, shapes and image transforms, keeping committed strokes in a
//! snapshot that survives redraws, and encoding the result for export. The
//! host is responsible only for feeding events in order and presenting the
//! buffer when an [`engine::Action::RenderNeeded`] comes back.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | The [`engine::Engine`] surface and its pointer handlers |
//! | [`input`] | Tools, stroke color, and the interaction [`input::Mode`] |
//! | [`hit`] | Resize-handle and body hit-testing against the active image |
//! | [`bitmap`] | Active image placement/scale, decoding, and crop |
//! | [`render`] | Layer composition and stroke rasterization |
//! | [`raster`] | The raster buffer and PNG/JPEG encoding |
//! | [`geom`] | Points and rectangles in buffer coordinates |
//! | [`consts`] | Shared numeric constants (handle size, scale floor, etc.) |
//! | [`error`] | [`error::CanvasError`] |

pub mod bitmap;
pub mod consts;
pub mod engine;
pub mod error;
pub mod geom;
pub mod hit;
pub mod input;
pub mod raster;
pub mod render;

pub use bitmap::{ActiveImage, decode_image};
pub use engine::{Action, Engine};
pub use error::CanvasError;
pub use geom::{Point, Rect};
pub use input::{Key, Mode, ModeKind, Rgb, Tool, WheelDelta};
pub use raster::RasterBuffer;
pub use tiny_skia::Pixmap;

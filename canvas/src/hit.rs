#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::bitmap::ActiveImage;
use crate::consts::HANDLE_SIZE;
use crate::geom::{Point, Rect};

/// Which part of the active image was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageHit {
    /// The square handle at the bottom-right corner.
    ResizeHandle,
    /// Anywhere else inside the effective bounding box.
    Body,
}

/// The resize handle: a `HANDLE_SIZE` square inside the bottom-right corner of `bounds`.
#[must_use]
pub fn handle_rect(bounds: Rect) -> Rect {
    Rect::new(bounds.right() - HANDLE_SIZE, bounds.bottom() - HANDLE_SIZE, HANDLE_SIZE, HANDLE_SIZE)
}

/// Test `pt` against the image's effective (scaled) bounds, handle first.
#[must_use]
pub fn hit_test(pt: Point, image: &ActiveImage) -> Option<ImageHit> {
    let bounds = image.effective_rect();
    if handle_rect(bounds).contains(pt) {
        Some(ImageHit::ResizeHandle)
    } else if bounds.contains(pt) {
        Some(ImageHit::Body)
    } else {
        None
    }
}

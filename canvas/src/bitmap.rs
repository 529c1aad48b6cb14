//! The active image: a decoded bitmap plus its placement and scale.
//!
//! The bitmap is never resampled in place. Dragging, resizing and zooming
//! only change `placement` and `scale`; the single resampling step happens
//! at composite time, or once per crop when a new bitmap is cut from the
//! native pixels.

#[cfg(test)]
#[path = "bitmap_test.rs"]
mod bitmap_test;

use tiny_skia::{ColorU8, FilterQuality, IntSize, Pixmap, PixmapPaint, Transform};

use crate::consts::{MIN_IMAGE_EXTENT, MIN_IMAGE_SCALE};
use crate::error::CanvasError;
use crate::geom::{Point, Rect};

/// Decode any raster format the `image` crate understands into a premultiplied bitmap.
///
/// # Errors
///
/// Returns [`CanvasError::Decode`] for corrupt or unsupported bytes.
pub fn decode_image(bytes: &[u8]) -> Result<Pixmap, CanvasError> {
    let rgba = image::load_from_memory(bytes)
        .map_err(|e| CanvasError::Decode(e.to_string()))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    let data: Vec<u8> = rgba
        .pixels()
        .flat_map(|p| {
            let [r, g, b, a] = p.0;
            let c = ColorU8::from_rgba(r, g, b, a).premultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    let size = IntSize::from_wh(width, height).ok_or(CanvasError::InvalidDimensions { width, height })?;
    Pixmap::from_vec(data, size).ok_or(CanvasError::InvalidDimensions { width, height })
}

/// Paint used whenever the bitmap is resampled.
pub(crate) fn smooth_paint() -> PixmapPaint {
    PixmapPaint { quality: FilterQuality::Bicubic, ..PixmapPaint::default() }
}

/// A bitmap composited above the stroke layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveImage {
    bitmap: Pixmap,
    /// Unscaled box the bitmap is drawn into, in buffer coordinates.
    pub placement: Rect,
    scale: f64,
}

impl ActiveImage {
    #[must_use]
    pub fn new(bitmap: Pixmap, placement: Rect) -> Self {
        Self { bitmap, placement, scale: 1.0 }
    }

    /// Place `bitmap` at `origin` at its native size.
    #[must_use]
    pub fn at(bitmap: Pixmap, origin: Point) -> Self {
        let placement = Rect::new(origin.x, origin.y, f64::from(bitmap.width()), f64::from(bitmap.height()));
        Self::new(bitmap, placement)
    }

    #[must_use]
    pub fn bitmap(&self) -> &Pixmap {
        &self.bitmap
    }

    #[must_use]
    pub fn native_size(&self) -> (u32, u32) {
        (self.bitmap.width(), self.bitmap.height())
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Set the scale factor, floored at [`MIN_IMAGE_SCALE`]. Non-finite input is ignored.
    /// Returns the scale now in effect.
    pub fn set_scale(&mut self, scale: f64) -> f64 {
        if scale.is_finite() {
            self.scale = scale.max(MIN_IMAGE_SCALE);
        }
        self.scale
    }

    /// Placement with `scale` applied to width and height. Used for hit-testing.
    #[must_use]
    pub fn effective_rect(&self) -> Rect {
        Rect::new(
            self.placement.x,
            self.placement.y,
            self.placement.width * self.scale,
            self.placement.height * self.scale,
        )
    }

    /// Effective rect with extents clamped so rasterization never sees zero or negative sizes.
    #[must_use]
    pub fn raster_rect(&self) -> Rect {
        self.effective_rect().clamped(MIN_IMAGE_EXTENT)
    }

    /// Maps native bitmap pixels onto the buffer.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_buffer_transform(&self) -> Transform {
        let shown = self.raster_rect();
        let sx = shown.width / f64::from(self.bitmap.width());
        let sy = shown.height / f64::from(self.bitmap.height());
        Transform::from_row(sx as f32, 0.0, 0.0, sy as f32, shown.x as f32, shown.y as f32)
    }

    /// Cut a new image out of the region `rect` (buffer coordinates).
    ///
    /// The region is mapped back into native bitmap space, so repeated crops
    /// always sample the original pixels. The result is exactly `rect` in
    /// size, sits where `rect` was drawn, and starts at scale 1. Returns
    /// `None` when `rect` is degenerate.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn crop(&self, rect: Rect) -> Option<ActiveImage> {
        if rect.is_degenerate() {
            return None;
        }
        let out_w = rect.width.round() as u32;
        let out_h = rect.height.round() as u32;
        let mut out = Pixmap::new(out_w, out_h)?;

        // Buffer units -> native pixels.
        let shown = self.raster_rect();
        let kx = f64::from(self.bitmap.width()) / shown.width;
        let ky = f64::from(self.bitmap.height()) / shown.height;
        let src_x = (rect.x - shown.x) * kx;
        let src_y = (rect.y - shown.y) * ky;

        // Native pixels -> output pixels.
        let ax = f64::from(out_w) / (rect.width * kx);
        let ay = f64::from(out_h) / (rect.height * ky);
        let transform =
            Transform::from_row(ax as f32, 0.0, 0.0, ay as f32, (-src_x * ax) as f32, (-src_y * ay) as f32);
        out.draw_pixmap(0, 0, self.bitmap.as_ref(), &smooth_paint(), transform, None);

        tracing::debug!(
            src_x,
            src_y,
            width = out_w,
            height = out_h,
            "cropped image"
        );
        let placement = Rect::new(rect.x, rect.y, f64::from(out_w), f64::from(out_h));
        Some(ActiveImage::new(out, placement))
    }
}

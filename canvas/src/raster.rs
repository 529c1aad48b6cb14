//! The raster buffer: the opaque pixel surface every gesture ultimately lands on.
//!
//! Pixels are stored premultiplied (as tiny-skia requires). Everything that
//! leaves this module, whether a sampled pixel or an encoded export, is
//! demultiplied back to straight RGBA.

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use tiny_skia::{Color, Pixmap};

use crate::error::CanvasError;

/// Opaque white, straight RGBA.
pub const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Allocate a `width` x `height` pixmap filled with opaque white.
///
/// # Errors
///
/// Returns [`CanvasError::InvalidDimensions`] for zero or oversized dimensions.
pub fn blank_pixmap(width: u32, height: u32) -> Result<Pixmap, CanvasError> {
    let mut pixmap = Pixmap::new(width, height).ok_or(CanvasError::InvalidDimensions { width, height })?;
    pixmap.fill(Color::WHITE);
    Ok(pixmap)
}

/// The canvas pixel surface.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBuffer {
    pixmap: Pixmap,
}

impl RasterBuffer {
    /// Allocate a white buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDimensions`] for zero or oversized dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        Ok(Self { pixmap: blank_pixmap(width, height)? })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Overwrite every pixel with opaque white.
    pub fn fill_background(&mut self) {
        self.pixmap.fill(Color::WHITE);
    }

    /// Straight-alpha RGBA at `(x, y)`, or `None` outside the buffer.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        // Pixmap::pixel only bounds-checks the flat index, so x would wrap rows.
        if x >= self.width() || y >= self.height() {
            return None;
        }
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
    }

    /// Whether every pixel equals `rgba`.
    #[must_use]
    pub fn is_uniform(&self, rgba: [u8; 4]) -> bool {
        self.pixmap.pixels().iter().all(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()] == rgba
        })
    }

    #[must_use]
    pub fn is_uniform_white(&self) -> bool {
        self.is_uniform(WHITE)
    }

    /// Copy the buffer out as a straight-alpha `RgbaImage`.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Encode`] if the pixel data does not match the dimensions.
    pub fn to_rgba_image(&self) -> Result<RgbaImage, CanvasError> {
        let data: Vec<u8> = self
            .pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        RgbaImage::from_raw(self.width(), self.height(), data)
            .ok_or_else(|| CanvasError::Encode("pixel data does not match buffer size".into()))
    }

    /// Lossless PNG of the whole buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Encode`] if the encoder fails.
    pub fn encode_png(&self) -> Result<Vec<u8>, CanvasError> {
        let image = DynamicImage::ImageRgba8(self.to_rgba_image()?);
        write_image(&image, ImageOutputFormat::Png)
    }

    /// Lossy JPEG of the whole buffer. `quality` is clamped to 1..=100.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Encode`] if the encoder fails.
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, CanvasError> {
        // JPEG carries no alpha; the buffer is opaque anyway.
        let image = DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(self.to_rgba_image()?).to_rgb8());
        write_image(&image, ImageOutputFormat::Jpeg(quality.clamp(1, 100)))
    }
}

fn write_image(image: &DynamicImage, format: ImageOutputFormat) -> Result<Vec<u8>, CanvasError> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).map_err(|e| CanvasError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

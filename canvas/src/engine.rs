use std::borrow::Cow;

use tiny_skia::{Pixmap, PixmapPaint, Transform};
use tracing::debug;

use crate::bitmap::ActiveImage;
use crate::consts::{DEFAULT_IMAGE_ORIGIN, MIN_IMAGE_EXTENT, ZOOM_STEP};
use crate::error::CanvasError;
use crate::geom::{Point, Rect};
use crate::hit::{self, ImageHit};
use crate::input::{Key, Mode, Rgb, Tool, UiState, WheelDelta};
use crate::raster::RasterBuffer;
use crate::render::{self, StrokeStyle};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

const CURSOR_DEFAULT: &str = "default";
const CURSOR_DRAW: &str = "crosshair";
const CURSOR_MOVE: &str = "move";
const CURSOR_RESIZE: &str = "nwse-resize";

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The buffer changed; the host should present it.
    RenderNeeded,
    SetCursor(String),
    /// A stroke or shape was committed to the stroke snapshot.
    SnapshotCommitted,
    /// The active image was replaced by a crop of the given native size.
    ImageCropped { width: u32, height: u32 },
}

/// The canvas surface: raster buffer, stroke snapshot, active image, and
/// the interaction mode that routes pointer input between them.
///
/// Every method runs to completion on the caller's thread. Hosts that
/// receive input from several sources must funnel it through one queue.
#[derive(Debug, Clone)]
pub struct Engine {
    buffer: RasterBuffer,
    /// Committed strokes only. Never contains image pixels or overlays.
    snapshot: Option<Pixmap>,
    image: Option<ActiveImage>,
    pub ui: UiState,
    pub mode: Mode,
    cursor: String,
}

impl Engine {
    /// Create a surface with a white `width` x `height` buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDimensions`] for zero or oversized dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        Ok(Self {
            buffer: RasterBuffer::new(width, height)?,
            snapshot: None,
            image: None,
            ui: UiState::default(),
            mode: Mode::Idle,
            cursor: CURSOR_DEFAULT.to_string(),
        })
    }

    // --- Tool / style ---

    pub fn set_tool(&mut self, tool: Tool) {
        self.ui.tool = tool;
    }

    pub fn set_color(&mut self, color: Rgb) {
        self.ui.color = color;
    }

    /// Set the stroke width. Non-positive or non-finite widths are ignored.
    pub fn set_line_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.ui.line_width = width;
        }
    }

    /// Make the next pointer-down on the active image start a crop.
    pub fn arm_crop(&mut self) {
        self.ui.crop_armed = true;
    }

    pub fn disarm_crop(&mut self) {
        self.ui.crop_armed = false;
    }

    // --- Image ---

    /// Show `bitmap` at the default origin at its native size.
    pub fn upload_image(&mut self, bitmap: Pixmap) -> Vec<Action> {
        self.place_image(ActiveImage::at(bitmap, DEFAULT_IMAGE_ORIGIN))
    }

    /// Replace the active image. An in-flight drag, resize or crop of the old
    /// image is abandoned; drawing gestures continue.
    pub fn place_image(&mut self, image: ActiveImage) -> Vec<Action> {
        if self.mode.targets_image() {
            debug!(mode = ?self.mode.kind(), "image replaced mid-gesture; gesture abandoned");
            self.mode = Mode::Idle;
        }
        debug!(
            width = image.native_size().0,
            height = image.native_size().1,
            x = image.placement.x,
            y = image.placement.y,
            "image placed"
        );
        self.image = Some(image);
        self.redraw();
        vec![Action::RenderNeeded]
    }

    /// Set the image scale (floored at the minimum). No-op without an image.
    pub fn set_image_scale(&mut self, scale: f64) -> Vec<Action> {
        let Some(image) = &mut self.image else {
            return Vec::new();
        };
        image.set_scale(scale);
        self.redraw();
        vec![Action::RenderNeeded]
    }

    pub fn zoom_image_in(&mut self) -> Vec<Action> {
        let scale = self.image.as_ref().map_or(1.0, ActiveImage::scale);
        self.set_image_scale(scale * ZOOM_STEP)
    }

    pub fn zoom_image_out(&mut self) -> Vec<Action> {
        let scale = self.image.as_ref().map_or(1.0, ActiveImage::scale);
        self.set_image_scale(scale / ZOOM_STEP)
    }

    // --- Surface ---

    /// Wipe everything: buffer back to white, no image, no snapshot, no gesture.
    pub fn clear(&mut self) -> Vec<Action> {
        self.buffer.fill_background();
        self.snapshot = None;
        self.image = None;
        self.mode = Mode::Idle;
        self.ui.crop_armed = false;
        debug!("canvas cleared");
        vec![Action::RenderNeeded]
    }

    /// Reallocate the buffer, carrying the stroke snapshot and active image over.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDimensions`] for zero or oversized dimensions;
    /// the existing buffer is left untouched in that case.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<Vec<Action>, CanvasError> {
        if width == self.buffer.width() && height == self.buffer.height() {
            return Ok(Vec::new());
        }
        let buffer = RasterBuffer::new(width, height)?;
        if let Some(old) = self.snapshot.take() {
            let mut carried = buffer.pixmap().clone();
            carried.draw_pixmap(0, 0, old.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
            self.snapshot = Some(carried);
        }
        self.buffer = buffer;
        self.redraw();
        debug!(width, height, "buffer resized");
        Ok(vec![Action::RenderNeeded])
    }

    /// Recompose the buffer from scratch: background, snapshot, image, then
    /// the live gesture preview and crop outline.
    pub fn redraw(&mut self) {
        let target = self.buffer.pixmap_mut();
        render::compose(target, self.snapshot.as_ref(), self.image.as_ref());
        let style = StrokeStyle::from(&self.ui);
        match &self.mode {
            Mode::Freehand { points } => render::stroke_polyline(target, points, &style),
            Mode::Shape { shape, start, current } => render::stroke_shape(target, *shape, *start, *current, &style),
            Mode::Cropping { rect: Some(rect), .. } => render::crop_outline(target, *rect),
            _ => {}
        }
    }

    /// Encode the buffer as PNG, without any crop outline.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Encode`] if encoding fails.
    pub fn export_png(&self) -> Result<Vec<u8>, CanvasError> {
        self.export_view().encode_png()
    }

    /// Encode the buffer as JPEG, without any crop outline.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Encode`] if encoding fails.
    pub fn export_jpeg(&self, quality: u8) -> Result<Vec<u8>, CanvasError> {
        self.export_view().encode_jpeg(quality)
    }

    fn export_view(&self) -> Cow<'_, RasterBuffer> {
        if self.mode.crop_overlay().is_none() {
            return Cow::Borrowed(&self.buffer);
        }
        let mut clean = self.buffer.clone();
        render::compose(clean.pixmap_mut(), self.snapshot.as_ref(), self.image.as_ref());
        Cow::Owned(clean)
    }

    // --- Input events ---

    /// Resolve the interaction mode for a new gesture.
    pub fn on_pointer_down(&mut self, pt: Point) -> Vec<Action> {
        let mut actions = Vec::new();
        if !matches!(self.mode, Mode::Idle) {
            // Missed pointer-up: settle the previous gesture first.
            actions.extend(self.on_pointer_up(pt));
        }
        self.mode = self.resolve_mode(pt);
        debug!(mode = ?self.mode.kind(), x = pt.x, y = pt.y, "pointer down");
        let cursor = match self.mode {
            Mode::DraggingImage { .. } => CURSOR_MOVE,
            Mode::ResizingImage => CURSOR_RESIZE,
            _ => CURSOR_DRAW,
        };
        actions.extend(self.set_cursor(cursor));
        actions
    }

    fn resolve_mode(&self, pt: Point) -> Mode {
        if let Some(image) = &self.image {
            if self.ui.crop_armed {
                return Mode::Cropping { start: pt, rect: None };
            }
            match hit::hit_test(pt, image) {
                Some(ImageHit::ResizeHandle) => return Mode::ResizingImage,
                Some(ImageHit::Body) => return Mode::DraggingImage { last: pt },
                None => {}
            }
        }
        match self.ui.tool.shape() {
            Some(shape) => Mode::Shape { shape, start: pt, current: pt },
            None => Mode::Freehand { points: vec![pt] },
        }
    }

    /// Apply motion for the active mode.
    pub fn on_pointer_move(&mut self, pt: Point) -> Vec<Action> {
        match &mut self.mode {
            Mode::Idle => return self.hover(pt),
            Mode::Freehand { points } => {
                // Only the new segment is rasterized; no full redraw.
                if let Some(&last) = points.last() {
                    let style = StrokeStyle::from(&self.ui);
                    render::stroke_segment(self.buffer.pixmap_mut(), last, pt, &style);
                }
                points.push(pt);
                return vec![Action::RenderNeeded];
            }
            Mode::Shape { current, .. } => *current = pt,
            Mode::DraggingImage { last } => {
                if let Some(image) = &mut self.image {
                    image.placement.x += pt.x - last.x;
                    image.placement.y += pt.y - last.y;
                }
                *last = pt;
            }
            Mode::ResizingImage => {
                if let Some(image) = &mut self.image {
                    // Placement is unscaled; the handle tracks the scaled corner.
                    let scale = image.scale();
                    image.placement.width = (pt.x - image.placement.x) / scale;
                    image.placement.height = (pt.y - image.placement.y) / scale;
                }
            }
            Mode::Cropping { start, rect } => *rect = Some(Rect::from_corners(*start, pt)),
        }
        self.redraw();
        vec![Action::RenderNeeded]
    }

    /// Finalize the active mode and return to idle.
    pub fn on_pointer_up(&mut self, pt: Point) -> Vec<Action> {
        let mode = std::mem::take(&mut self.mode);
        debug!(mode = ?mode.kind(), x = pt.x, y = pt.y, "pointer up");
        let mut actions = Vec::new();
        let style = StrokeStyle::from(&self.ui);
        match mode {
            Mode::Idle => return actions,
            Mode::Freehand { points } => {
                self.commit(|layer| render::stroke_polyline(layer, &points, &style));
                actions.push(Action::SnapshotCommitted);
            }
            Mode::Shape { shape, start, .. } => {
                self.commit(|layer| render::stroke_shape(layer, shape, start, pt, &style));
                actions.push(Action::SnapshotCommitted);
            }
            Mode::DraggingImage { .. } | Mode::ResizingImage => {
                if let Some(image) = &mut self.image {
                    image.placement = image.placement.clamped(MIN_IMAGE_EXTENT);
                }
            }
            Mode::Cropping { rect, .. } => {
                let cropped = rect.and_then(|r| self.image.as_ref().and_then(|image| image.crop(r)));
                if let Some(cropped) = cropped {
                    let (width, height) = cropped.native_size();
                    self.image = Some(cropped);
                    actions.push(Action::ImageCropped { width, height });
                }
                self.ui.crop_armed = false;
            }
        }
        self.redraw();
        actions.push(Action::RenderNeeded);
        actions.extend(self.set_cursor(CURSOR_DEFAULT));
        actions
    }

    /// Pointer left the surface; ends the gesture like a release.
    pub fn on_pointer_leave(&mut self, pt: Point) -> Vec<Action> {
        self.on_pointer_up(pt)
    }

    /// Wheel over the active image zooms it; elsewhere it does nothing.
    pub fn on_wheel(&mut self, pt: Point, delta: WheelDelta) -> Vec<Action> {
        let over_image = self.image.as_ref().is_some_and(|image| image.effective_rect().contains(pt));
        if !over_image || delta.dy == 0.0 {
            return Vec::new();
        }
        if delta.dy < 0.0 { self.zoom_image_in() } else { self.zoom_image_out() }
    }

    /// `Escape` disarms cropping and abandons a crop or shape preview.
    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        if key.0 != "Escape" {
            return Vec::new();
        }
        self.ui.crop_armed = false;
        if matches!(self.mode, Mode::Shape { .. } | Mode::Cropping { .. }) {
            self.mode = Mode::Idle;
            self.redraw();
            return vec![Action::RenderNeeded];
        }
        Vec::new()
    }

    // --- Queries ---

    #[must_use]
    pub fn buffer(&self) -> &RasterBuffer {
        &self.buffer
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&Pixmap> {
        self.snapshot.as_ref()
    }

    #[must_use]
    pub fn image(&self) -> Option<&ActiveImage> {
        self.image.as_ref()
    }

    // --- Internals ---

    /// Draw onto the stroke snapshot. The snapshot is built from its previous
    /// self, never from the buffer, so image pixels and previews stay out.
    fn commit(&mut self, draw: impl FnOnce(&mut Pixmap)) {
        let mut layer = self.snapshot.take().unwrap_or_else(|| {
            let mut blank = self.buffer.pixmap().clone();
            blank.fill(tiny_skia::Color::WHITE);
            blank
        });
        draw(&mut layer);
        self.snapshot = Some(layer);
    }

    fn hover(&mut self, pt: Point) -> Vec<Action> {
        let cursor = match self.image.as_ref().and_then(|image| hit::hit_test(pt, image)) {
            Some(_) if self.ui.crop_armed => CURSOR_DRAW,
            Some(ImageHit::ResizeHandle) => CURSOR_RESIZE,
            Some(ImageHit::Body) => CURSOR_MOVE,
            None => CURSOR_DEFAULT,
        };
        self.set_cursor(cursor).into_iter().collect()
    }

    fn set_cursor(&mut self, cursor: &str) -> Option<Action> {
        if self.cursor == cursor {
            return None;
        }
        self.cursor = cursor.to_string();
        Some(Action::SetCursor(self.cursor.clone()))
    }
}

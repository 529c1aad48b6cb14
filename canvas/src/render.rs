//! Rendering: composes the raster buffer from its layers.
//!
//! This module is the only place that issues tiny-skia draw calls. It receives
//! read-only views of the stroke snapshot and the active image and produces
//! pixels; it does not mutate engine state.
//!
//! Layer order for a full redraw is fixed: white background, stroke snapshot,
//! active image, then whatever gesture preview the engine adds on top. Crop
//! outlines are always drawn last and never reach the snapshot.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use tiny_skia::{
    Color, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Stroke, StrokeDash, Transform,
};

use crate::bitmap::{ActiveImage, smooth_paint};
use crate::consts::{CROP_DASH, CROP_OUTLINE_RGB, CROP_OUTLINE_WIDTH};
use crate::geom::{Point, Rect};
use crate::input::{Rgb, Shape, UiState};

/// Color and width for pen strokes and shape outlines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgb,
    pub width: f64,
}

impl From<&UiState> for StrokeStyle {
    fn from(ui: &UiState) -> Self {
        Self { color: ui.color, width: ui.line_width }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn f(v: f64) -> f32 {
    v as f32
}

fn solid_paint(color: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = true;
    paint
}

fn pen(width: f64) -> Stroke {
    Stroke { width: f(width), line_cap: LineCap::Round, line_join: LineJoin::Round, ..Stroke::default() }
}

/// Full redraw of the committed layers: white, snapshot, image.
pub fn compose(target: &mut Pixmap, snapshot: Option<&Pixmap>, image: Option<&ActiveImage>) {
    target.fill(Color::WHITE);
    if let Some(snapshot) = snapshot {
        target.draw_pixmap(0, 0, snapshot.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
    }
    if let Some(image) = image {
        composite_image(target, image);
    }
}

/// Draw `image` at its placement and scale with smoothed interpolation.
pub fn composite_image(target: &mut Pixmap, image: &ActiveImage) {
    target.draw_pixmap(0, 0, image.bitmap().as_ref(), &smooth_paint(), image.to_buffer_transform(), None);
}

/// Stroke one line segment.
pub fn stroke_segment(target: &mut Pixmap, from: Point, to: Point, style: &StrokeStyle) {
    let mut pb = PathBuilder::new();
    pb.move_to(f(from.x), f(from.y));
    pb.line_to(f(to.x), f(to.y));
    if let Some(path) = pb.finish() {
        target.stroke_path(&path, &solid_paint(style.color), &pen(style.width), Transform::identity(), None);
    }
}

/// Stroke a connected polyline. Fewer than two points draws nothing.
pub fn stroke_polyline(target: &mut Pixmap, points: &[Point], style: &StrokeStyle) {
    let [first, rest @ ..] = points else {
        return;
    };
    if rest.is_empty() {
        return;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(f(first.x), f(first.y));
    for p in rest {
        pb.line_to(f(p.x), f(p.y));
    }
    if let Some(path) = pb.finish() {
        target.stroke_path(&path, &solid_paint(style.color), &pen(style.width), Transform::identity(), None);
    }
}

/// Outline path for `shape` dragged from `start` to `end`.
///
/// Rectangles span the two corners; circles are centered on `start` with
/// radius `|end - start|`. A zero radius yields `None`.
#[must_use]
pub fn shape_path(shape: Shape, start: Point, end: Point) -> Option<Path> {
    match shape {
        Shape::Rect => {
            let r = Rect::from_corners(start, end);
            let mut pb = PathBuilder::new();
            pb.move_to(f(r.x), f(r.y));
            pb.line_to(f(r.right()), f(r.y));
            pb.line_to(f(r.right()), f(r.bottom()));
            pb.line_to(f(r.x), f(r.bottom()));
            pb.close();
            pb.finish()
        }
        Shape::Circle => {
            let radius = start.distance(end);
            if radius <= 0.0 {
                return None;
            }
            PathBuilder::from_circle(f(start.x), f(start.y), f(radius))
        }
    }
}

/// Stroke the outline of `shape`.
pub fn stroke_shape(target: &mut Pixmap, shape: Shape, start: Point, end: Point, style: &StrokeStyle) {
    if let Some(path) = shape_path(shape, start, end) {
        target.stroke_path(&path, &solid_paint(style.color), &pen(style.width), Transform::identity(), None);
    }
}

/// Dashed outline for an in-progress crop selection.
pub fn crop_outline(target: &mut Pixmap, rect: Rect) {
    let Some(path) = shape_path(Shape::Rect, rect.origin(), Point::new(rect.right(), rect.bottom())) else {
        return;
    };
    let [r, g, b] = CROP_OUTLINE_RGB;
    let stroke = Stroke {
        width: CROP_OUTLINE_WIDTH,
        dash: StrokeDash::new(CROP_DASH.to_vec(), 0.0),
        ..Stroke::default()
    };
    target.stroke_path(&path, &solid_paint(Rgb::new(r, g, b)), &stroke, Transform::identity(), None);
}

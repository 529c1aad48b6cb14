#![allow(clippy::float_cmp)]

use tiny_skia::Color;

use super::*;

fn solid(width: u32, height: u32, color: Color) -> Pixmap {
    let mut pixmap = Pixmap::new(width, height).unwrap();
    pixmap.fill(color);
    pixmap
}

fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

// =============================================================
// decode_image
// =============================================================

#[test]
fn decode_png_keeps_dimensions_and_color() {
    let pixmap = decode_image(&png_bytes(7, 3, [200, 10, 20, 255])).unwrap();
    assert_eq!((pixmap.width(), pixmap.height()), (7, 3));
    let p = pixmap.pixel(3, 1).unwrap().demultiply();
    assert_eq!((p.red(), p.green(), p.blue(), p.alpha()), (200, 10, 20, 255));
}

#[test]
fn decode_premultiplies_translucent_pixels() {
    let pixmap = decode_image(&png_bytes(1, 1, [255, 0, 0, 128])).unwrap();
    let p = pixmap.pixel(0, 0).unwrap();
    assert_eq!(p.alpha(), 128);
    assert_eq!(p.red(), 128);
}

#[test]
fn decode_rejects_garbage() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(matches!(err, CanvasError::Decode(_)));
}

#[test]
fn decode_rejects_truncated_png() {
    let bytes = png_bytes(4, 4, [0, 0, 0, 255]);
    assert!(decode_image(&bytes[..bytes.len() / 2]).is_err());
}

// =============================================================
// Placement and scale
// =============================================================

#[test]
fn at_uses_native_size() {
    let img = ActiveImage::at(solid(30, 20, Color::BLACK), Point::new(5.0, 6.0));
    assert_eq!(img.placement, Rect::new(5.0, 6.0, 30.0, 20.0));
    assert_eq!(img.scale(), 1.0);
    assert_eq!(img.native_size(), (30, 20));
}

#[test]
fn effective_rect_applies_scale() {
    let mut img = ActiveImage::new(solid(10, 10, Color::BLACK), Rect::new(10.0, 20.0, 100.0, 50.0));
    img.set_scale(2.0);
    assert_eq!(img.effective_rect(), Rect::new(10.0, 20.0, 200.0, 100.0));
}

#[test]
fn set_scale_floors_at_minimum() {
    let mut img = ActiveImage::at(solid(10, 10, Color::BLACK), Point::new(0.0, 0.0));
    assert_eq!(img.set_scale(0.0), MIN_IMAGE_SCALE);
    assert_eq!(img.set_scale(-3.0), MIN_IMAGE_SCALE);
    assert!(img.scale() > 0.0);
}

#[test]
fn set_scale_ignores_non_finite() {
    let mut img = ActiveImage::at(solid(10, 10, Color::BLACK), Point::new(0.0, 0.0));
    img.set_scale(1.5);
    assert_eq!(img.set_scale(f64::NAN), 1.5);
    assert_eq!(img.set_scale(f64::INFINITY), 1.5);
}

#[test]
fn raster_rect_clamps_negative_resize() {
    let img = ActiveImage::new(solid(10, 10, Color::BLACK), Rect::new(50.0, 50.0, -30.0, 0.0));
    let r = img.raster_rect();
    assert_eq!(r.width, MIN_IMAGE_EXTENT);
    assert_eq!(r.height, MIN_IMAGE_EXTENT);
}

// =============================================================
// crop
// =============================================================

#[test]
fn crop_produces_exact_rect_size_at_rect_origin() {
    let img = ActiveImage::at(solid(100, 100, Color::from_rgba8(255, 0, 0, 255)), Point::new(50.0, 50.0));
    let cropped = img.crop(Rect::new(60.0, 70.0, 40.0, 30.0)).unwrap();
    assert_eq!(cropped.native_size(), (40, 30));
    assert_eq!(cropped.placement, Rect::new(60.0, 70.0, 40.0, 30.0));
    assert_eq!(cropped.scale(), 1.0);
}

#[test]
fn crop_samples_source_pixels() {
    let img = ActiveImage::at(solid(100, 100, Color::from_rgba8(255, 0, 0, 255)), Point::new(50.0, 50.0));
    let cropped = img.crop(Rect::new(60.0, 70.0, 40.0, 30.0)).unwrap();
    let p = cropped.bitmap().pixel(20, 15).unwrap().demultiply();
    assert!(p.red() >= 250 && p.alpha() >= 250);
}

#[test]
fn crop_resets_scale_to_one() {
    let mut img = ActiveImage::at(solid(100, 100, Color::BLACK), Point::new(0.0, 0.0));
    img.set_scale(2.0);
    let cropped = img.crop(Rect::new(20.0, 20.0, 100.0, 50.0)).unwrap();
    assert_eq!(cropped.scale(), 1.0);
    assert_eq!(cropped.native_size(), (100, 50));
    assert_eq!(cropped.effective_rect(), Rect::new(20.0, 20.0, 100.0, 50.0));
}

#[test]
fn crop_of_scaled_image_maps_back_to_native_pixels() {
    // Left half black, right half white; shown at 2x.
    let mut bitmap = solid(100, 100, Color::WHITE);
    let mut paint = tiny_skia::Paint::default();
    paint.set_color(Color::BLACK);
    bitmap.fill_rect(tiny_skia::Rect::from_xywh(0.0, 0.0, 50.0, 100.0).unwrap(), &paint, Transform::identity(), None);
    let mut img = ActiveImage::at(bitmap, Point::new(0.0, 0.0));
    img.set_scale(2.0);

    // Buffer x in [0, 100) is native x in [0, 50): all black.
    let cropped = img.crop(Rect::new(0.0, 0.0, 80.0, 80.0)).unwrap();
    let p = cropped.bitmap().pixel(40, 40).unwrap();
    assert!(p.red() <= 5);

    // Buffer x in [120, 200) is native x in [60, 100): all white.
    let cropped = img.crop(Rect::new(120.0, 0.0, 80.0, 80.0)).unwrap();
    let p = cropped.bitmap().pixel(40, 40).unwrap();
    assert!(p.red() >= 250);
}

#[test]
fn crop_round_trip_keeps_dimensions() {
    let img = ActiveImage::at(solid(100, 100, Color::BLACK), Point::new(50.0, 50.0));
    let r = Rect::new(61.0, 72.0, 33.0, 27.0);
    let first = img.crop(r).unwrap();
    let second = first.crop(first.effective_rect()).unwrap();
    assert_eq!(second.native_size(), (33, 27));
    assert_eq!(second.placement, r);
    assert_eq!(second.scale(), 1.0);
}

#[test]
fn crop_degenerate_rect_is_none() {
    let img = ActiveImage::at(solid(10, 10, Color::BLACK), Point::new(0.0, 0.0));
    assert!(img.crop(Rect::new(2.0, 2.0, 0.0, 5.0)).is_none());
    assert!(img.crop(Rect::new(2.0, 2.0, 5.0, 0.2)).is_none());
}

#[test]
fn crop_outside_image_is_transparent() {
    let img = ActiveImage::at(solid(10, 10, Color::BLACK), Point::new(0.0, 0.0));
    let cropped = img.crop(Rect::new(20.0, 20.0, 5.0, 5.0)).unwrap();
    assert!(cropped.bitmap().pixels().iter().all(|p| p.alpha() == 0));
}

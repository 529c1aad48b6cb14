use super::*;

// =============================================================
// Allocation
// =============================================================

#[test]
fn new_buffer_is_white() {
    let buf = RasterBuffer::new(8, 6).unwrap();
    assert_eq!(buf.width(), 8);
    assert_eq!(buf.height(), 6);
    assert!(buf.is_uniform_white());
}

#[test]
fn zero_dimension_is_rejected() {
    let err = RasterBuffer::new(0, 10).unwrap_err();
    assert!(matches!(err, CanvasError::InvalidDimensions { width: 0, height: 10 }));
    assert!(RasterBuffer::new(10, 0).is_err());
}

#[test]
fn blank_pixmap_is_opaque_white() {
    let pixmap = blank_pixmap(3, 3).unwrap();
    assert!(pixmap.pixels().iter().all(|p| p.alpha() == 255 && p.red() == 255));
}

// =============================================================
// Pixel access
// =============================================================

#[test]
fn pixel_out_of_bounds_is_none() {
    let buf = RasterBuffer::new(4, 4).unwrap();
    assert_eq!(buf.pixel(4, 0), None);
    assert_eq!(buf.pixel(0, 4), None);
    assert_eq!(buf.pixel(3, 3), Some(WHITE));
}

#[test]
fn fill_background_resets_after_paint() {
    let mut buf = RasterBuffer::new(4, 4).unwrap();
    buf.pixmap_mut().fill(Color::BLACK);
    assert!(!buf.is_uniform_white());
    assert!(buf.is_uniform([0, 0, 0, 255]));
    buf.fill_background();
    assert!(buf.is_uniform_white());
}

// =============================================================
// Encoding
// =============================================================

#[test]
fn png_export_decodes_to_same_pixels() {
    let mut buf = RasterBuffer::new(5, 4).unwrap();
    buf.pixmap_mut().fill(Color::from_rgba8(10, 20, 30, 255));
    let png = buf.encode_png().unwrap();
    assert_eq!(&png[1..4], b"PNG");

    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (5, 4));
    assert_eq!(decoded.get_pixel(2, 2).0, [10, 20, 30, 255]);
}

#[test]
fn jpeg_export_has_jpeg_magic_and_dimensions() {
    let buf = RasterBuffer::new(16, 9).unwrap();
    let jpeg = buf.encode_jpeg(90).unwrap();
    assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);

    let decoded = image::load_from_memory(&jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 9));
}

#[test]
fn jpeg_quality_zero_is_clamped_not_rejected() {
    let buf = RasterBuffer::new(4, 4).unwrap();
    assert!(buf.encode_jpeg(0).is_ok());
}

use std::io::Cursor;

use super::*;

fn encode_png(width: u32, height: u32, rgba: Vec<u8>) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(width, height, rgba).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let buf = encode_png(1, 1, vec![100, 50, 200, 128]);
    let img = decode_image(&buf).unwrap();
    assert_eq!((img.width(), img.height()), (1, 1));
    assert_eq!(
        img.rgba8_premul(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_rejects_garbage() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(matches!(err, TextBlendError::Decode(_)));
}

#[test]
fn from_rgba8_checks_length() {
    assert!(BaseImage::from_rgba8(2, 2, vec![0; 15]).is_err());
    assert!(BaseImage::from_rgba8(0, 2, Vec::new()).is_err());
    assert!(BaseImage::from_rgba8(2, 2, vec![0; 16]).is_ok());
}

#[test]
fn aspect_ratio_reduces_common_shapes() {
    assert_eq!(aspect_ratio(1920, 1080), "16:9");
    assert_eq!(aspect_ratio(1080, 1920), "9:16");
    assert_eq!(aspect_ratio(1000, 1000), "1:1");
    assert_eq!(aspect_ratio(4000, 400), "10:1");
}

#[test]
fn aspect_ratio_falls_back_to_decimal() {
    assert_eq!(aspect_ratio(1001, 1000), "1.00:1");
    assert_eq!(aspect_ratio(3001, 1000), "3.00:1");
}

#[test]
fn info_reports_natural_size() {
    let img = BaseImage::from_rgba8(4, 3, vec![255; 48]).unwrap();
    assert_eq!(
        img.info(),
        ImageInfo {
            width: 4,
            height: 3,
            aspect_ratio: "4:3".to_string(),
        }
    );
}

/// JPEG whose left half is red and right half blue, tagged with EXIF `orientation`.
fn jpeg_with_orientation(width: u32, height: u32, orientation: u8) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            image::Rgb([255, 0, 0])
        } else {
            image::Rgb([0, 0, 255])
        }
    });
    let mut jpeg = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 95)
        .encode_image(&img)
        .unwrap();

    // Little-endian TIFF header with a single IFD entry: Orientation (0x0112), SHORT.
    let tiff: [u8; 26] = [
        b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00, 0x01, 0x00, 0x12, 0x01, 0x03, 0x00,
        0x01, 0x00, 0x00, 0x00, orientation, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    let mut app1 = vec![0xFF, 0xE1];
    let len = (2 + 6 + tiff.len()) as u16;
    app1.extend_from_slice(&len.to_be_bytes());
    app1.extend_from_slice(b"Exif\0\0");
    app1.extend_from_slice(&tiff);

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}

#[test]
fn exif_rotation_is_applied() {
    let img = decode_image(&jpeg_with_orientation(16, 8, 6)).unwrap();
    assert_eq!((img.width(), img.height()), (8, 16));
    assert_eq!(img.info().aspect_ratio, "1:2");

    // Rotated 90° clockwise: the red left half ends up on top.
    let px = |x: usize, y: usize| {
        let i = (y * 8 + x) * 4;
        &img.rgba8_premul()[i..i + 4]
    };
    assert!(px(4, 2)[0] > 200 && px(4, 2)[2] < 60, "{:?}", px(4, 2));
    assert!(px(4, 13)[2] > 200 && px(4, 13)[0] < 60, "{:?}", px(4, 13));
}

#[test]
fn upright_exif_keeps_dimensions() {
    let img = decode_image(&jpeg_with_orientation(16, 8, 1)).unwrap();
    assert_eq!((img.width(), img.height()), (16, 8));
}

use std::io::Cursor;

use super::*;

fn png_bytes(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn transcode_png_reports_intrinsic_dimensions() {
    let encoded = transcode_to_jpeg(&png_bytes(10, 20, [200, 10, 10, 255]), 80).unwrap();
    assert_eq!(encoded.width, 10);
    assert_eq!(encoded.height, 20);
    assert!(!encoded.jpeg_base64.starts_with("data:"));

    let jpeg = decode_base64_payload(&encoded.jpeg_base64).unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    assert_eq!(
        image::guess_format(&jpeg).unwrap(),
        image::ImageFormat::Jpeg
    );
    let back = image::load_from_memory(&jpeg).unwrap();
    assert_eq!((back.width(), back.height()), (10, 20));
}

#[test]
fn transcode_rejects_garbage() {
    let err = transcode_to_jpeg(b"definitely not an image", 80).unwrap_err();
    assert!(matches!(err, PackError::Decode(_)));
}

#[test]
fn transparent_pixels_flatten_to_black() {
    let rgb = flatten_rgba8_over_black(&[100, 50, 200, 128, 9, 9, 9, 0, 1, 2, 3, 255]);
    assert_eq!(
        rgb,
        vec![
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            0,
            0,
            0,
            1,
            2,
            3
        ]
    );
}

#[test]
fn strip_data_uri_returns_bare_payload() {
    assert_eq!(strip_data_uri("data:image/jpeg;base64,QUJD"), "QUJD");
    assert_eq!(strip_data_uri("QUJD"), "QUJD");
    assert_eq!(strip_data_uri("data:image/png;base64,"), "");
}

#[test]
fn decode_base64_payload_accepts_prefixed_and_bare() {
    assert_eq!(decode_base64_payload("QUJD").unwrap(), b"ABC");
    assert_eq!(
        decode_base64_payload("data:image/jpeg;base64,QUJD").unwrap(),
        b"ABC"
    );
    assert!(decode_base64_payload("***").is_err());
}

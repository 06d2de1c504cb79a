use super::*;

fn frame(data: Vec<u8>, premultiplied: bool) -> FrameRGBA {
    FrameRGBA {
        width: 2,
        height: 1,
        data,
        premultiplied,
    }
}

#[test]
fn unpremultiply_restores_straight_alpha() {
    let mut px = vec![64u8, 32, 0, 128, 9, 9, 9, 0, 10, 20, 30, 255];
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[0..4], &[128, 64, 0, 128]);
    assert_eq!(&px[4..8], &[0, 0, 0, 0]);
    assert_eq!(&px[8..12], &[10, 20, 30, 255]);
}

#[test]
fn encode_png_round_trips_pixels_through_decoder() {
    let f = frame(vec![64, 32, 0, 128, 255, 0, 0, 255], true);
    let png = encode_png(&f).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (2, 1));
    assert_eq!(decoded.get_pixel(0, 0).0, [128, 64, 0, 128]);
    assert_eq!(decoded.get_pixel(1, 0).0, [255, 0, 0, 255]);
}

#[test]
fn encode_png_is_deterministic() {
    let f = frame(vec![1, 2, 3, 255, 4, 5, 6, 255], false);
    assert_eq!(encode_png(&f).unwrap(), encode_png(&f).unwrap());
}

#[test]
fn encode_png_rejects_short_buffer() {
    let err = encode_png(&frame(vec![0; 4], false)).unwrap_err();
    assert!(matches!(err, QrCardError::Encode(_)));
}

#[test]
fn data_uri_has_png_prefix() {
    assert_eq!(png_data_uri(b"abc"), "data:image/png;base64,YWJj");
    assert_eq!(SUGGESTED_FILENAME, "qr-custom.png");
}

use std::io::Cursor;

use super::*;

fn red_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn ready_resolves_immediately() {
    let img = RasterImage::from_premul_rgba8(1, 1, vec![1, 2, 3, 4]).unwrap();
    let p = PendingRaster::ready(img.clone());
    assert_eq!(pollster::block_on(p.resolve()).unwrap(), img);
    assert!(p.is_resolved());
}

#[test]
fn decode_completes_on_worker() {
    let p = PendingRaster::decode(red_png());
    let img = pollster::block_on(p.resolve()).unwrap();
    assert_eq!((img.width(), img.height()), (3, 2));
    assert!(p.is_resolved());
}

#[test]
fn undecodable_bytes_fail_instead_of_hanging() {
    let p = PendingRaster::decode(b"nope".to_vec());
    let err = pollster::block_on(p.resolve()).unwrap_err();
    assert!(matches!(err, QrCardError::LogoDecode(_)));
}

#[test]
fn dropped_resolver_fails_pending() {
    let (resolver, p) = PendingRaster::deferred();
    assert!(!p.is_resolved());
    drop(resolver);
    let err = pollster::block_on(p.resolve()).unwrap_err();
    assert!(err.to_string().contains("dropped"));
}

#[test]
fn clones_share_completion() {
    let (resolver, p) = PendingRaster::deferred();
    let q = p.clone();
    resolver.fail("bad bytes");
    assert!(pollster::block_on(p.resolve()).is_err());
    assert!(pollster::block_on(q.resolve()).is_err());
    assert!(format!("{q:?}").contains("failed"));
}

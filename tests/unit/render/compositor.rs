use std::sync::Mutex;

use super::*;
use crate::assets::pending::PendingRaster;

#[derive(Default)]
struct RecordingSource {
    sizes: Mutex<Vec<u32>>,
}

impl QrMatrixSource for RecordingSource {
    fn render(&self, request: &QrRasterRequest<'_>) -> QrCardResult<RasterImage> {
        assert_eq!(request.level, EcLevel::High);
        if let Ok(mut sizes) = self.sizes.lock() {
            sizes.push(request.pixel_size);
        }
        QrCodeSource.render(request)
    }
}

struct WrongSizeSource;

impl QrMatrixSource for WrongSizeSource {
    fn render(&self, request: &QrRasterRequest<'_>) -> QrCardResult<RasterImage> {
        QrCodeSource.render(&QrRasterRequest {
            pixel_size: request.pixel_size / 2,
            ..*request
        })
    }
}

fn request(scale: u32) -> RenderRequest {
    RenderRequest::builder("https://example.com", "#144da3")
        .scale(scale)
        .build()
        .unwrap()
}

#[test]
fn export_tier_requests_full_resolution_qr_raster() {
    let source = RecordingSource::default();
    let compositor = Compositor::new(&source);
    compositor.render_blocking(&request(1)).unwrap();
    compositor.render_blocking(&request(4)).unwrap();
    assert_eq!(*source.sizes.lock().unwrap(), vec![210, 840]);
}

#[test]
fn wrong_size_qr_raster_is_rejected() {
    let err = Compositor::new(WrongSizeSource)
        .render_blocking(&request(1))
        .unwrap_err();
    assert!(matches!(err, QrCardError::Raster(_)));
}

#[test]
fn empty_text_never_reaches_the_source() {
    let source = RecordingSource::default();
    let req = RenderRequest::builder("", "#144da3").build().unwrap();
    let err = Compositor::new(&source).render_blocking(&req).unwrap_err();
    assert!(matches!(err, QrCardError::InvalidInput(_)));
    assert!(source.sizes.lock().unwrap().is_empty());
}

#[test]
fn result_accessors_agree() {
    let result = Compositor::default().render_blocking(&request(1)).unwrap();
    assert_eq!((result.width(), result.height()), (230, 230));
    assert_eq!(result.logo(), &LogoOutcome::Absent);
    assert_eq!(result.suggested_filename(), "qr-custom.png");
    assert!(result.data_uri().starts_with("data:image/png;base64,"));
    assert_eq!(result.content_hash(), content_hash(result.png_bytes()));
    assert!(result.pixel(230, 0).is_none());

    let img = result.to_rgba_image().unwrap();
    assert_eq!(img.get_pixel(115, 2).0, result.pixel(115, 2).unwrap());
    let hash = result.content_hash();
    assert_eq!(content_hash(&result.into_png_bytes()), hash);
}

#[test]
fn undecodable_logo_reports_failure_and_matches_plain_render() {
    let compositor = Compositor::default();
    let plain = compositor.render_blocking(&request(1)).unwrap();

    let mut req = request(1);
    req.logo = Some(PendingRaster::decode(b"definitely not an image".to_vec()));
    let result = compositor.render_blocking(&req).unwrap();
    assert!(matches!(result.logo(), LogoOutcome::DecodeFailed(_)));
    assert_eq!(result.png_bytes(), plain.png_bytes());
}

#[test]
fn save_creates_parent_dirs() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("target")
        .join("compositor_unit");
    let _ = std::fs::remove_dir_all(&dir);
    let path = dir.join("nested").join("qr-custom.png");
    let result = Compositor::default().render_blocking(&request(1)).unwrap();
    result.save(&path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), result.png_bytes());
}

#[test]
fn caption_faces_are_resolved_once_per_compositor() {
    let fonts = FontBook::system();
    if fonts.is_empty() {
        eprintln!("no system fonts; skipping");
        return;
    }
    let compositor = Compositor::default().with_fonts(fonts);
    let mut req = request(1);
    for text in ["Scan me", "Again"] {
        req.caption = Some(crate::composition::request::Caption::new(
            text,
            "sans-serif",
            crate::composition::request::DEFAULT_CAPTION_SIZE_PX,
        ));
        compositor.render_blocking(&req).unwrap();
    }
    let shaper = compositor.captions.lock().unwrap();
    assert_eq!(shaper.resolved.len(), 1);
    assert_eq!(shaper.engine.registered_faces(), 1);
}

#[test]
fn oversized_caption_is_shrunk_into_the_band() {
    let fonts = FontBook::system();
    if fonts.is_empty() {
        eprintln!("no system fonts; skipping");
        return;
    }
    let compositor = Compositor::default().with_fonts(fonts);
    let mut req = request(2);
    req.caption = Some(crate::composition::request::Caption::new(
        "Scan me",
        "sans-serif",
        12.0,
    ));
    let plan = compile_plan(&req, compositor.layout()).unwrap();
    let pass = plan.caption().unwrap();
    let caption = compositor.prepare_caption(pass).unwrap();
    assert!(f64::from(caption.height()) <= pass.band.y1 - pass.top + 1e-3);
}

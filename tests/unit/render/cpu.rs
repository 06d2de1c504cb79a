use super::*;
use crate::foundation::core::Rect;

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

fn solid(side: u32, rgba: [u8; 4]) -> RasterImage {
    RasterImage::from_straight_rgba8(side, side, rgba.repeat((side * side) as usize)).unwrap()
}

#[test]
fn new_surface_is_transparent() {
    let mut b = CpuBackend::new(Canvas::square(8)).unwrap();
    let f = b.readback_rgba8().unwrap();
    assert!(f.premultiplied);
    assert!(f.data.iter().all(|&v| v == 0));
}

#[test]
fn rejects_oversized_surface() {
    assert!(CpuBackend::new(Canvas::square(70_000)).is_err());
}

#[test]
fn scene_fill_respects_clip() {
    let mut b = CpuBackend::new(Canvas::square(20)).unwrap();
    let rect = Rect::new(0.0, 0.0, 20.0, 20.0);
    b.exec_scene(&ScenePass {
        ops: vec![DrawOp::Fill {
            path: kurbo::Shape::to_path(&rect, 0.1),
            color: HexColor::rgb(0, 128, 0),
        }],
        clip: Some(circle_path(Point::new(10.0, 10.0), 5.0)),
    })
    .unwrap();
    let f = b.readback_rgba8().unwrap();
    assert_eq!(px(&f, 10, 10), [0, 128, 0, 255]);
    assert_eq!(px(&f, 1, 1)[3], 0);
}

#[test]
fn later_scene_paints_over_earlier() {
    let mut b = CpuBackend::new(Canvas::square(10)).unwrap();
    let full = kurbo::Shape::to_path(&Rect::new(0.0, 0.0, 10.0, 10.0), 0.1);
    for color in [HexColor::rgb(255, 0, 0), HexColor::rgb(0, 0, 255)] {
        b.exec_scene(&ScenePass {
            ops: vec![DrawOp::Fill {
                path: full.clone(),
                color,
            }],
            clip: None,
        })
        .unwrap();
    }
    let f = b.readback_rgba8().unwrap();
    assert_eq!(px(&f, 5, 5), [0, 0, 255, 255]);
}

#[test]
fn aligned_blit_copies_exact_pixels() {
    let mut b = CpuBackend::new(Canvas::square(10)).unwrap();
    b.exec_blit(
        &BlitPass {
            dest: Rect::new(2.0, 3.0, 6.0, 7.0),
        },
        &solid(4, [10, 20, 30, 255]),
    )
    .unwrap();
    let f = b.readback_rgba8().unwrap();
    assert_eq!(px(&f, 2, 3), [10, 20, 30, 255]);
    assert_eq!(px(&f, 5, 6), [10, 20, 30, 255]);
    assert_eq!(px(&f, 6, 6)[3], 0);
    assert_eq!(px(&f, 1, 3)[3], 0);
}

#[test]
fn shadow_pass_leaves_disc_opaque_and_halo_soft() {
    let mut b = CpuBackend::new(Canvas::square(100)).unwrap();
    b.exec_shadow(&ShadowPass {
        center: Point::new(50.0, 50.0),
        radius: 20.0,
        sigma: 3.5,
        kernel_radius: 11,
        shadow: HexColor::rgb(0xdd, 0xe3, 0xed),
        disc: HexColor::WHITE,
    })
    .unwrap();
    let f = b.readback_rgba8().unwrap();
    assert_eq!(px(&f, 50, 50), [255, 255, 255, 255]);
    let halo = px(&f, 50, 73);
    assert!(halo[3] > 0 && halo[3] < 255, "halo alpha {}", halo[3]);
    assert_eq!(px(&f, 50, 90)[3], 0);
    assert_eq!(px(&f, 0, 0)[3], 0);
}

#[test]
fn image_pass_is_clipped_to_circle() {
    let mut b = CpuBackend::new(Canvas::square(60)).unwrap();
    let pass = ImagePass {
        center: Point::new(30.0, 30.0),
        radius: 20.0,
        side_px: 40,
    };
    b.exec_image(&pass, &solid(40, [255, 0, 0, 255])).unwrap();
    let f = b.readback_rgba8().unwrap();
    assert_eq!(px(&f, 30, 30), [255, 0, 0, 255]);
    // Square corner of the source is cut away.
    assert_eq!(px(&f, 11, 11)[3], 0);

    let err = b.exec_image(&pass, &solid(8, [0, 0, 0, 255])).unwrap_err();
    assert!(matches!(err, QrCardError::Raster(_)));
}

#[test]
fn glyph_runs_use_the_face_they_were_shaped_with() {
    let primary = Arc::new(vec![1u8, 2, 3, 4]);
    let shared: Arc<dyn AsRef<[u8]> + Send + Sync> = primary.clone();
    let shaped_primary = parley::fontique::Blob::new(shared);
    let mut fonts = RunFonts::new(shaped_primary.id(), &primary);

    // Another face inside the caption's own collection keeps the caption bytes.
    let own = fonts.font_for(&shaped_primary, 2);
    assert_eq!(own.index, 2);
    assert_eq!(own.data.data(), primary.as_slice());

    // A fallback face is drawn from its own bytes, not the caption's.
    let fallback = parley::fontique::Blob::from(vec![9u8, 8, 7]);
    let other = fonts.font_for(&fallback, 0);
    assert_eq!(other.data.data(), &[9u8, 8, 7][..]);
    assert_eq!(other.index, 0);
    let again = fonts.font_for(&fallback, 0);
    assert_eq!(again.data.id(), other.data.id());
}

#[test]
fn caption_ink_stays_inside_its_band() {
    use crate::assets::fonts::{FontBook, TextBrushRgba8, TextLayoutEngine};

    let book = FontBook::system();
    if book.is_empty() {
        eprintln!("no system fonts; skipping");
        return;
    }
    let font = book.resolve("sans-serif").unwrap();
    let caption = TextLayoutEngine::new()
        .layout_line("HHHH", &font, 40.0, TextBrushRgba8::default())
        .unwrap();

    let band = Rect::new(4.0, 10.0, 92.0, 20.0);
    let pass = TextPass {
        text: "HHHH".to_string(),
        font_family: "sans-serif".to_string(),
        size_px: 40.0,
        center_x: 48.0,
        top: 10.0,
        band,
        ink: HexColor::rgb(0x1e, 0x29, 0x3b),
    };
    let mut b = CpuBackend::new(Canvas::square(96)).unwrap();
    b.exec_text(&pass, &caption).unwrap();
    let f = b.readback_rgba8().unwrap();

    let mut inked = 0;
    for y in 0..96 {
        for x in 0..96 {
            let a = px(&f, x, y)[3];
            if a == 0 {
                continue;
            }
            inked += 1;
            let inside = (4..92).contains(&x) && (10..20).contains(&y);
            assert!(inside, "ink at ({x},{y}) outside the band");
        }
    }
    assert!(inked > 0);
}

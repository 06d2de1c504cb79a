use super::*;

#[test]
fn builder_parses_color_and_defaults_to_preview() {
    let req = RenderRequest::builder("https://example.com", "#144DA3")
        .build()
        .unwrap();
    assert_eq!(req.color, HexColor::rgb(0x14, 0x4d, 0xa3));
    assert_eq!(req.scale, 1);
    assert_eq!(req.tier(), RenderTier::Preview);
    assert!(req.logo.is_none());
    assert!(req.caption.is_none());
    req.validate().unwrap();
}

#[test]
fn builder_rejects_bad_color_and_zero_scale() {
    let err = RenderRequest::builder("x", "144da3").build().unwrap_err();
    assert!(matches!(err, QrCardError::InvalidInput(_)));

    let err = RenderRequest::builder("x", "#144da3")
        .scale(0)
        .build()
        .unwrap_err();
    assert!(matches!(err, QrCardError::InvalidInput(_)));
}

#[test]
fn empty_text_fails_validation_not_build() {
    let req = RenderRequest::builder("", "#000000").build().unwrap();
    let err = req.validate().unwrap_err();
    assert!(matches!(err, QrCardError::InvalidInput(_)));
    assert!(err.to_string().starts_with("invalid input:"));
}

#[test]
fn caption_with_bad_size_fails_validation() {
    let req = RenderRequest::builder("x", "#000000")
        .caption(Caption::new("hi", "sans-serif", f32::NAN))
        .build()
        .unwrap();
    assert!(req.validate().is_err());
}

#[test]
fn tiers_map_to_scales() {
    assert_eq!(RenderTier::Preview.scale(), 1);
    assert_eq!(RenderTier::export().scale(), DEFAULT_EXPORT_SCALE);
    assert_eq!(RenderTier::Export { scale: 3 }.scale(), 3);

    let req = RenderRequest::builder("x", "#000000")
        .tier(RenderTier::export())
        .build()
        .unwrap();
    assert_eq!(req.scale, 4);
    assert_eq!(req.tier(), RenderTier::Export { scale: 4 });
    assert_eq!(req.with_scale(1).tier(), RenderTier::Preview);
}

#[test]
fn with_scale_shares_pending_logo() {
    let (resolver, pending) = PendingRaster::deferred();
    let req = RenderRequest::builder("x", "#000000")
        .logo(pending)
        .build()
        .unwrap();
    let export = req.with_scale(4);
    resolver.fail("nope");
    let a = pollster::block_on(req.logo.as_ref().unwrap().resolve());
    let b = pollster::block_on(export.logo.as_ref().unwrap().resolve());
    assert!(a.is_err() && b.is_err());
}

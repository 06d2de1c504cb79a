use super::*;

#[test]
fn defaults_match_preview_geometry() {
    let l = LayoutConstants::default();
    l.validate().unwrap();
    assert_eq!(l.canvas_side(), 230);
    assert_eq!(l.canvas_side_px(1).unwrap(), 230);
    assert_eq!(l.canvas_side_px(4).unwrap(), 920);
    assert_eq!(l.shadow_color.to_string(), "#dde3ed");
}

#[test]
fn json_overrides_keep_omitted_defaults() {
    let l = LayoutConstants::from_json_str(r##"{ "padding": 16, "caption_ink": "#000000" }"##)
        .unwrap();
    assert_eq!(l.padding, 16);
    assert_eq!(l.caption_ink, HexColor::rgb(0, 0, 0));
    assert_eq!(l.qr_box_size, 210);
    assert_eq!(l.canvas_side(), 242);
}

#[test]
fn json_rejects_unknown_fields_and_bad_values() {
    let err = LayoutConstants::from_json_str(r#"{ "qr_size": 10 }"#).unwrap_err();
    assert!(matches!(err, QrCardError::Config(_)));

    let err = LayoutConstants::from_json_str(r#"{ "border_width": -1.0 }"#).unwrap_err();
    assert!(err.to_string().contains("border_width"));

    let err = LayoutConstants::from_json_str(r#"{ "qr_box_size": 0 }"#).unwrap_err();
    assert!(err.to_string().contains("qr_box_size"));
}

#[test]
fn canvas_side_px_rejects_oversized_scale() {
    let l = LayoutConstants::default();
    assert!(l.canvas_side_px(1000).is_err());
    assert!(l.canvas_side_px(0).is_err());
}

#[test]
fn from_path_reads_file() {
    let dir = std::path::PathBuf::from("target").join("layout_unit");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("layout.json");
    std::fs::write(&path, r#"{ "logo_diameter": 48.0 }"#).unwrap();

    let l = LayoutConstants::from_path(&path).unwrap();
    assert_eq!(l.logo_diameter, 48.0);

    assert!(LayoutConstants::from_path(&dir.join("missing.json")).is_err());
}

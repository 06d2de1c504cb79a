use super::*;
use crate::{
    assets::pending::PendingRaster,
    compile::plan::compile_plan,
    composition::{layout::LayoutConstants, request::RenderRequest},
};

#[derive(Default)]
struct MockBackend {
    calls: Vec<&'static str>,
}

impl PassBackend for MockBackend {
    fn exec_scene(&mut self, _pass: &ScenePass) -> QrCardResult<()> {
        self.calls.push("exec_scene");
        Ok(())
    }

    fn exec_blit(&mut self, _pass: &BlitPass, _image: &RasterImage) -> QrCardResult<()> {
        self.calls.push("exec_blit");
        Ok(())
    }

    fn exec_text(&mut self, _pass: &TextPass, _caption: &PreparedCaption) -> QrCardResult<()> {
        self.calls.push("exec_text");
        Ok(())
    }

    fn exec_shadow(&mut self, _pass: &ShadowPass) -> QrCardResult<()> {
        self.calls.push("exec_shadow");
        Ok(())
    }

    fn exec_image(&mut self, _pass: &ImagePass, _image: &RasterImage) -> QrCardResult<()> {
        self.calls.push("exec_image");
        Ok(())
    }

    fn readback_rgba8(&mut self) -> QrCardResult<FrameRGBA> {
        self.calls.push("readback_rgba8");
        Ok(FrameRGBA {
            width: 1,
            height: 1,
            data: vec![0; 4],
            premultiplied: true,
        })
    }
}

fn pixel() -> RasterImage {
    RasterImage::from_straight_rgba8(1, 1, vec![255, 0, 0, 255]).unwrap()
}

#[test]
fn execute_passes_calls_in_plan_order() {
    let req = RenderRequest::builder("https://example.com", "#144da3")
        .logo(PendingRaster::ready(pixel()))
        .build()
        .unwrap();
    let plan = compile_plan(&req, &LayoutConstants::default()).unwrap();
    let qr = pixel();
    let logo = pixel();

    let mut backend = MockBackend::default();
    let base = PassResources {
        qr: Some(&qr),
        ..PassResources::default()
    };
    execute_passes(&mut backend, &plan.base_passes, &base).unwrap();
    execute_passes(
        &mut backend,
        &plan.logo_passes,
        &PassResources {
            logo: Some(&logo),
            ..base
        },
    )
    .unwrap();
    backend.readback_rgba8().unwrap();

    assert_eq!(
        backend.calls,
        vec![
            "exec_scene",
            "exec_scene",
            "exec_blit",
            "exec_shadow",
            "exec_image",
            "exec_scene",
            "readback_rgba8",
        ]
    );
}

#[test]
fn missing_resource_fails_instead_of_skipping() {
    let req = RenderRequest::builder("x", "#000000").build().unwrap();
    let plan = compile_plan(&req, &LayoutConstants::default()).unwrap();
    let mut backend = MockBackend::default();
    let err = execute_passes(&mut backend, &plan.base_passes, &PassResources::default())
        .unwrap_err();
    assert!(err.to_string().contains("qr pass"));
    assert_eq!(backend.calls, vec!["exec_scene", "exec_scene"]);
}

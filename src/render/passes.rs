use crate::{
    assets::{fonts::PreparedCaption, raster::RasterImage},
    compile::plan::{BlitPass, ImagePass, Pass, ScenePass, ShadowPass, TextPass},
    foundation::error::{QrCardError, QrCardResult},
    render::FrameRGBA,
};

/// Everything a pass may read besides its own geometry.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassResources<'a> {
    /// QR raster sized for the plan.
    pub qr: Option<&'a RasterImage>,
    /// Shaped caption.
    pub caption: Option<&'a PreparedCaption>,
    /// Square logo bitmap sized for the plan. Only present once decode has completed.
    pub logo: Option<&'a RasterImage>,
}

/// A surface that executes plan passes in order, each painting over the last.
pub trait PassBackend {
    /// Draw vector ops.
    fn exec_scene(&mut self, pass: &ScenePass) -> QrCardResult<()>;

    /// Copy `image` into the pass destination.
    fn exec_blit(&mut self, pass: &BlitPass, image: &RasterImage) -> QrCardResult<()>;

    /// Draw a shaped caption.
    fn exec_text(&mut self, pass: &TextPass, caption: &PreparedCaption) -> QrCardResult<()>;

    /// Draw a blurred halo and its disc.
    fn exec_shadow(&mut self, pass: &ShadowPass) -> QrCardResult<()>;

    /// Draw `image` clipped to the pass circle.
    fn exec_image(&mut self, pass: &ImagePass, image: &RasterImage) -> QrCardResult<()>;

    /// Copy out the surface.
    fn readback_rgba8(&mut self) -> QrCardResult<FrameRGBA>;
}

/// Execute `passes` in order. A pass whose resource is missing is an error, never skipped.
pub fn execute_passes<B: PassBackend + ?Sized>(
    backend: &mut B,
    passes: &[Pass],
    resources: &PassResources<'_>,
) -> QrCardResult<()> {
    for pass in passes {
        tracing::debug!(pass = pass.name(), "execute pass");
        match pass {
            Pass::Border(p) | Pass::Card(p) | Pass::LogoRing(p) => backend.exec_scene(p)?,
            Pass::Qr(p) => {
                let qr = resources.qr.ok_or_else(|| missing(pass, "QR raster"))?;
                backend.exec_blit(p, qr)?;
            }
            Pass::Caption(p) => {
                let caption = resources.caption.ok_or_else(|| missing(pass, "caption layout"))?;
                backend.exec_text(p, caption)?;
            }
            Pass::LogoShadow(p) => backend.exec_shadow(p)?,
            Pass::Logo(p) => {
                let logo = resources.logo.ok_or_else(|| missing(pass, "logo bitmap"))?;
                backend.exec_image(p, logo)?;
            }
        }
    }
    Ok(())
}

fn missing(pass: &Pass, what: &str) -> QrCardError {
    QrCardError::raster(format!("{} pass has no {what}", pass.name()))
}

#[cfg(test)]
#[path = "../../tests/unit/render/passes.rs"]
mod tests;

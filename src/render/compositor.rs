use std::{
    collections::HashMap,
    path::Path,
    sync::{Mutex, OnceLock},
};

use anyhow::Context;

use crate::{
    assets::{
        fonts::{FontBook, PreparedCaption, ResolvedFont, TextBrushRgba8, TextLayoutEngine},
        raster::RasterImage,
    },
    compile::plan::{TextPass, compile_plan},
    composition::{layout::LayoutConstants, request::RenderRequest},
    encode::png::{SUGGESTED_FILENAME, encode_png, png_data_uri, straight_rgba8},
    foundation::{
        error::{QrCardError, QrCardResult},
        math::content_hash,
    },
    qr::source::{EcLevel, QrCodeSource, QrMatrixSource, QrRasterRequest},
    render::{
        FrameRGBA,
        cpu::CpuBackend,
        passes::{PassBackend, PassResources, execute_passes},
    },
};

/// What happened to the logo of a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogoOutcome {
    /// The request had no logo.
    Absent,
    /// The logo passes were painted.
    Applied,
    /// The logo never became drawable; the composite was finalized without logo passes.
    DecodeFailed(String),
}

/// Turns [`RenderRequest`]s into flattened PNG composites.
///
/// Each call to [`Compositor::render`] allocates its own target surface, so concurrent or
/// abandoned renders never interfere.
pub struct Compositor<S = QrCodeSource> {
    source: S,
    layout: LayoutConstants,
    fonts: OnceLock<FontBook>,
    captions: Mutex<CaptionShaper>,
}

/// Shaping state kept across renders: resolved faces by requested family, and the Parley
/// contexts they are registered in.
#[derive(Default)]
struct CaptionShaper {
    engine: TextLayoutEngine,
    resolved: HashMap<String, ResolvedFont>,
}

impl Default for Compositor<QrCodeSource> {
    fn default() -> Self {
        Self::new(QrCodeSource)
    }
}

impl<S> std::fmt::Debug for Compositor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("layout", &self.layout)
            .field("fonts", &self.fonts.get())
            .finish_non_exhaustive()
    }
}

impl<S: QrMatrixSource> Compositor<S> {
    /// Compositor over `source` with the default layout. Host fonts load on first caption.
    pub fn new(source: S) -> Self {
        Self {
            source,
            layout: LayoutConstants::default(),
            fonts: OnceLock::new(),
            captions: Mutex::default(),
        }
    }

    /// Replace the layout constants.
    pub fn with_layout(mut self, layout: LayoutConstants) -> Self {
        self.layout = layout;
        self
    }

    /// Use `fonts` for captions instead of the host's fonts.
    pub fn with_fonts(mut self, fonts: FontBook) -> Self {
        self.fonts = OnceLock::from(fonts);
        self.captions = Mutex::default();
        self
    }

    /// Layout used by every render.
    pub fn layout(&self) -> &LayoutConstants {
        &self.layout
    }

    fn fonts(&self) -> &FontBook {
        self.fonts.get_or_init(FontBook::system)
    }

    /// Run the full pass sequence for `request`.
    ///
    /// Border, card, QR and caption are painted first. If the request carries a logo, the render
    /// then waits for it and paints shadow, logo and ring on the same surface. A logo that fails
    /// to decode is reported through [`CompositeResult::logo`] and the result equals the
    /// no-logo composite.
    #[tracing::instrument(
        skip_all,
        fields(scale = request.scale, logo = request.logo.is_some(), caption = request.caption.is_some())
    )]
    pub async fn render(&self, request: &RenderRequest) -> QrCardResult<CompositeResult> {
        let plan = compile_plan(request, &self.layout)?;

        let qr = self.source.render(&QrRasterRequest {
            text: &request.text,
            pixel_size: plan.qr_px,
            level: EcLevel::High,
            fg: request.color,
            bg: self.layout.qr_background,
        })?;
        if qr.width() != plan.qr_px || qr.height() != plan.qr_px {
            return Err(QrCardError::raster(format!(
                "QR source returned {}x{}, expected {}x{}",
                qr.width(),
                qr.height(),
                plan.qr_px,
                plan.qr_px
            )));
        }
        let caption = plan
            .caption()
            .map(|pass| self.prepare_caption(pass))
            .transpose()?;

        let mut backend = CpuBackend::new(plan.canvas)?;
        let base = PassResources {
            qr: Some(&qr),
            caption: caption.as_ref(),
            logo: None,
        };
        execute_passes(&mut backend, &plan.base_passes, &base)?;

        let logo = match &request.logo {
            None => LogoOutcome::Absent,
            Some(pending) => {
                let bitmap = pending
                    .resolve()
                    .await
                    .and_then(|img| prepare_logo(&img, plan.logo_px));
                match bitmap {
                    Ok(bitmap) => {
                        let resources = PassResources {
                            logo: Some(&bitmap),
                            ..base
                        };
                        execute_passes(&mut backend, &plan.logo_passes, &resources)?;
                        LogoOutcome::Applied
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "logo unavailable, finalizing without it");
                        LogoOutcome::DecodeFailed(e.to_string())
                    }
                }
            }
        };

        let frame = backend.readback_rgba8()?;
        let result = CompositeResult::from_frame(&frame, logo)?;
        tracing::debug!(
            width = result.width,
            png_bytes = result.png.len(),
            "composite finalized"
        );
        Ok(result)
    }

    /// [`Compositor::render`] driven to completion on the current thread.
    pub fn render_blocking(&self, request: &RenderRequest) -> QrCardResult<CompositeResult> {
        pollster::block_on(self.render(request))
    }

    /// Shape the caption, shrinking it when its line box is taller than the room between the
    /// QR box and the border.
    fn prepare_caption(&self, pass: &TextPass) -> QrCardResult<PreparedCaption> {
        let mut shaper = self
            .captions
            .lock()
            .map_err(|_| QrCardError::font("caption shaper lock poisoned"))?;
        let CaptionShaper { engine, resolved } = &mut *shaper;

        let font = match resolved.get(&pass.font_family) {
            Some(font) => font.clone(),
            None => {
                let font = self.fonts().resolve(&pass.font_family)?;
                resolved.insert(pass.font_family.clone(), font.clone());
                font
            }
        };
        let [r, g, b, a] = pass.ink.to_rgba8();
        let brush = TextBrushRgba8 { r, g, b, a };

        let room = pass.band.y1 - pass.top;
        let mut size = pass.size_px;
        let mut caption = engine.layout_line(&pass.text, &font, size, brush)?;
        if f64::from(caption.height()) <= room {
            return Ok(caption);
        }

        // Line metrics are pixel-quantized, so one proportional step can still overshoot.
        for _ in 0..8 {
            let height = f64::from(caption.height());
            if height <= room {
                break;
            }
            size = (f64::from(size) * room / height * 0.98) as f32;
            caption = engine.layout_line(&pass.text, &font, size, brush)?;
        }
        tracing::warn!(
            requested_px = pass.size_px,
            fitted_px = size,
            room_px = room,
            "caption is taller than the space under the QR box; shrinking it to fit"
        );
        Ok(caption)
    }
}

fn prepare_logo(image: &RasterImage, side: u32) -> QrCardResult<RasterImage> {
    image.center_square_crop()?.resized_square(side)
}

/// A finished composite: PNG bytes plus the straight-alpha pixels they encode.
#[derive(Clone, Debug)]
pub struct CompositeResult {
    width: u32,
    height: u32,
    png: Vec<u8>,
    rgba: Vec<u8>,
    logo: LogoOutcome,
}

impl CompositeResult {
    fn from_frame(frame: &FrameRGBA, logo: LogoOutcome) -> QrCardResult<Self> {
        Ok(Self {
            width: frame.width,
            height: frame.height,
            png: encode_png(frame)?,
            rgba: straight_rgba8(frame),
            logo,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encoded PNG.
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// Take the encoded PNG.
    pub fn into_png_bytes(self) -> Vec<u8> {
        self.png
    }

    /// `data:image/png;base64,...` form of the PNG.
    pub fn data_uri(&self) -> String {
        png_data_uri(&self.png)
    }

    /// Stable 64-bit hash of the PNG bytes.
    pub fn content_hash(&self) -> u64 {
        content_hash(&self.png)
    }

    /// Always `qr-custom.png`.
    pub fn suggested_filename(&self) -> &'static str {
        SUGGESTED_FILENAME
    }

    /// What happened to the request's logo.
    pub fn logo(&self) -> &LogoOutcome {
        &self.logo
    }

    /// Straight-alpha pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ])
    }

    /// Straight-alpha pixels as an `image` buffer.
    pub fn to_rgba_image(&self) -> QrCardResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
            .ok_or_else(|| QrCardError::raster("composite pixel buffer has wrong length"))
    }

    /// Write the PNG to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> QrCardResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        std::fs::write(path, &self.png)
            .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;

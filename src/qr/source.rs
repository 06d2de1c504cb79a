use crate::{
    assets::raster::RasterImage,
    foundation::{
        core::HexColor,
        error::{QrCardError, QrCardResult},
    },
};

/// QR error-correction tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EcLevel {
    /// ~7% recovery.
    Low,
    /// ~15% recovery.
    Medium,
    /// ~25% recovery.
    Quartile,
    /// ~30% recovery; leaves room for a logo over the symbol center.
    High,
}

impl From<EcLevel> for qrcode::EcLevel {
    fn from(level: EcLevel) -> Self {
        match level {
            EcLevel::Low => qrcode::EcLevel::L,
            EcLevel::Medium => qrcode::EcLevel::M,
            EcLevel::Quartile => qrcode::EcLevel::Q,
            EcLevel::High => qrcode::EcLevel::H,
        }
    }
}

/// One request for a QR raster of an exact pixel size.
#[derive(Clone, Copy, Debug)]
pub struct QrRasterRequest<'a> {
    /// Payload to encode.
    pub text: &'a str,
    /// Side of the square output raster.
    pub pixel_size: u32,
    /// Error-correction tier.
    pub level: EcLevel,
    /// Dark-module color.
    pub fg: HexColor,
    /// Light-module color.
    pub bg: HexColor,
}

/// Produces a QR raster for a payload; a pure function of the request.
///
/// Returning is the completion signal: callers may read the raster as soon as `render` returns.
pub trait QrMatrixSource {
    /// Encode `request.text` and render it into a `pixel_size` square.
    fn render(&self, request: &QrRasterRequest<'_>) -> QrCardResult<RasterImage>;
}

impl<T: QrMatrixSource + ?Sized> QrMatrixSource for &T {
    fn render(&self, request: &QrRasterRequest<'_>) -> QrCardResult<RasterImage> {
        (**self).render(request)
    }
}

/// [`QrMatrixSource`] backed by the `qrcode` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct QrCodeSource;

impl QrMatrixSource for QrCodeSource {
    fn render(&self, request: &QrRasterRequest<'_>) -> QrCardResult<RasterImage> {
        let matrix = QrMatrix::encode(request.text, request.level)?;
        matrix.rasterize(request.pixel_size, request.fg, request.bg)
    }
}

/// Square boolean module grid of an encoded symbol, without quiet zone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrMatrix {
    size: usize,
    dark: Vec<bool>,
}

impl QrMatrix {
    /// Encode `text` at `level`, choosing the smallest version that fits.
    pub fn encode(text: &str, level: EcLevel) -> QrCardResult<Self> {
        let code = qrcode::QrCode::with_error_correction_level(text.as_bytes(), level.into())
            .map_err(|e| {
                QrCardError::invalid_input(format!("text cannot be encoded as a QR symbol: {e}"))
            })?;
        let size = code.width();
        let dark = code
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect();
        Ok(Self { size, dark })
    }

    /// Modules per side.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the module at column `x`, row `y` is dark. Out-of-range modules are light.
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size && self.dark[y * self.size + x]
    }

    /// Render into an opaque `pixel_size` square.
    ///
    /// Modules are laid out on a fractional grid (`pixel_size / size` pixels each) and every
    /// output pixel takes the fg/bg mix given by the dark area it covers. Area coverage is
    /// additive, so averaging `k x k` blocks of a raster rendered at `k * pixel_size` gives this
    /// raster back up to rounding.
    pub fn rasterize(&self, pixel_size: u32, fg: HexColor, bg: HexColor) -> QrCardResult<RasterImage> {
        if pixel_size == 0 {
            return Err(QrCardError::invalid_input("QR raster size must be > 0"));
        }
        let axis = axis_coverage(pixel_size, self.size);
        let side = pixel_size as usize;
        let mut out = vec![0u8; side * side * 4];

        let lerp = |b: u8, f: u8, t: f64| -> u8 {
            (f64::from(b) + (f64::from(f) - f64::from(b)) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };

        for (py, ys) in axis.iter().enumerate() {
            for (px, xs) in axis.iter().enumerate() {
                let mut cov = 0.0f64;
                for &(my, oy) in ys {
                    for &(mx, ox) in xs {
                        if self.is_dark(mx, my) {
                            cov += ox * oy;
                        }
                    }
                }
                let cov = cov.clamp(0.0, 1.0);
                let idx = (py * side + px) * 4;
                out[idx] = lerp(bg.r, fg.r, cov);
                out[idx + 1] = lerp(bg.g, fg.g, cov);
                out[idx + 2] = lerp(bg.b, fg.b, cov);
                out[idx + 3] = 255;
            }
        }

        RasterImage::from_premul_rgba8(pixel_size, pixel_size, out)
    }
}

// For every pixel along one axis: the modules it overlaps and by how much (in pixel units).
fn axis_coverage(pixels: u32, modules: usize) -> Vec<Vec<(usize, f64)>> {
    let step = f64::from(pixels) / modules as f64;
    (0..pixels)
        .map(|p| {
            let (lo, hi) = (f64::from(p), f64::from(p) + 1.0);
            let mut spans = Vec::with_capacity(2);
            let mut m = ((lo / step).floor() as usize).min(modules - 1);
            while m < modules {
                let m_lo = m as f64 * step;
                let m_hi = m_lo + step;
                let overlap = hi.min(m_hi) - lo.max(m_lo);
                if overlap > 0.0 {
                    spans.push((m, overlap));
                }
                if m_hi >= hi {
                    break;
                }
                m += 1;
            }
            spans
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/qr/source.rs"]
mod tests;

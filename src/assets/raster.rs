use std::sync::Arc;

use crate::foundation::error::{QrCardError, QrCardResult};

/// Shorter-side pixel floor when rasterizing SVG logos, so export tiers stay sharp.
pub const SVG_LOGO_MIN_RASTER: u32 = 512;

/// A decoded bitmap in premultiplied RGBA8, row-major, tightly packed.
///
/// Pixel data is shared, so cloning a `RasterImage` is cheap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    rgba8_premul: Arc<Vec<u8>>,
}

impl RasterImage {
    /// Wrap premultiplied RGBA8 pixels.
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: Vec<u8>) -> QrCardResult<Self> {
        if width == 0 || height == 0 {
            return Err(QrCardError::raster("raster image must be at least 1x1"));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| QrCardError::raster("raster image size overflow"))?;
        if rgba8_premul.len() != expected {
            return Err(QrCardError::raster(format!(
                "raster image expects {expected} bytes for {width}x{height}, got {}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Premultiply straight-alpha RGBA8 pixels and wrap them.
    pub fn from_straight_rgba8(width: u32, height: u32, mut rgba8: Vec<u8>) -> QrCardResult<Self> {
        premultiply_rgba8_in_place(&mut rgba8);
        Self::from_premul_rgba8(width, height, rgba8)
    }

    /// Convert a straight-alpha `image` buffer.
    pub fn from_rgba_image(img: image::RgbaImage) -> QrCardResult<Self> {
        let (width, height) = img.dimensions();
        Self::from_straight_rgba8(width, height, img.into_raw())
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 bytes.
    pub fn rgba8_premul(&self) -> &[u8] {
        self.rgba8_premul.as_slice()
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel_premul(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = &self.rgba8_premul[idx..idx + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Crop the largest centered square. Square inputs are returned as-is.
    pub fn center_square_crop(&self) -> QrCardResult<Self> {
        if self.width == self.height {
            return Ok(self.clone());
        }
        let side = self.width.min(self.height);
        let x = (self.width - side) / 2;
        let y = (self.height - side) / 2;
        let buf = self.as_premul_buffer()?;
        let cropped = image::imageops::crop_imm(&buf, x, y, side, side).to_image();
        Self::from_premul_rgba8(side, side, cropped.into_raw())
    }

    /// Resample to `side x side`.
    ///
    /// Filtering premultiplied channels keeps edges free of dark fringes; the triangle filter
    /// never overshoots, so `c <= a` holds for every output pixel.
    pub fn resized_square(&self, side: u32) -> QrCardResult<Self> {
        if side == 0 {
            return Err(QrCardError::raster("resize target must be > 0"));
        }
        if self.width == side && self.height == side {
            return Ok(self.clone());
        }
        let buf = self.as_premul_buffer()?;
        let resized =
            image::imageops::resize(&buf, side, side, image::imageops::FilterType::Triangle);
        Self::from_premul_rgba8(side, side, resized.into_raw())
    }

    // The `image` container is only used as a byte grid here; channels stay premultiplied.
    fn as_premul_buffer(&self) -> QrCardResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.rgba8_premul.to_vec())
            .ok_or_else(|| QrCardError::raster("raster image buffer has wrong length"))
    }
}

/// Decode user-supplied logo bytes: SVG documents are rasterized, everything else goes through
/// the `image` codecs.
pub fn decode_logo(bytes: &[u8]) -> QrCardResult<RasterImage> {
    if bytes.is_empty() {
        return Err(QrCardError::logo_decode("logo bytes are empty"));
    }
    if looks_like_svg(bytes) {
        rasterize_svg(bytes, SVG_LOGO_MIN_RASTER)
    } else {
        decode_image(bytes)
    }
}

/// Decode encoded raster bytes (PNG, JPEG, ...) and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> QrCardResult<RasterImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| QrCardError::logo_decode(format!("decode image from memory: {e}")))?;
    RasterImage::from_rgba_image(dyn_img.to_rgba8())
        .map_err(|e| QrCardError::logo_decode(e.to_string()))
}

/// Parse SVG bytes and rasterize them so the shorter side is at least `min_side` pixels.
pub fn rasterize_svg(bytes: &[u8], min_side: u32) -> QrCardResult<RasterImage> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts)
        .map_err(|e| QrCardError::logo_decode(format!("parse svg tree: {e}")))?;

    let size = tree.size();
    let (w, h) = (size.width(), size.height());
    if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
        return Err(QrCardError::logo_decode("svg has invalid width/height"));
    }
    let k = (min_side as f32 / w.min(h)).max(1.0);
    let width = (w * k).round().max(1.0) as u32;
    let height = (h * k).round().max(1.0) as u32;

    const MAX_DIM: u32 = 16_384;
    if width > MAX_DIM || height > MAX_DIM {
        return Err(QrCardError::logo_decode(format!(
            "svg raster size too large: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| QrCardError::logo_decode("failed to allocate svg pixmap"))?;
    let xform =
        resvg::tiny_skia::Transform::from_scale(width as f32 / w, height as f32 / h);
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    // tiny-skia pixmaps are already premultiplied RGBA8.
    RasterImage::from_premul_rgba8(width, height, pixmap.take())
        .map_err(|e| QrCardError::logo_decode(e.to_string()))
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    let head = head.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(head);
    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    let head = &head[start..];
    if head.starts_with(b"<svg") || head.starts_with(b"<!DOCTYPE svg") {
        return true;
    }
    head.starts_with(b"<?xml") && head.windows(4).any(|w| w == b"<svg")
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/raster.rs"]
mod tests;

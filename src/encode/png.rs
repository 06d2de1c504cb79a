use std::io::Cursor;

use base64::Engine as _;

use crate::{
    foundation::error::{QrCardError, QrCardResult},
    render::FrameRGBA,
};

/// File name offered to the user when saving a composite.
pub const SUGGESTED_FILENAME: &str = "qr-custom.png";

/// Convert premultiplied RGBA8 back to straight alpha.
pub fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

/// Straight-alpha copy of a frame's pixels.
pub fn straight_rgba8(frame: &FrameRGBA) -> Vec<u8> {
    let mut data = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_rgba8_in_place(&mut data);
    }
    data
}

/// Encode a frame as a lossless RGBA8 PNG.
pub fn encode_png(frame: &FrameRGBA) -> QrCardResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(frame.width, frame.height, straight_rgba8(frame))
        .ok_or_else(|| {
            QrCardError::encode(format!(
                "frame buffer does not match {}x{}",
                frame.width, frame.height
            ))
        })?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| QrCardError::encode(format!("png encode: {e}")))?;
    Ok(buf)
}

/// `data:image/png;base64,...` URI for encoded PNG bytes.
pub fn png_data_uri(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;

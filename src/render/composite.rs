use crate::foundation::{
    error::{QrCardError, QrCardResult},
    math::mul_div255_u8,
};

/// One premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Where a source buffer lands on a destination surface. `x`/`y` may be negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Left edge on the destination.
    pub x: i32,
    /// Top edge on the destination.
    pub y: i32,
    /// Source width.
    pub width: u32,
    /// Source height.
    pub height: u32,
}

/// Premultiplied source-over with an extra opacity multiplier.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    if sa == 255 && op == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Composite a same-sized layer over `dst`.
pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> QrCardResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(QrCardError::raster(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Composite a smaller buffer over `dst` at `at`, clipping to the destination bounds.
pub fn over_region_in_place(
    dst: &mut [u8],
    dst_width: u32,
    src: &[u8],
    at: Placement,
) -> QrCardResult<()> {
    let row_bytes = dst_width as usize * 4;
    if row_bytes == 0 || !dst.len().is_multiple_of(row_bytes) {
        return Err(QrCardError::raster(
            "over_region_in_place destination is not a whole number of rows",
        ));
    }
    if src.len() != at.width as usize * at.height as usize * 4 {
        return Err(QrCardError::raster(
            "over_region_in_place source does not match its placement size",
        ));
    }
    let dst_height = (dst.len() / row_bytes) as i64;
    let dst_width = i64::from(dst_width);

    let x_lo = i64::from(at.x).max(0);
    let x_hi = (i64::from(at.x) + i64::from(at.width)).min(dst_width);
    let y_lo = i64::from(at.y).max(0);
    let y_hi = (i64::from(at.y) + i64::from(at.height)).min(dst_height);
    if x_lo >= x_hi || y_lo >= y_hi {
        return Ok(());
    }

    for y in y_lo..y_hi {
        let sy = (y - i64::from(at.y)) as usize;
        for x in x_lo..x_hi {
            let sx = (x - i64::from(at.x)) as usize;
            let si = (sy * at.width as usize + sx) * 4;
            if src[si + 3] == 0 {
                continue;
            }
            let di = (y as usize * dst_width as usize + x as usize) * 4;
            let out = over(
                [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]],
                [src[si], src[si + 1], src[si + 2], src[si + 3]],
                1.0,
            );
            dst[di..di + 4].copy_from_slice(&out);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;

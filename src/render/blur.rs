use crate::foundation::error::{QrCardError, QrCardResult};

/// Q16 one-dimensional Gaussian taps. The taps always sum to exactly `1 << 16`.
struct GaussianKernel {
    taps: Vec<u32>,
}

impl GaussianKernel {
    const ONE: i64 = 1 << 16;

    fn new(radius: u32, sigma: f32) -> QrCardResult<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(QrCardError::raster(format!(
                "shadow blur sigma must be a positive number, got {sigma}"
            )));
        }
        let two_sigma_sq = 2.0 * f64::from(sigma).powi(2);
        let reach = radius as i64;
        let raw: Vec<f64> = (-reach..=reach)
            .map(|d| (-((d * d) as f64) / two_sigma_sq).exp())
            .collect();
        let total: f64 = raw.iter().sum();

        let mut taps: Vec<u32> = raw
            .iter()
            .map(|w| (w / total * Self::ONE as f64).round() as u32)
            .collect();
        // Push the rounding residue into the center tap.
        let residue = Self::ONE - taps.iter().map(|&t| i64::from(t)).sum::<i64>();
        let center = taps.len() / 2;
        taps[center] = (i64::from(taps[center]) + residue).clamp(0, Self::ONE) as u32;
        Ok(Self { taps })
    }

    fn reach(&self) -> i64 {
        (self.taps.len() / 2) as i64
    }

    /// Convolve `lines` runs of `len` pixels. `line_step` and `px_step` are pixel strides
    /// between consecutive runs and between neighbours within a run.
    fn convolve(
        &self,
        src: &[u8],
        dst: &mut [u8],
        lines: usize,
        len: usize,
        line_step: usize,
        px_step: usize,
    ) {
        let last = len as i64 - 1;
        for line in 0..lines {
            let base = line * line_step;
            for i in 0..len {
                let mut sum = [0u64; 4];
                for (k, &tap) in self.taps.iter().enumerate() {
                    let j = (i as i64 + k as i64 - self.reach()).clamp(0, last) as usize;
                    let at = (base + j * px_step) * 4;
                    for (acc, &v) in sum.iter_mut().zip(&src[at..at + 4]) {
                        *acc += u64::from(tap) * u64::from(v);
                    }
                }
                let at = (base + i * px_step) * 4;
                for (out, acc) in dst[at..at + 4].iter_mut().zip(sum) {
                    *out = ((acc + (1 << 15)) >> 16).min(255) as u8;
                }
            }
        }
    }
}

/// Separable Gaussian blur over premultiplied RGBA8, clamping at the edges.
///
/// A constant image comes back unchanged; pixels further than `radius` from any ink stay
/// transparent.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> QrCardResult<Vec<u8>> {
    let (w, h) = (width as usize, height as usize);
    let len = w
        .checked_mul(h)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| QrCardError::raster("blur surface is too large"))?;
    if src.len() != len {
        return Err(QrCardError::raster(format!(
            "blur input is {} bytes, expected {len} for {width}x{height}",
            src.len()
        )));
    }
    if radius == 0 || len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = GaussianKernel::new(radius, sigma)?;
    let mut rows = vec![0u8; len];
    let mut out = vec![0u8; len];
    kernel.convolve(src, &mut rows, h, w, w, 1);
    kernel.convolve(&rows, &mut out, w, h, 1, w);
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;

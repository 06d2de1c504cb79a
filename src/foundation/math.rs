const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over the encoded PNG. Stable across runs and platforms, so equal requests can be
/// compared or cached by this value.
pub(crate) fn content_hash(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |h, &b| {
        (h ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// `x * y / 255`, rounded to nearest. Both inputs are expected in `0..=255`.
pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    ((u32::from(x) * u32::from(y) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;

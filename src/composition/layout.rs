use std::path::Path;

use anyhow::Context;

use crate::foundation::{
    core::HexColor,
    error::{QrCardError, QrCardResult},
};

/// Largest canvas side the CPU backend can allocate.
pub const MAX_CANVAS_SIDE: u32 = u16::MAX as u32;

/// Fixed proportional layout of a QR card, in logical (scale 1) pixels.
///
/// Every resolution tier renders the same `LayoutConstants`; only the multiplier differs. The
/// defaults reproduce the on-screen preview exactly.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConstants {
    /// Side of the square QR box.
    pub qr_box_size: u32,
    /// Gap between the canvas edge and the QR box, on every side.
    pub padding: u32,
    /// Width of the outer rounded border stroke.
    pub border_width: f64,
    /// Corner radius of the outer border.
    pub border_radius: f64,
    /// How far the white card extends past the QR box.
    pub card_inset: f64,
    /// Card corner radius is `border_radius - card_radius_reduction`.
    pub card_radius_reduction: f64,
    /// Diameter of the circular logo cutout.
    pub logo_diameter: f64,
    /// Canvas-style `shadowBlur` of the halo under the logo.
    pub logo_shadow_blur: f64,
    /// Extra radius of the white disc under the logo, past the logo circle.
    pub logo_shadow_margin: f64,
    /// Width of the white ring around the logo circle.
    pub logo_ring_width: f64,
    /// Color of the halo under the logo.
    pub shadow_color: HexColor,
    /// Fill of the card behind the QR symbol.
    pub card_color: HexColor,
    /// Light-module color of the QR raster.
    pub qr_background: HexColor,
    /// Ink color for captions.
    pub caption_ink: HexColor,
    /// Vertical distance from the QR box bottom to the caption's layout box.
    pub caption_gap: f64,
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            qr_box_size: 210,
            padding: 10,
            border_width: 4.0,
            border_radius: 20.0,
            card_inset: 5.0,
            card_radius_reduction: 6.0,
            logo_diameter: 59.0,
            logo_shadow_blur: 7.0,
            logo_shadow_margin: 6.0,
            logo_ring_width: 4.0,
            shadow_color: HexColor::rgb(0xdd, 0xe3, 0xed),
            card_color: HexColor::WHITE,
            qr_background: HexColor::WHITE,
            caption_ink: HexColor::rgb(0x1e, 0x29, 0x3b),
            caption_gap: 1.0,
        }
    }
}

impl LayoutConstants {
    /// Parse overrides from JSON; omitted fields keep their defaults.
    pub fn from_json_str(s: &str) -> QrCardResult<Self> {
        let layout: Self = serde_json::from_str(s)
            .map_err(|e| QrCardError::config(format!("parse layout JSON: {e}")))?;
        layout.validate()?;
        Ok(layout)
    }

    /// Load overrides from a JSON file.
    pub fn from_path(path: &Path) -> QrCardResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read layout file '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Logical canvas side: QR box plus padding on both sides.
    pub fn canvas_side(&self) -> u32 {
        self.qr_box_size.saturating_add(self.padding.saturating_mul(2))
    }

    /// Canvas side in pixels for `scale`.
    pub fn canvas_side_px(&self, scale: u32) -> QrCardResult<u32> {
        let side = u64::from(self.canvas_side()) * u64::from(scale);
        if side == 0 || side > u64::from(MAX_CANVAS_SIDE) {
            return Err(QrCardError::invalid_input(format!(
                "canvas side {side}px at scale {scale} is outside 1..={MAX_CANVAS_SIDE}"
            )));
        }
        Ok(side as u32)
    }

    /// Reject layouts that cannot produce a coherent card.
    pub fn validate(&self) -> QrCardResult<()> {
        if self.qr_box_size == 0 {
            return Err(QrCardError::config("qr_box_size must be > 0"));
        }
        if self.canvas_side() > MAX_CANVAS_SIDE {
            return Err(QrCardError::config(format!(
                "canvas side {} exceeds {MAX_CANVAS_SIDE}",
                self.canvas_side()
            )));
        }

        let non_negative = [
            ("border_width", self.border_width),
            ("border_radius", self.border_radius),
            ("card_inset", self.card_inset),
            ("card_radius_reduction", self.card_radius_reduction),
            ("logo_shadow_blur", self.logo_shadow_blur),
            ("logo_shadow_margin", self.logo_shadow_margin),
            ("logo_ring_width", self.logo_ring_width),
            ("caption_gap", self.caption_gap),
        ];
        for (name, v) in non_negative {
            if !v.is_finite() || v < 0.0 {
                return Err(QrCardError::config(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        if !self.logo_diameter.is_finite() || self.logo_diameter <= 0.0 {
            return Err(QrCardError::config("logo_diameter must be finite and > 0"));
        }
        if self.logo_diameter > f64::from(self.qr_box_size) {
            return Err(QrCardError::config(
                "logo_diameter must not exceed qr_box_size",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/layout.rs"]
mod tests;

use crate::foundation::error::{QrCardError, QrCardResult};

pub use kurbo::{Affine, BezPath, Point, Rect};

/// Pixel dimensions of a raster surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Square canvas of `side` pixels.
    pub fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }
}

/// Opaque sRGB color written as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl HexColor {
    /// Pure white, used for the card and the logo ring.
    pub const WHITE: Self = Self::rgb(0xff, 0xff, 0xff);

    /// Construct from channel values.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#`-prefixed, 6-hex-digit color. Case-insensitive.
    pub fn parse(s: &str) -> QrCardResult<Self> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| QrCardError::invalid_input(format!("color '{s}' must start with '#'")))?;
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(QrCardError::invalid_input(format!(
                "color '{s}' must be '#' followed by 6 hex digits"
            )));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|e| QrCardError::invalid_input(format!("color '{s}': {e}")))
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Straight RGBA8 with full opacity.
    pub fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

impl std::fmt::Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl std::str::FromStr for HexColor {
    type Err = QrCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HexColor {
    type Error = QrCardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

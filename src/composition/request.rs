use crate::{
    assets::pending::PendingRaster,
    foundation::{
        core::HexColor,
        error::{QrCardError, QrCardResult},
    },
};

/// Scale used by [`RenderTier::export`] when no explicit multiplier is given.
pub const DEFAULT_EXPORT_SCALE: u32 = 4;

/// Caption size, in logical pixels, whose line box fits the default layout's 5px gap between
/// the QR box and the border.
pub const DEFAULT_CAPTION_SIZE_PX: f32 = 4.0;

/// Optional single line of text drawn under the QR box.
#[derive(Clone, Debug, PartialEq)]
pub struct Caption {
    /// Caption text. Not wrapped; ink past the border's inner edge is clipped.
    pub text: String,
    /// Requested font family (`"Inter"`, `"sans-serif"`, ...).
    pub font_family: String,
    /// Font size in logical pixels. Shrunk at render time when the line box does not fit
    /// above the border.
    pub font_size_px: f32,
}

impl Caption {
    /// Build a caption.
    pub fn new(text: impl Into<String>, font_family: impl Into<String>, font_size_px: f32) -> Self {
        Self {
            text: text.into(),
            font_family: font_family.into(),
            font_size_px,
        }
    }
}

/// Resolution tier a request renders at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderTier {
    /// On-screen dimensions.
    Preview,
    /// Every length multiplied by `scale`, with the QR raster re-requested at full size.
    Export {
        /// Pixel multiplier.
        scale: u32,
    },
}

impl RenderTier {
    /// Export tier at [`DEFAULT_EXPORT_SCALE`].
    pub fn export() -> Self {
        Self::Export {
            scale: DEFAULT_EXPORT_SCALE,
        }
    }

    /// Pixel multiplier of the tier.
    pub fn scale(self) -> u32 {
        match self {
            Self::Preview => 1,
            Self::Export { scale } => scale,
        }
    }
}

/// One compositing job. Built fresh per render and never mutated.
#[derive(Clone, Debug)]
pub struct RenderRequest {
    /// QR payload.
    pub text: String,
    /// Border stroke and dark-module color.
    pub color: HexColor,
    /// Logo drawn in the center cutout, possibly still decoding.
    pub logo: Option<PendingRaster>,
    /// Caption under the QR box.
    pub caption: Option<Caption>,
    /// Pixel multiplier; 1 is the preview tier.
    pub scale: u32,
}

impl RenderRequest {
    /// Start a request for `text` in `color` (`#rrggbb`).
    pub fn builder(text: impl Into<String>, color: &str) -> RenderRequestBuilder {
        RenderRequestBuilder {
            text: text.into(),
            color: color.to_string(),
            logo: None,
            caption: None,
            scale: 1,
        }
    }

    /// Caller-side guard run before any drawing happens.
    pub fn validate(&self) -> QrCardResult<()> {
        if self.text.is_empty() {
            return Err(QrCardError::invalid_input("QR text must not be empty"));
        }
        if self.scale == 0 {
            return Err(QrCardError::invalid_input("scale must be >= 1"));
        }
        if let Some(caption) = &self.caption
            && (!caption.font_size_px.is_finite() || caption.font_size_px <= 0.0)
        {
            return Err(QrCardError::invalid_input(
                "caption font size must be finite and > 0",
            ));
        }
        Ok(())
    }

    /// Tier matching `scale`.
    pub fn tier(&self) -> RenderTier {
        if self.scale == 1 {
            RenderTier::Preview
        } else {
            RenderTier::Export { scale: self.scale }
        }
    }

    /// Same request at another scale. Shares the logo's pending decode.
    pub fn with_scale(&self, scale: u32) -> Self {
        Self {
            scale,
            ..self.clone()
        }
    }
}

/// Builder returned by [`RenderRequest::builder`].
#[derive(Clone, Debug)]
pub struct RenderRequestBuilder {
    text: String,
    color: String,
    logo: Option<PendingRaster>,
    caption: Option<Caption>,
    scale: u32,
}

impl RenderRequestBuilder {
    /// Attach a logo.
    pub fn logo(mut self, logo: PendingRaster) -> Self {
        self.logo = Some(logo);
        self
    }

    /// Attach a caption.
    pub fn caption(mut self, caption: Caption) -> Self {
        self.caption = Some(caption);
        self
    }

    /// Render at `tier`.
    pub fn tier(mut self, tier: RenderTier) -> Self {
        self.scale = tier.scale();
        self
    }

    /// Render at an explicit multiplier.
    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// Parse the color and check the scale. Empty text is left to [`RenderRequest::validate`].
    pub fn build(self) -> QrCardResult<RenderRequest> {
        let color = HexColor::parse(&self.color)?;
        if self.scale == 0 {
            return Err(QrCardError::invalid_input("scale must be >= 1"));
        }
        Ok(RenderRequest {
            text: self.text,
            color,
            logo: self.logo,
            caption: self.caption,
            scale: self.scale,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/request.rs"]
mod tests;

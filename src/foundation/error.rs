/// Convenience result type used across qrcard.
pub type QrCardResult<T> = Result<T, QrCardError>;

/// Top-level error taxonomy used by the compositing pipeline.
#[derive(thiserror::Error, Debug)]
pub enum QrCardError {
    /// Caller-supplied request data is unusable (empty text, malformed color, bad scale).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Logo bytes could not be turned into a drawable bitmap.
    #[error("logo decode error: {0}")]
    LogoDecode(String),

    /// No font face could be resolved or shaped for a caption.
    #[error("font error: {0}")]
    Font(String),

    /// Raster surfaces or pixel buffers were inconsistent.
    #[error("raster error: {0}")]
    Raster(String),

    /// The finished raster could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// Layout configuration failed to load or validate.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QrCardError {
    /// Build a [`QrCardError::InvalidInput`] value.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build a [`QrCardError::LogoDecode`] value.
    pub fn logo_decode(msg: impl Into<String>) -> Self {
        Self::LogoDecode(msg.into())
    }

    /// Build a [`QrCardError::Font`] value.
    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }

    /// Build a [`QrCardError::Raster`] value.
    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }

    /// Build a [`QrCardError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`QrCardError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

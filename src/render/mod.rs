pub(crate) mod blur;
pub(crate) mod composite;
pub(crate) mod compositor;
pub(crate) mod cpu;
pub(crate) mod passes;

/// Raw pixels read back from a render surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8, row-major, tightly packed.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied by alpha.
    pub premultiplied: bool,
}

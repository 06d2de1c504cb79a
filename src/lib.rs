//! qrcard composites styled QR code cards into flattened PNGs.
//!
//! A card is a QR symbol on a white rounded card inside a colored rounded border, with an
//! optional caption under the symbol and an optional circular logo over its center. The same
//! request renders at preview scale (1) or at any export scale; every length is multiplied, so
//! the two tiers differ only in pixel count.
//!
//! # Pipeline overview
//!
//! 1. **Request**: [`RenderRequest`] is an immutable description of one job
//! 2. **Compile**: [`compile_plan`] resolves it against [`LayoutConstants`] into a [`RenderPlan`]
//! 3. **Render**: [`Compositor`] runs the plan's passes on a fresh [`CpuBackend`] surface
//! 4. **Encode**: the surface is flattened into a PNG held by [`CompositeResult`]
//!
//! Logos arrive as a [`PendingRaster`]. The compositor paints every pass that does not need the
//! logo, then awaits it and paints the logo passes on the same surface. A logo that fails to
//! decode does not stall the render: the result is finalized without it and
//! [`CompositeResult::logo`] reports [`LogoOutcome::DecodeFailed`].
//!
//! ```no_run
//! use qrcard::{Compositor, RenderRequest, RenderTier};
//!
//! let request = RenderRequest::builder("https://example.com", "#144da3")
//!     .tier(RenderTier::export())
//!     .build()?;
//! let result = Compositor::default().render_blocking(&request)?;
//! result.save(std::path::Path::new(result.suggested_filename()))?;
//! # Ok::<(), qrcard::QrCardError>(())
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod compile;
mod composition;
mod encode;
mod foundation;
mod qr;
mod render;

pub use assets::fonts::{FontBook, PreparedCaption, ResolvedFont, TextBrushRgba8, TextLayoutEngine};
pub use assets::pending::{PendingRaster, RasterResolver};
pub use assets::raster::{
    RasterImage, SVG_LOGO_MIN_RASTER, decode_image, decode_logo, rasterize_svg,
};
pub use compile::geometry::{circle_path, clamp_radius, rounded_rect_path};
pub use compile::plan::{
    BlitPass, DrawOp, ImagePass, Pass, RenderPlan, ScenePass, ShadowPass, TextPass, compile_plan,
};
pub use composition::layout::{LayoutConstants, MAX_CANVAS_SIDE};
pub use composition::request::{
    Caption, DEFAULT_CAPTION_SIZE_PX, DEFAULT_EXPORT_SCALE, RenderRequest, RenderRequestBuilder,
    RenderTier,
};
pub use encode::png::{
    SUGGESTED_FILENAME, encode_png, png_data_uri, straight_rgba8, unpremultiply_rgba8_in_place,
};
pub use foundation::core::{Affine, BezPath, Canvas, HexColor, Point, Rect};
pub use foundation::error::{QrCardError, QrCardResult};
pub use qr::source::{EcLevel, QrCodeSource, QrMatrix, QrMatrixSource, QrRasterRequest};
pub use render::FrameRGBA;
pub use render::blur::blur_rgba8_premul;
pub use render::composite::{Placement, PremulRgba8, over, over_in_place, over_region_in_place};
pub use render::compositor::{CompositeResult, Compositor, LogoOutcome};
pub use render::cpu::CpuBackend;
pub use render::passes::{PassBackend, PassResources, execute_passes};

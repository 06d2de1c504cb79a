use crate::{
    compile::geometry::{circle_path, rounded_rect_path},
    composition::{layout::LayoutConstants, request::RenderRequest},
    foundation::{
        core::{BezPath, Canvas, HexColor, Point, Rect},
        error::{QrCardError, QrCardResult},
    },
};
use kurbo::Shape as _;

#[derive(Clone, Debug)]
/// Backend-agnostic plan for one composite, with every length already in output pixels.
///
/// Passes are split at the single suspension point of a render:
/// - `base_passes` (border, card, QR, caption) run immediately
/// - `logo_passes` (shadow, logo, ring) run only once the logo bitmap has resolved
///
/// Executing `base_passes` then `logo_passes` on one surface is the full pass order.
pub struct RenderPlan {
    /// Output surface size.
    pub canvas: Canvas,
    /// Pixel multiplier the plan was compiled at.
    pub scale: u32,
    /// Side of the QR raster to request from the matrix source.
    pub qr_px: u32,
    /// Side of the square logo bitmap the logo pass expects; 0 without a logo.
    pub logo_px: u32,
    /// Passes that never wait on anything.
    pub base_passes: Vec<Pass>,
    /// Passes painted after the logo resolves; empty without a logo.
    pub logo_passes: Vec<Pass>,
}

impl RenderPlan {
    /// The caption pass, if the request has one.
    pub fn caption(&self) -> Option<&TextPass> {
        self.base_passes.iter().find_map(|p| match p {
            Pass::Caption(t) => Some(t),
            _ => None,
        })
    }

    /// All passes in paint order.
    pub fn passes(&self) -> impl Iterator<Item = &Pass> {
        self.base_passes.iter().chain(self.logo_passes.iter())
    }
}

#[derive(Clone, Debug)]
/// One drawing step. Later passes paint over earlier ones.
pub enum Pass {
    /// Rounded outline at the canvas edge, in the request color.
    Border(ScenePass),
    /// White card behind the symbol, clipped to rounded corners.
    Card(ScenePass),
    /// QR raster at the padded interior.
    Qr(BlitPass),
    /// Caption under the QR box.
    Caption(TextPass),
    /// Halo and white disc under the logo.
    LogoShadow(ShadowPass),
    /// Logo bitmap clipped to a circle.
    Logo(ImagePass),
    /// White ring around the logo circle.
    LogoRing(ScenePass),
}

impl Pass {
    /// Stable name for logs and tests.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Border(_) => "border",
            Self::Card(_) => "card",
            Self::Qr(_) => "qr",
            Self::Caption(_) => "caption",
            Self::LogoShadow(_) => "logo_shadow",
            Self::Logo(_) => "logo",
            Self::LogoRing(_) => "logo_ring",
        }
    }
}

#[derive(Clone, Debug)]
/// Vector drawing, optionally clipped.
pub struct ScenePass {
    /// Operations in paint order.
    pub ops: Vec<DrawOp>,
    /// Clip applied to every op.
    pub clip: Option<BezPath>,
}

#[derive(Clone, Debug)]
/// Vector operation inside a [`ScenePass`].
pub enum DrawOp {
    /// Fill the interior of a path (non-zero winding).
    Fill {
        /// Shape to fill.
        path: BezPath,
        /// Opaque fill color.
        color: HexColor,
    },
    /// Stroke centered on `path`, as a 2D canvas strokes.
    Stroke {
        /// Centerline.
        path: BezPath,
        /// Full line width in pixels.
        width: f64,
        /// Opaque stroke color.
        color: HexColor,
    },
}

#[derive(Clone, Debug)]
/// Copy a raster into `dest`.
pub struct BlitPass {
    /// Destination rectangle in canvas pixels.
    pub dest: Rect,
}

#[derive(Clone, Debug)]
/// A horizontally centered single line of text.
pub struct TextPass {
    /// Text to shape.
    pub text: String,
    /// Requested font family.
    pub font_family: String,
    /// Font size in output pixels.
    pub size_px: f32,
    /// Horizontal center of the line.
    pub center_x: f64,
    /// Top of the line's layout box.
    pub top: f64,
    /// Area the caption may paint: below the QR box and inside the border's inner edge. Ink
    /// outside it is clipped.
    pub band: Rect,
    /// Text color.
    pub ink: HexColor,
}

#[derive(Clone, Debug)]
/// Blurred halo plus the opaque disc it belongs to.
pub struct ShadowPass {
    /// Disc center.
    pub center: Point,
    /// Disc radius.
    pub radius: f64,
    /// Gaussian standard deviation of the halo, in pixels.
    pub sigma: f32,
    /// Blur kernel half-width.
    pub kernel_radius: u32,
    /// Halo color.
    pub shadow: HexColor,
    /// Disc color.
    pub disc: HexColor,
}

#[derive(Clone, Debug)]
/// A square bitmap of `side_px` centered on `center`, clipped to a circle.
pub struct ImagePass {
    /// Center of the clip circle and of the bitmap.
    pub center: Point,
    /// Clip circle radius.
    pub radius: f64,
    /// Expected bitmap side.
    pub side_px: u32,
}

/// Resolve `request` against `layout` into pixel-space passes.
pub fn compile_plan(request: &RenderRequest, layout: &LayoutConstants) -> QrCardResult<RenderPlan> {
    request.validate()?;
    layout.validate()?;

    let scale = request.scale;
    let s = f64::from(scale);
    let side_px = layout.canvas_side_px(scale)?;
    let side = f64::from(side_px);
    let pad = f64::from(layout.padding);
    let qr = f64::from(layout.qr_box_size);

    let mut base_passes = Vec::with_capacity(4);

    let bw = layout.border_width * s;
    let border_rect = Rect::new(bw / 2.0, bw / 2.0, side - bw / 2.0, side - bw / 2.0);
    let mut border_ops = Vec::new();
    if bw > 0.0 {
        border_ops.push(DrawOp::Stroke {
            path: rounded_rect_path(border_rect, layout.border_radius * s),
            width: bw,
            color: request.color,
        });
    }
    base_passes.push(Pass::Border(ScenePass {
        ops: border_ops,
        clip: None,
    }));

    let card_lo = (pad - layout.card_inset) * s;
    let card_hi = (pad + qr + layout.card_inset) * s;
    let card_rect = Rect::new(card_lo, card_lo, card_hi, card_hi);
    let card_radius = (layout.border_radius - layout.card_radius_reduction).max(0.0) * s;
    base_passes.push(Pass::Card(ScenePass {
        ops: vec![DrawOp::Fill {
            path: card_rect.to_path(0.1),
            color: layout.card_color,
        }],
        clip: Some(rounded_rect_path(card_rect, card_radius)),
    }));

    let qr_px = layout.qr_box_size * scale;
    base_passes.push(Pass::Qr(BlitPass {
        dest: Rect::new(pad * s, pad * s, (pad + qr) * s, (pad + qr) * s),
    }));

    if let Some(caption) = request.caption.as_ref().filter(|c| !c.text.is_empty()) {
        let top = (pad + qr + layout.caption_gap) * s;
        let band = Rect::new(bw, top, side - bw, side - bw);
        if band.height() <= 0.0 || band.width() <= 0.0 {
            return Err(QrCardError::invalid_input(format!(
                "no room for a caption between the QR box and the border ({} px)",
                band.height()
            )));
        }
        base_passes.push(Pass::Caption(TextPass {
            text: caption.text.clone(),
            font_family: caption.font_family.clone(),
            size_px: caption.font_size_px * scale as f32,
            center_x: side / 2.0,
            top,
            band,
            ink: layout.caption_ink,
        }));
    }

    let mut logo_passes = Vec::new();
    let mut logo_px = 0;
    if request.logo.is_some() {
        let center = Point::new(side / 2.0, side / 2.0);
        let logo_radius = layout.logo_diameter / 2.0 * s;
        let sigma = layout.logo_shadow_blur / 2.0 * s;
        logo_px = (layout.logo_diameter * s).ceil().max(1.0) as u32;

        logo_passes.push(Pass::LogoShadow(ShadowPass {
            center,
            radius: (layout.logo_diameter / 2.0 + layout.logo_shadow_margin) * s,
            sigma: sigma as f32,
            kernel_radius: (3.0 * sigma).ceil() as u32,
            shadow: layout.shadow_color,
            disc: HexColor::WHITE,
        }));
        logo_passes.push(Pass::Logo(ImagePass {
            center,
            radius: logo_radius,
            side_px: logo_px,
        }));

        let ring = layout.logo_ring_width * s;
        let mut ring_ops = Vec::new();
        if ring > 0.0 {
            ring_ops.push(DrawOp::Stroke {
                path: circle_path(center, logo_radius),
                width: ring,
                color: HexColor::WHITE,
            });
        }
        logo_passes.push(Pass::LogoRing(ScenePass {
            ops: ring_ops,
            clip: None,
        }));
    }

    Ok(RenderPlan {
        canvas: Canvas::square(side_px),
        scale,
        qr_px,
        logo_px,
        base_passes,
        logo_passes,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/compile/plan.rs"]
mod tests;

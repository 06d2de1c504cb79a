use std::{collections::HashMap, sync::Arc};

use kurbo::Shape as _;

use crate::{
    assets::{fonts::PreparedCaption, raster::RasterImage},
    compile::{
        geometry::circle_path,
        plan::{BlitPass, DrawOp, ImagePass, ScenePass, ShadowPass, TextPass},
    },
    foundation::{
        core::{Affine, BezPath, Canvas, HexColor, Point},
        error::{QrCardError, QrCardResult},
    },
    render::{
        FrameRGBA,
        blur::blur_rgba8_premul,
        composite::{Placement, over_in_place, over_region_in_place},
        passes::PassBackend,
    },
};

/// CPU pass backend built on `vello_cpu`.
///
/// Owns one target surface for the lifetime of a render; nothing is shared between invocations.
/// Every vector pass is rasterized into a fresh transparent layer and composited source-over
/// onto the target, so pass order is exactly paint order.
pub struct CpuBackend {
    width: u16,
    height: u16,
    target: vello_cpu::Pixmap,
}

impl CpuBackend {
    /// Allocate a transparent target surface.
    pub fn new(canvas: Canvas) -> QrCardResult<Self> {
        let (width, height) = canvas_to_u16(canvas.width, canvas.height)?;
        Ok(Self {
            width,
            height,
            target: vello_cpu::Pixmap::new(width, height),
        })
    }

    fn context(&self) -> vello_cpu::RenderContext {
        vello_cpu::RenderContext::new(self.width, self.height)
    }

    fn composite_context(&mut self, mut ctx: vello_cpu::RenderContext) -> QrCardResult<()> {
        ctx.flush();
        let mut layer = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.render_to_pixmap(&mut layer);
        over_in_place(
            self.target.data_as_u8_slice_mut(),
            layer.data_as_u8_slice(),
            1.0,
        )
    }

    fn composite_region(&mut self, src: &[u8], at: Placement) -> QrCardResult<()> {
        over_region_in_place(
            self.target.data_as_u8_slice_mut(),
            u32::from(self.width),
            src,
            at,
        )
    }
}

impl PassBackend for CpuBackend {
    fn exec_scene(&mut self, pass: &ScenePass) -> QrCardResult<()> {
        if pass.ops.is_empty() {
            return Ok(());
        }
        let mut ctx = self.context();
        if let Some(clip) = &pass.clip {
            ctx.push_clip_layer(&bezpath_to_cpu(clip));
        }
        for op in &pass.ops {
            draw_op(&mut ctx, op);
        }
        if pass.clip.is_some() {
            ctx.pop_layer();
        }
        self.composite_context(ctx)
    }

    fn exec_blit(&mut self, pass: &BlitPass, image: &RasterImage) -> QrCardResult<()> {
        let d = pass.dest;
        let aligned = d.x0.fract() == 0.0
            && d.y0.fract() == 0.0
            && d.width() == f64::from(image.width())
            && d.height() == f64::from(image.height());
        if aligned {
            return self.composite_region(
                image.rgba8_premul(),
                Placement {
                    x: d.x0 as i32,
                    y: d.y0 as i32,
                    width: image.width(),
                    height: image.height(),
                },
            );
        }

        tracing::debug!(
            dest = ?d,
            image_w = image.width(),
            image_h = image.height(),
            "blit needs resampling"
        );
        let paint = image_paint(image)?;
        let mut ctx = self.context();
        ctx.set_transform(affine_to_cpu(
            Affine::translate((d.x0, d.y0))
                * Affine::scale_non_uniform(
                    d.width() / f64::from(image.width()),
                    d.height() / f64::from(image.height()),
                ),
        ));
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(image.width()),
            f64::from(image.height()),
        ));
        self.composite_context(ctx)
    }

    fn exec_text(&mut self, pass: &TextPass, caption: &PreparedCaption) -> QrCardResult<()> {
        let mut fonts = RunFonts::new(caption.font_blob_id, &caption.font_bytes);
        let left = pass.center_x - f64::from(caption.width()) / 2.0;

        let mut ctx = self.context();
        ctx.push_clip_layer(&bezpath_to_cpu(&pass.band.to_path(0.1)));
        ctx.set_transform(affine_to_cpu(Affine::translate((left, pass.top))));
        for line in caption.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let brush = run.style().brush;
                let color = if brush.a == 0 {
                    pass.ink.to_rgba8()
                } else {
                    [brush.r, brush.g, brush.b, brush.a]
                };
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    color[0], color[1], color[2], color[3],
                ));

                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                let run_font = run.run().font();
                ctx.glyph_run(&fonts.font_for(&run_font.data, run_font.index))
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.pop_layer();
        self.composite_context(ctx)
    }

    fn exec_shadow(&mut self, pass: &ShadowPass) -> QrCardResult<()> {
        // The halo is drawn and blurred on a local surface that leaves room for the kernel.
        let reach = pass.radius + f64::from(pass.kernel_radius) + 2.0;
        let x0 = (pass.center.x - reach).floor();
        let y0 = (pass.center.y - reach).floor();
        let side = (pass.center.x + reach).ceil() - x0;
        let (side_u16, _) = canvas_to_u16(side as u32, side as u32)?;
        let side_u32 = u32::from(side_u16);

        let mut ctx = vello_cpu::RenderContext::new(side_u16, side_u16);
        ctx.set_paint(color_to_cpu(pass.shadow));
        ctx.fill_path(&bezpath_to_cpu(&circle_path(
            Point::new(pass.center.x - x0, pass.center.y - y0),
            pass.radius,
        )));
        ctx.flush();
        let mut halo = vello_cpu::Pixmap::new(side_u16, side_u16);
        ctx.render_to_pixmap(&mut halo);

        let blurred = if pass.kernel_radius > 0 && pass.sigma > 0.0 {
            blur_rgba8_premul(
                halo.data_as_u8_slice(),
                side_u32,
                side_u32,
                pass.kernel_radius,
                pass.sigma,
            )?
        } else {
            halo.data_as_u8_slice().to_vec()
        };
        self.composite_region(
            &blurred,
            Placement {
                x: x0 as i32,
                y: y0 as i32,
                width: side_u32,
                height: side_u32,
            },
        )?;

        let mut ctx = self.context();
        ctx.set_paint(color_to_cpu(pass.disc));
        ctx.fill_path(&bezpath_to_cpu(&circle_path(pass.center, pass.radius)));
        self.composite_context(ctx)
    }

    fn exec_image(&mut self, pass: &ImagePass, image: &RasterImage) -> QrCardResult<()> {
        if image.width() != pass.side_px || image.height() != pass.side_px {
            return Err(QrCardError::raster(format!(
                "logo bitmap is {}x{}, pass expects {}x{}",
                image.width(),
                image.height(),
                pass.side_px,
                pass.side_px
            )));
        }
        let paint = image_paint(image)?;
        let diameter = 2.0 * pass.radius;
        let k = diameter / f64::from(pass.side_px);

        let mut ctx = self.context();
        ctx.push_clip_layer(&bezpath_to_cpu(&circle_path(pass.center, pass.radius)));
        ctx.set_transform(affine_to_cpu(
            Affine::translate((pass.center.x - pass.radius, pass.center.y - pass.radius))
                * Affine::scale(k),
        ));
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(pass.side_px),
            f64::from(pass.side_px),
        ));
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.pop_layer();
        self.composite_context(ctx)
    }

    fn readback_rgba8(&mut self) -> QrCardResult<FrameRGBA> {
        Ok(FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.target.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

/// Font data for glyph runs, keyed by the blob Parley shaped each run with.
///
/// Runs shaped with the caption's own face share its bytes; fallback faces are copied once
/// per text pass.
struct RunFonts {
    primary_id: u64,
    primary: vello_cpu::peniko::Blob<u8>,
    fallbacks: HashMap<u64, vello_cpu::peniko::Blob<u8>>,
}

impl RunFonts {
    fn new(primary_id: u64, bytes: &Arc<Vec<u8>>) -> Self {
        let shared: Arc<dyn AsRef<[u8]> + Send + Sync> = bytes.clone();
        Self {
            primary_id,
            primary: vello_cpu::peniko::Blob::new(shared),
            fallbacks: HashMap::new(),
        }
    }

    fn font_for(
        &mut self,
        blob: &parley::fontique::Blob<u8>,
        index: u32,
    ) -> vello_cpu::peniko::FontData {
        let data = if blob.id() == self.primary_id {
            self.primary.clone()
        } else {
            self.fallbacks
                .entry(blob.id())
                .or_insert_with(|| {
                    tracing::debug!(blob = blob.id(), index, "caption run uses a fallback face");
                    vello_cpu::peniko::Blob::from(blob.data().to_vec())
                })
                .clone()
        };
        vello_cpu::peniko::FontData::new(data, index)
    }
}

fn canvas_to_u16(width: u32, height: u32) -> QrCardResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| QrCardError::raster("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| QrCardError::raster("surface height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(QrCardError::raster("surface must be at least 1x1"));
    }
    Ok((w, h))
}

fn draw_op(ctx: &mut vello_cpu::RenderContext, op: &DrawOp) {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

    match op {
        DrawOp::Fill { path, color } => {
            ctx.set_paint(color_to_cpu(*color));
            ctx.fill_path(&bezpath_to_cpu(path));
        }
        DrawOp::Stroke { path, width, color } => {
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(*width));
            ctx.set_paint(color_to_cpu(*color));
            ctx.stroke_path(&bezpath_to_cpu(path));
        }
    }
}

fn color_to_cpu(c: HexColor) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, 255)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn image_paint(image: &RasterImage) -> QrCardResult<vello_cpu::Image> {
    let pixmap = image_premul_bytes_to_pixmap(image.rgba8_premul(), image.width(), image.height())?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> QrCardResult<vello_cpu::Pixmap> {
    let (w, h) = canvas_to_u16(width, height)?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(QrCardError::raster("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let pixels = rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect::<Vec<_>>();

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;

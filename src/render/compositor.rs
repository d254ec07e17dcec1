use crate::assets::fonts::{FONT_CATALOG, FontSet};
use crate::assets::text::{ShapedText, TextInk, TextLayoutEngine};
use crate::effects::composite::composite_in_place;
use crate::foundation::core::{Affine, Resolution, Size, Vec2};
use crate::layer::model::{BlendMode, TextLayer};
use crate::layer::store::SceneSnapshot;
use crate::render::backend::FrameRGBA;
use crate::transform::resolver::{resolve, try_resolve};

/// CPU compositor: text layers bottom to top, each blended into the accumulator with its own
/// blend mode, then the base image over everything.
///
/// The output depends only on the snapshot, the target resolution and the font set. Internal
/// buffers are reused between calls but never carry state from one frame to the next.
pub struct Compositor {
    ctx: Option<vello_cpu::RenderContext>,
    scratch: Option<vello_cpu::Pixmap>,
    text: TextLayoutEngine,
    fallback_family: String,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("fallback_family", &self.fallback_family)
            .finish_non_exhaustive()
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self::with_fallback_family(FONT_CATALOG[0])
    }

    /// Compositor that substitutes `family` for fonts that are not loaded yet.
    pub fn with_fallback_family(family: impl Into<String>) -> Self {
        Self {
            ctx: None,
            scratch: None,
            text: TextLayoutEngine::new(),
            fallback_family: family.into(),
        }
    }

    pub fn fallback_family(&self) -> &str {
        &self.fallback_family
    }

    /// Natural text box of `layer` with the faces available in `fonts`.
    pub fn measure(&mut self, layer: &TextLayer, fonts: &FontSet) -> Size {
        self.text.measure(layer, fonts, &self.fallback_family)
    }

    #[tracing::instrument(
        skip(self, scene, fonts),
        fields(layers = scene.layers().len(), width = target.width, height = target.height)
    )]
    pub fn render(&mut self, scene: &SceneSnapshot, target: Resolution, fonts: &FontSet) -> FrameRGBA {
        let mut frame = FrameRGBA::transparent(target);
        let (Ok(w), Ok(h)) = (u16::try_from(target.width), u16::try_from(target.height)) else {
            tracing::debug!("target exceeds raster limits, returning empty frame");
            return frame;
        };
        if w == 0 || h == 0 {
            return frame;
        }

        let to_target = scene.viewport(target).to_target();

        for layer in scene.layers() {
            let opacity = layer.opacity() as f32;
            if opacity <= 0.0 {
                continue;
            }
            let shaped = self.text.shape_layer(layer, fonts, &self.fallback_family);
            let transform = to_target * ink_transform(layer, &shaped);
            let color = layer.color();
            let pixels = self.rasterize(w, h, |ctx| {
                ctx.set_transform(affine_to_cpu(transform));
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    color.r, color.g, color.b, 255,
                ));
                draw_ink(ctx, &shaped.ink);
            });
            composite_in_place(&mut frame.data, pixels, opacity, layer.blend_mode());
        }

        if let Some(base) = scene.base_image() {
            let (bw, bh) = (f64::from(base.width()), f64::from(base.height()));
            let paint = base.paint().clone();
            let pixels = self.rasterize(w, h, |ctx| {
                ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_transform(affine_to_cpu(to_target));
                ctx.set_paint(paint);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, bw, bh));
            });
            composite_in_place(&mut frame.data, pixels, 1.0, BlendMode::Normal);
        }

        frame
    }

    /// Run `draw` on a reset context and return the premultiplied pixels it produced.
    fn rasterize(
        &mut self,
        width: u16,
        height: u16,
        draw: impl FnOnce(&mut vello_cpu::RenderContext),
    ) -> &[u8] {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        draw(&mut ctx);
        ctx.flush();

        let mut pixmap = match self.scratch.take() {
            Some(p) if p.width() == width && p.height() == height => p,
            _ => vello_cpu::Pixmap::new(width, height),
        };
        pixmap.data_as_u8_slice_mut().fill(0);
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);

        self.scratch.insert(pixmap).data_as_u8_slice()
    }
}

/// Layer-local placement of the shaped ink: centered in the layer box, which pivots on its center.
///
/// A layer whose box was never measured uses the shaped size as its box.
fn ink_transform(layer: &TextLayer, shaped: &ShapedText) -> Affine {
    let declared = layer.bounding_size();
    let (box_size, forward) = if declared.width > 0.0 || declared.height > 0.0 {
        (declared, resolve(layer).forward)
    } else {
        let mut params = layer.transform_params();
        params.size = shaped.size;
        let forward = try_resolve(&params)
            .map(|r| r.forward)
            .unwrap_or_else(|| resolve(layer).forward);
        (shaped.size, forward)
    };
    let offset = Vec2::new(
        (box_size.width - shaped.size.width) * 0.5,
        (box_size.height - shaped.size.height) * 0.5,
    );
    forward * Affine::translate(offset)
}

fn draw_ink(ctx: &mut vello_cpu::RenderContext, ink: &TextInk) {
    match ink {
        TextInk::Outline {
            font,
            font_size,
            glyphs,
        } => {
            if glyphs.is_empty() {
                return;
            }
            ctx.glyph_run(font)
                .font_size(*font_size)
                .fill_glyphs(glyphs.iter().cloned());
        }
        TextInk::Blocks(rects) => {
            for r in rects {
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1));
            }
        }
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;

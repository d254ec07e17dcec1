use std::collections::BTreeMap;
use std::sync::Arc;

use crate::assets::fonts::{FontFace, FontSet};
use crate::foundation::core::{Rect, Size};
use crate::layer::model::TextLayer;

/// Advance of one character of the built-in block face, in em.
const BLOCK_ADVANCE_EM: f64 = 0.6;
const BLOCK_INK_WIDTH_EM: f64 = 0.5;
const BLOCK_INK_TOP_EM: f64 = 0.25;
const BLOCK_INK_BOTTOM_EM: f64 = 0.95;
const LINE_HEIGHT_EM: f64 = 1.2;
/// Width reserved for empty content so the layer keeps a grabbable box.
const EMPTY_WIDTH_EM: f64 = 0.5;

/// Shaped text of one layer in layer-local coordinates (origin at the top-left of the ink box).
#[derive(Clone, Debug)]
pub struct ShapedText {
    pub size: Size,
    pub ink: TextInk,
}

#[derive(Clone, Debug)]
pub enum TextInk {
    /// Outline glyphs from a loaded font.
    Outline {
        font: vello_cpu::peniko::FontData,
        font_size: f32,
        glyphs: Vec<vello_cpu::Glyph>,
    },
    /// Built-in block face used when no font bytes are available at all.
    Blocks(Vec<Rect>),
}

struct RegisteredFace {
    data: Arc<Vec<u8>>,
    family_name: String,
    paint_font: vello_cpu::peniko::FontData,
}

/// Shapes layer content with Parley against whatever fonts are currently loaded.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    registered: BTreeMap<String, RegisteredFace>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextLayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLayoutEngine")
            .field("registered", &self.registered.len())
            .finish_non_exhaustive()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: BTreeMap::new(),
        }
    }

    /// Natural box of the layer's content at its current typography.
    pub fn measure(&mut self, layer: &TextLayer, fonts: &FontSet, fallback_family: &str) -> Size {
        self.shape_layer(layer, fonts, fallback_family).size
    }

    /// Shape `layer` with its own family, else `fallback_family`, else the block face.
    pub fn shape_layer(
        &mut self,
        layer: &TextLayer,
        fonts: &FontSet,
        fallback_family: &str,
    ) -> ShapedText {
        let size_px = f64::from(layer.font_size_px());
        let spacing = layer.letter_spacing_px();

        let Some(face) = resolve_face(layer.font_family(), fonts, fallback_family) else {
            return shape_blocks(layer.content(), size_px, spacing);
        };
        match self.shape_outline(face, layer.content(), size_px as f32, spacing as f32) {
            Some(shaped) => shaped,
            None => {
                tracing::debug!(
                    family = face.family(),
                    "font bytes rejected by shaper, using block face"
                );
                shape_blocks(layer.content(), size_px, spacing)
            }
        }
    }

    fn shape_outline(
        &mut self,
        face: &FontFace,
        text: &str,
        size_px: f32,
        spacing: f32,
    ) -> Option<ShapedText> {
        let key = face.family().to_ascii_lowercase();
        let stale = self
            .registered
            .get(&key)
            .is_none_or(|r| !Arc::ptr_eq(&r.data, face.data()));
        if stale {
            let families = self.font_ctx.collection.register_fonts(
                parley::fontique::Blob::from(face.data().as_ref().clone()),
                None,
            );
            let family_id = families.first().map(|(id, _)| *id)?;
            let family_name = self.font_ctx.collection.family_name(family_id)?.to_string();
            let paint_font = vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(face.data().as_ref().clone()),
                face.index(),
            );
            self.registered.insert(
                key.clone(),
                RegisteredFace {
                    data: Arc::clone(face.data()),
                    family_name,
                    paint_font,
                },
            );
        }
        let registered = self.registered.get(&key)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(
                registered.family_name.clone(),
            )),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::LetterSpacing(spacing));
        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        let mut glyphs = Vec::new();
        let mut width = 0.0f64;
        let mut height = 0.0f64;
        for line in layout.lines() {
            let m = line.metrics();
            width = width.max(f64::from(m.advance));
            height += f64::from(m.ascent + m.descent + m.leading);
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                glyphs.extend(run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                }));
            }
        }

        let em = f64::from(size_px);
        if text.is_empty() {
            width = EMPTY_WIDTH_EM * em;
        }
        let height = height.max(LINE_HEIGHT_EM * em);
        Some(ShapedText {
            size: Size::new(width, height),
            ink: TextInk::Outline {
                font: registered.paint_font.clone(),
                font_size: size_px,
                glyphs,
            },
        })
    }
}

/// Face used to draw `family`: the family itself when loaded, else the fallback family.
pub fn resolve_face<'a>(
    family: &str,
    fonts: &'a FontSet,
    fallback_family: &str,
) -> Option<&'a FontFace> {
    fonts.get(family).or_else(|| fonts.get(fallback_family))
}

fn shape_blocks(text: &str, size_px: f64, spacing: f64) -> ShapedText {
    let advance = BLOCK_ADVANCE_EM * size_px + spacing;
    let line_height = LINE_HEIGHT_EM * size_px;
    let inset = (BLOCK_ADVANCE_EM - BLOCK_INK_WIDTH_EM) * 0.5 * size_px;

    let mut rects = Vec::new();
    let mut width = 0.0f64;
    let mut lines = 0usize;
    for (row, line) in text.split('\n').enumerate() {
        lines += 1;
        let top = row as f64 * line_height;
        let mut pen = 0.0f64;
        for ch in line.chars() {
            if !ch.is_whitespace() {
                let x0 = pen + inset;
                rects.push(Rect::new(
                    x0,
                    top + BLOCK_INK_TOP_EM * size_px,
                    x0 + BLOCK_INK_WIDTH_EM * size_px,
                    top + BLOCK_INK_BOTTOM_EM * size_px,
                ));
            }
            pen += advance;
        }
        width = width.max(pen);
    }

    if text.is_empty() {
        width = EMPTY_WIDTH_EM * size_px;
    }
    ShapedText {
        size: Size::new(width.max(0.0), lines as f64 * line_height),
        ink: TextInk::Blocks(rects),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;

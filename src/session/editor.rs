use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::assets::decode::{BaseImage, ImageInfo, decode_image};
use crate::assets::fonts::{
    Entitlements, FontLoader, FontRegistry, FontSet, FontSources, available_fonts, font_at,
    is_font_available,
};
use crate::assets::text::resolve_face;
use crate::config::EditorConfig;
use crate::export::exporter::{ExportFormat, Exporter, native_target};
use crate::foundation::core::{MAX_RASTER_EDGE, Point, Resolution, Size, Vec2};
use crate::foundation::error::TextBlendResult;
use crate::interaction::controller::InteractionController;
use crate::layer::model::{LayerId, LayerPatch, TextLayer};
use crate::layer::store::{LayerStore, SceneSnapshot};
use crate::render::backend::FrameRGBA;
use crate::render::compositor::Compositor;
use crate::session::document::LayerDocument;

/// Canvas aspect used before any image is loaded.
const EMPTY_CANVAS_ASPECT: (u32, u32) = (16, 9);

/// One editing session: the layer store, pointer state, font availability and render entry
/// points the presentation layer calls into.
pub struct Editor {
    config: EditorConfig,
    entitlements: Entitlements,
    store: LayerStore,
    controller: InteractionController,
    fonts: Arc<FontRegistry>,
    loader: FontLoader,
    preview: Compositor,
    exporter: Exporter,
    preview_width: u32,
    /// Face each layer's box was last measured with (`None` = built-in block face).
    measured_with: BTreeMap<LayerId, Option<String>>,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("entitlements", &self.entitlements)
            .field("layers", &self.store.len())
            .field("preview_width", &self.preview_width)
            .finish_non_exhaustive()
    }
}

impl Editor {
    pub fn new(config: EditorConfig, entitlements: Entitlements) -> Self {
        let fonts = Arc::new(FontRegistry::new());
        let loader = FontLoader::new(FontSources {
            dirs: config.font_dirs.clone(),
            system: config.load_system_fonts,
        });
        loader.ensure_loaded(Arc::clone(&fonts), [config.fallback_family.as_str()]);

        let preview = Compositor::with_fallback_family(config.fallback_family.clone());
        let exporter = Exporter::new(
            Compositor::with_fallback_family(config.fallback_family.clone()),
            config.export_font_timeout(),
        );
        let preview_width = config.preview_width.clamp(1, MAX_RASTER_EDGE);

        Self {
            config,
            entitlements,
            store: LayerStore::new(),
            controller: InteractionController::new(),
            fonts,
            loader,
            preview,
            exporter,
            preview_width,
            measured_with: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn entitlements(&self) -> Entitlements {
        self.entitlements
    }

    /// Change the session's tier. Stored layer families are left as they are.
    pub fn set_entitlements(&mut self, entitlements: Entitlements) {
        self.entitlements = entitlements;
    }

    /// Font families selectable in this session.
    pub fn available_fonts(&self) -> &'static [&'static str] {
        available_fonts(self.entitlements)
    }

    pub fn font_registry(&self) -> &Arc<FontRegistry> {
        &self.fonts
    }

    /// Current font availability.
    pub fn fonts(&self) -> Arc<FontSet> {
        self.fonts.snapshot()
    }

    /// Block until every font the layers use is settled, up to `timeout`.
    pub fn wait_for_fonts(&self, timeout: Duration) -> bool {
        let mut wanted = self.store.snapshot().referenced_families();
        wanted.insert(self.config.fallback_family.clone());
        self.fonts.wait_for(&wanted, timeout).1
    }

    /// Replace the base image with an already decoded one.
    pub fn on_image_decoded(&mut self, image: BaseImage) -> ImageInfo {
        let info = image.info();
        tracing::debug!(width = info.width, height = info.height, "base image replaced");
        self.store.set_base_image(Arc::new(image));
        info
    }

    /// Decode and install an uploaded image. On failure the session is left unchanged.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn load_image_bytes(&mut self, bytes: &[u8]) -> TextBlendResult<ImageInfo> {
        let image = decode_image(bytes)?;
        Ok(self.on_image_decoded(image))
    }

    pub fn image_info(&self) -> Option<ImageInfo> {
        self.store.base_image().map(|img| img.info())
    }

    /// Add a default layer centered on the canvas and select it.
    pub fn add_layer(&mut self) -> LayerId {
        let patch = LayerPatch::new()
            .content(self.config.default_content.clone())
            .color(self.config.default_color);
        let id = self.store.add(&patch);

        let canvas = self.canvas_size();
        let fonts = self.fonts.snapshot();
        if let Some(size) = self.measure(id, &fonts) {
            let centered = Point::new(
                (canvas.width - size.width) * 0.5,
                (canvas.height - size.height) * 0.5,
            );
            // `id` was allocated by `add` just above.
            let _ = self.store.update(
                id,
                &LayerPatch::new()
                    .bounding_size(size.width, size.height)
                    .position(centered.x, centered.y),
            );
        }
        // Same freshly added id.
        let _ = self.store.select(Some(id));
        self.request_fonts_for(id);
        tracing::debug!(layer = %id, "layer added");
        id
    }

    /// Apply a partial update from the parameter controls.
    ///
    /// Families outside the session's catalog subset are dropped from the patch. Changes that
    /// affect text layout re-measure the box around its center, or keep the given top-left when
    /// the patch also sets the position.
    pub fn update_layer(&mut self, id: LayerId, patch: LayerPatch) -> TextBlendResult<()> {
        let mut patch = patch;
        if let Some(family) = &patch.font_family
            && !is_font_available(self.entitlements, family)
        {
            tracing::debug!(layer = %id, family = family.as_str(), "font not in session catalog");
            patch.font_family = None;
        }

        self.store.update(id, &patch)?;
        if patch.touches_text_layout() && patch.bounding_size.is_none() {
            let fonts = self.fonts.snapshot();
            self.remeasure(id, &fonts, patch.position.is_none());
        }
        if patch.font_family.is_some() {
            self.request_fonts_for(id);
        }
        Ok(())
    }

    /// Select the catalog entry at `index` for layer `id`.
    pub fn select_font(&mut self, id: LayerId, index: usize) -> TextBlendResult<()> {
        let family = font_at(self.entitlements, index)?;
        self.update_layer(id, LayerPatch::new().font_family(family))
    }

    /// Duplicate `id` with the configured offset; the copy goes on top and becomes selected.
    pub fn duplicate_layer(&mut self, id: LayerId) -> TextBlendResult<LayerId> {
        let d = self.config.duplicate_offset_px;
        let copy = self.store.duplicate(id, Vec2::new(d, d))?;
        if let Some(face) = self.measured_with.get(&id).cloned() {
            self.measured_with.insert(copy, face);
        }
        self.store.select(Some(copy))?;
        Ok(copy)
    }

    pub fn remove_layer(&mut self, id: LayerId) -> TextBlendResult<()> {
        self.store.remove(id)?;
        self.measured_with.remove(&id);
        Ok(())
    }

    pub fn select_layer(&mut self, id: Option<LayerId>) -> TextBlendResult<()> {
        self.store.select(id)
    }

    pub fn bring_to_front(&mut self, id: LayerId) -> TextBlendResult<()> {
        self.store.bring_to_front(id)
    }

    pub fn send_to_back(&mut self, id: LayerId) -> TextBlendResult<()> {
        self.store.send_to_back(id)
    }

    /// Add one layer per document entry, bottom to top.
    pub fn apply_document(&mut self, doc: &LayerDocument) -> TextBlendResult<Vec<LayerId>> {
        let mut ids = Vec::with_capacity(doc.layers.len());
        for patch in &doc.layers {
            let id = self.add_layer();
            self.update_layer(id, patch.clone())?;
            ids.push(id);
        }
        Ok(ids)
    }

    pub fn pointer_down(&mut self, screen: Point) -> Option<LayerId> {
        let viewport = self.store.snapshot().viewport(self.preview_resolution());
        self.controller
            .pointer_down(&mut self.store, &viewport, screen)
    }

    pub fn pointer_move(&mut self, screen: Point) -> bool {
        self.controller.pointer_move(&mut self.store, screen)
    }

    pub fn pointer_up(&mut self) -> Option<LayerId> {
        self.controller.pointer_up(&mut self.store)
    }

    pub fn pointer_leave(&mut self) -> Option<LayerId> {
        self.controller.pointer_leave(&mut self.store)
    }

    pub fn is_dragging(&self) -> bool {
        self.controller.is_dragging()
    }

    pub fn set_preview_width(&mut self, width: u32) {
        self.preview_width = width.clamp(1, MAX_RASTER_EDGE);
    }

    /// Preview raster size: the configured width and the canvas aspect ratio.
    pub fn preview_resolution(&self) -> Resolution {
        let (w, h) = match self.store.base_image() {
            Some(img) => (img.width(), img.height()),
            None => EMPTY_CANVAS_ASPECT,
        };
        Resolution::with_width_keeping_aspect(self.preview_width, w, h).unwrap_or(Resolution {
            width: self.preview_width,
            height: MAX_RASTER_EDGE,
        })
    }

    /// Render the preview with whatever fonts are loaded right now.
    pub fn request_preview_frame(&mut self) -> FrameRGBA {
        let fonts = self.fonts.snapshot();
        self.refresh_measurements(&fonts);
        let res = self.preview_resolution();
        self.preview.render(&self.store.snapshot(), res, &fonts)
    }

    /// Export at native resolution in the configured format.
    pub fn request_export(&mut self) -> TextBlendResult<Vec<u8>> {
        self.request_export_as(self.config.export_format)
    }

    pub fn request_export_as(&mut self, format: ExportFormat) -> TextBlendResult<Vec<u8>> {
        let scene = self.store.snapshot();
        native_target(&scene)?;
        let fonts = self.exporter.wait_for_fonts(&scene, &self.fonts);
        self.refresh_measurements(&fonts);
        self.exporter
            .export_with_fonts(&self.store.snapshot(), &fonts, format)
    }

    pub fn layers(&self) -> &[TextLayer] {
        self.store.layers()
    }

    pub fn layer(&self, id: LayerId) -> Option<&TextLayer> {
        self.store.get(id)
    }

    pub fn selected_layer(&self) -> Option<&TextLayer> {
        self.store.selected_layer()
    }

    pub fn store(&self) -> &LayerStore {
        &self.store
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        self.store.snapshot()
    }

    /// Layer coordinates span the base image, or the preview canvas when there is none.
    fn canvas_size(&self) -> Size {
        match self.store.base_image() {
            Some(img) => Size::new(f64::from(img.width()), f64::from(img.height())),
            None => self.preview_resolution().as_size(),
        }
    }

    fn request_fonts_for(&self, id: LayerId) {
        if let Some(layer) = self.store.get(id) {
            self.loader
                .ensure_loaded(Arc::clone(&self.fonts), [layer.font_family()]);
        }
    }

    fn measure(&mut self, id: LayerId, fonts: &FontSet) -> Option<Size> {
        let layer = self.store.get(id)?;
        let face = resolve_face(layer.font_family(), fonts, self.preview.fallback_family())
            .map(|f| f.family().to_string());
        let size = self.preview.measure(layer, fonts);
        self.measured_with.insert(id, face);
        Some(size)
    }

    fn remeasure(&mut self, id: LayerId, fonts: &FontSet, keep_center: bool) {
        let Some(old) = self.store.get(id).map(|l| (l.position(), l.bounding_size())) else {
            return;
        };
        let Some(size) = self.measure(id, fonts) else {
            return;
        };
        let (position, old_size) = old;
        let mut patch = LayerPatch::new().bounding_size(size.width, size.height);
        if keep_center {
            let shift = Vec2::new(
                (old_size.width - size.width) * 0.5,
                (old_size.height - size.height) * 0.5,
            );
            let p = position + shift;
            patch = patch.position(p.x, p.y);
        }
        // `measure` found the layer, so the update cannot miss.
        let _ = self.store.update(id, &patch);
    }

    /// Re-measure layers whose resolved face changed since they were last measured.
    fn refresh_measurements(&mut self, fonts: &FontSet) {
        let fallback = self.preview.fallback_family().to_string();
        let stale: Vec<LayerId> = self
            .store
            .layers()
            .iter()
            .filter(|l| {
                let face = resolve_face(l.font_family(), fonts, &fallback).map(|f| f.family());
                self.measured_with.get(&l.id()).map(|m| m.as_deref()) != Some(face)
            })
            .map(|l| l.id())
            .collect();
        for id in stale {
            self.remeasure(id, fonts, true);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;

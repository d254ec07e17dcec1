use std::collections::BTreeSet;
use std::sync::Arc;

use crate::assets::decode::BaseImage;
use crate::foundation::core::{Resolution, Size, Vec2};
use crate::foundation::error::{TextBlendError, TextBlendResult};
use crate::layer::model::{LayerId, LayerPatch, TextLayer};
use crate::transform::viewport::Viewport;

/// Immutable view of the store handed to the compositor.
///
/// Cloning is cheap; later store mutations never reach an existing snapshot.
#[derive(Clone, Debug, Default)]
pub struct SceneSnapshot {
    layers: Arc<Vec<TextLayer>>,
    base: Option<Arc<BaseImage>>,
}

impl SceneSnapshot {
    /// Text layers bottom to top.
    pub fn layers(&self) -> &[TextLayer] {
        &self.layers
    }

    pub fn base_image(&self) -> Option<&Arc<BaseImage>> {
        self.base.as_ref()
    }

    pub fn native_resolution(&self) -> Option<Resolution> {
        self.base.as_ref().map(|b| b.resolution())
    }

    /// Font families used by at least one layer.
    pub fn referenced_families(&self) -> BTreeSet<String> {
        self.layers
            .iter()
            .map(|l| l.font_family().to_string())
            .collect()
    }

    /// Mapping from layer (image) space onto a `target` raster.
    ///
    /// Without a base image, layer space is taken to be the target itself.
    pub fn viewport(&self, target: Resolution) -> Viewport {
        match &self.base {
            Some(base) => Viewport::cover(
                Size::new(f64::from(base.width()), f64::from(base.height())),
                target,
            ),
            None => Viewport::identity(target),
        }
    }
}

/// Single owner of the text layers, the base image and the selection.
#[derive(Clone, Debug)]
pub struct LayerStore {
    layers: Arc<Vec<TextLayer>>,
    next_id: u64,
    selected: Option<LayerId>,
    base: Option<Arc<BaseImage>>,
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStore {
    pub fn new() -> Self {
        Self {
            layers: Arc::new(Vec::new()),
            next_id: 1,
            selected: None,
            base: None,
        }
    }

    /// Append a layer with model defaults overridden by `patch`; it lands on top of the text stack.
    pub fn add(&mut self, patch: &LayerPatch) -> LayerId {
        let id = self.allocate_id();
        let mut layer = TextLayer::new(id);
        layer.apply(patch);
        Arc::make_mut(&mut self.layers).push(layer);
        id
    }

    pub fn get(&self, id: LayerId) -> Option<&TextLayer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    pub fn layers(&self) -> &[TextLayer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Stack index of `id` (0 = bottom).
    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id() == id)
    }

    pub fn update(&mut self, id: LayerId, patch: &LayerPatch) -> TextBlendResult<()> {
        self.layer_mut(id)?.apply(patch);
        Ok(())
    }

    pub fn set_bounding_size(&mut self, id: LayerId, size: Size) -> TextBlendResult<()> {
        self.layer_mut(id)?.set_bounding_size(size);
        Ok(())
    }

    /// Deep copy of `id` under a fresh identity, shifted by `offset` and placed on top.
    pub fn duplicate(&mut self, id: LayerId, offset: Vec2) -> TextBlendResult<LayerId> {
        let source = self.get(id).ok_or_else(|| unknown_layer(id))?;
        let new_id = LayerId(self.next_id);
        let copy = source.duplicate_as(new_id, offset);
        self.next_id += 1;
        Arc::make_mut(&mut self.layers).push(copy);
        Ok(new_id)
    }

    /// Remove `id`; a selection pointing at it is cleared.
    pub fn remove(&mut self, id: LayerId) -> TextBlendResult<TextLayer> {
        let index = self.index_of(id).ok_or_else(|| unknown_layer(id))?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok(Arc::make_mut(&mut self.layers).remove(index))
    }

    pub fn select(&mut self, id: Option<LayerId>) -> TextBlendResult<()> {
        if let Some(id) = id
            && self.get(id).is_none()
        {
            return Err(unknown_layer(id));
        }
        self.selected = id;
        Ok(())
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.selected
    }

    pub fn selected_layer(&self) -> Option<&TextLayer> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Move `id` to stack position `index`, clamped to the top.
    pub fn move_layer(&mut self, id: LayerId, index: usize) -> TextBlendResult<()> {
        let from = self.index_of(id).ok_or_else(|| unknown_layer(id))?;
        let layers = Arc::make_mut(&mut self.layers);
        let layer = layers.remove(from);
        let to = index.min(layers.len());
        layers.insert(to, layer);
        Ok(())
    }

    pub fn bring_to_front(&mut self, id: LayerId) -> TextBlendResult<()> {
        self.move_layer(id, usize::MAX)
    }

    pub fn send_to_back(&mut self, id: LayerId) -> TextBlendResult<()> {
        self.move_layer(id, 0)
    }

    /// Replace the base image. Layers keep their stored coordinates.
    pub fn set_base_image(&mut self, image: Arc<BaseImage>) {
        self.base = Some(image);
    }

    pub fn base_image(&self) -> Option<&Arc<BaseImage>> {
        self.base.as_ref()
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            layers: Arc::clone(&self.layers),
            base: self.base.clone(),
        }
    }

    pub(crate) fn layer_mut(&mut self, id: LayerId) -> TextBlendResult<&mut TextLayer> {
        Arc::make_mut(&mut self.layers)
            .iter_mut()
            .find(|l| l.id() == id)
            .ok_or_else(|| unknown_layer(id))
    }

    fn allocate_id(&mut self) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        id
    }
}

fn unknown_layer(id: LayerId) -> TextBlendError {
    TextBlendError::validation(format!("unknown layer {id}"))
}

#[cfg(test)]
#[path = "../../tests/unit/layer/store.rs"]
mod tests;

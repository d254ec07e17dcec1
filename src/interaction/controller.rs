use crate::foundation::core::{Affine, Point, Size};
use crate::layer::model::{LayerId, LayerPatch};
use crate::layer::store::LayerStore;
use crate::transform::resolver::{
    ResolvedTransform, TransformParams, contains, layer_corners, resolve, try_resolve,
};
use crate::transform::viewport::Viewport;

/// Screen-space radius around the selected layer's bottom-right corner that starts a resize.
pub const HANDLE_RADIUS_PX: f64 = 12.0;
/// Smallest box edge a resize can produce, in image pixels.
pub const MIN_BOX_EDGE_PX: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrabMode {
    Move,
    Resize,
}

/// Everything a drag needs, captured once at pointer-down.
///
/// Every pointer-move is computed from this snapshot and the current pointer alone, so a drag
/// that returns to its start returns the layer to its start.
#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
    layer: LayerId,
    mode: GrabMode,
    screen_to_image: Affine,
    grab: ResolvedTransform,
    grab_local: Point,
    origin: TransformParams,
    origin_font_size: u32,
}

impl DragSession {
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn mode(&self) -> GrabMode {
        self.mode
    }

    /// Pointer position at grab time in the layer-local frame.
    pub fn grab_offset_local(&self) -> Point {
        self.grab_local
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Pointer-driven move/resize of text layers.
#[derive(Clone, Debug, Default)]
pub struct InteractionController {
    state: DragState,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Start a drag if `screen` lands on the selected layer's resize handle or on any layer.
    ///
    /// The top-most hit layer wins and becomes selected. A miss leaves the selection alone and
    /// returns `None`.
    pub fn pointer_down(
        &mut self,
        store: &mut LayerStore,
        viewport: &Viewport,
        screen: Point,
    ) -> Option<LayerId> {
        if self.is_dragging() {
            self.pointer_up(store);
        }

        let screen_to_image = viewport.to_source();
        let image_point = screen_to_image * screen;

        let handle_hit = store.selected_layer().filter(|layer| {
            let corner = viewport.to_target() * layer_corners(layer)[2];
            (corner - screen).hypot() <= HANDLE_RADIUS_PX
        });
        let (layer, mode) = match handle_hit {
            Some(layer) => (layer, GrabMode::Resize),
            None => (
                store
                    .layers()
                    .iter()
                    .rev()
                    .find(|l| contains(l, image_point))?,
                GrabMode::Move,
            ),
        };

        let grab = resolve(layer);
        let session = DragSession {
            layer: layer.id(),
            mode,
            screen_to_image,
            grab,
            grab_local: grab.to_local(image_point),
            origin: layer.transform_params(),
            origin_font_size: layer.font_size_px(),
        };
        let id = session.layer;
        // The hit layer was just found in the store.
        let _ = store.select(Some(id));
        tracing::debug!(layer = %id, ?mode, "drag started");
        self.state = DragState::Dragging(session);
        Some(id)
    }

    /// Apply the in-progress drag for the pointer at `screen`. Returns whether the store changed.
    pub fn pointer_move(&mut self, store: &mut LayerStore, screen: Point) -> bool {
        let DragState::Dragging(session) = &self.state else {
            return false;
        };
        let image_point = session.screen_to_image * screen;
        let patch = match session.mode {
            GrabMode::Move => move_patch(session, image_point),
            GrabMode::Resize => resize_patch(session, image_point),
        };

        if store.update(session.layer, &patch).is_err() {
            tracing::debug!(layer = %session.layer, "dragged layer disappeared, ending drag");
            self.state = DragState::Idle;
            return false;
        }
        true
    }

    /// End the drag, keeping the last applied geometry.
    pub fn pointer_up(&mut self, store: &mut LayerStore) -> Option<LayerId> {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return None;
        };
        let layer = store.get(session.layer)?;
        tracing::debug!(
            layer = %session.layer,
            x = layer.position().x,
            y = layer.position().y,
            "drag committed"
        );
        Some(session.layer)
    }

    /// Pointer left the surface; commits exactly like [`InteractionController::pointer_up`].
    pub fn pointer_leave(&mut self, store: &mut LayerStore) -> Option<LayerId> {
        self.pointer_up(store)
    }
}

fn move_patch(session: &DragSession, image_point: Point) -> LayerPatch {
    let local_delta = session.grab.to_local(image_point) - session.grab_local;
    let p = session.origin.position + session.grab.image_delta(local_delta);
    LayerPatch::new().position(p.x, p.y)
}

/// Grow the box by the local-frame pointer delta, keep its top-left corner pinned in image
/// space and scale the font with the height.
fn resize_patch(session: &DragSession, image_point: Point) -> LayerPatch {
    let d = session.grab.to_local(image_point) - session.grab_local;
    let origin_size = session.origin.size;
    let size = Size::new(
        (origin_size.width + d.x).max(MIN_BOX_EDGE_PX),
        (origin_size.height + d.y).max(MIN_BOX_EDGE_PX),
    );

    let mut patch = LayerPatch::new().bounding_size(size.width, size.height);
    if origin_size.height > 0.0 {
        let ratio = size.height / origin_size.height;
        let font = (f64::from(session.origin_font_size) * ratio).round() as i64;
        patch = patch.font_size_px(font);
    }

    // The box pivots on its center, so a new size moves the corner unless the position follows.
    let pinned = session.grab.to_image(Point::ZERO);
    let resized = TransformParams {
        size,
        ..session.origin
    };
    let position = match try_resolve(&resized) {
        Some(t) => session.origin.position + (pinned - t.to_image(Point::ZERO)),
        None => session.origin.position,
    };
    patch.position(position.x, position.y)
}

#[cfg(test)]
#[path = "../../tests/unit/interaction/controller.rs"]
mod tests;

//! textblend composites stacked text layers underneath a photograph.
//!
//! Each text layer blends into what is already below it with one of twelve blend modes; the photo
//! is drawn last, on top of all text, so bright and dark regions of the image decide where the
//! text shows through. The public surface is session-oriented:
//!
//! - Create an [`Editor`] from an [`EditorConfig`] and the session's [`Entitlements`]
//! - Load a base photo, add and edit [`TextLayer`]s, drive them with pointer events
//! - Render previews with [`Editor::request_preview_frame`] and export at the photo's native
//!   resolution with [`Editor::request_export`]
//!
//! The lower-level pieces ([`LayerStore`], [`Compositor`], [`InteractionController`],
//! [`Exporter`], [`FontRegistry`]) are exported for hosts that want to wire them differently.
#![forbid(unsafe_code)]

mod assets;
mod config;
mod effects;
mod export;
mod foundation;
mod interaction;
mod layer;
mod render;
mod session;
mod transform;

pub use crate::foundation::core::{
    Affine, MAX_RASTER_EDGE, Point, Rect, Resolution, Rgb8, Size, Vec2,
};
pub use crate::foundation::error::{TextBlendError, TextBlendResult};

pub use crate::assets::decode::{BaseImage, ImageInfo, aspect_ratio, decode_image, decode_image_path};
pub use crate::assets::fonts::{
    Entitlements, FONT_CATALOG, FREE_TIER_FONT_COUNT, FontFace, FontLoader, FontRegistry, FontSet,
    FontSources, available_fonts, font_at, is_font_available,
};
pub use crate::assets::text::{ShapedText, TextInk, TextLayoutEngine, resolve_face};
pub use crate::config::EditorConfig;
pub use crate::effects::composite::composite_in_place;
pub use crate::export::exporter::{
    DEFAULT_FONT_TIMEOUT, DEFAULT_JPEG_QUALITY, ExportFormat, Exporter, encode_frame,
};
pub use crate::interaction::controller::{
    DragSession, DragState, GrabMode, HANDLE_RADIUS_PX, InteractionController, MIN_BOX_EDGE_PX,
};
pub use crate::layer::model::{
    BlendMode, DEFAULT_FONT_SIZE_PX, FONT_SIZE_MAX_PX, FONT_SIZE_MIN_PX, LETTER_SPACING_RANGE_PX,
    LayerId, LayerPatch, ROTATION_RANGE_DEG, TILT_RANGE_DEG, TextLayer,
};
pub use crate::layer::store::{LayerStore, SceneSnapshot};
pub use crate::render::backend::FrameRGBA;
pub use crate::render::compositor::Compositor;
pub use crate::session::document::LayerDocument;
pub use crate::session::editor::Editor;
pub use crate::transform::resolver::{
    ResolvedTransform, TransformParams, contains, layer_corners, resolve, tilt_tangent,
    try_resolve,
};
pub use crate::transform::viewport::Viewport;

//! Geometry shared by rendering and direct manipulation.
//!
//! - [`resolver`] maps a layer's declarative parameters to a forward/inverse affine pair.
//! - [`viewport`] maps base-image pixel space onto a render target (preview or export).

pub(crate) mod resolver;
pub(crate) mod viewport;

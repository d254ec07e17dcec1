//! Inputs the renderer depends on: decoded base photos, font bytes and shaped text.

pub(crate) mod decode;
pub(crate) mod fonts;
pub(crate) mod text;

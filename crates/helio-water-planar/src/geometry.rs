//! Geometry collaborator

use crate::device::GraphicsDevice;
use crate::effect::Effect;
use crate::Result;

/// Procedural primitives the reference scene is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Box,
    Torus,
    Teapot,
    Quad,
    SkyCube,
}

impl PrimitiveKind {
    pub fn label(self) -> &'static str {
        match self {
            PrimitiveKind::Box => "box",
            PrimitiveKind::Torus => "torus",
            PrimitiveKind::Teapot => "teapot",
            PrimitiveKind::Quad => "quad",
            PrimitiveKind::SkyCube => "sky cube",
        }
    }
}

/// A mesh that can issue its own indexed draw.
///
/// `draw` binds the vertex/index buffers and draws with whatever technique
/// the caller selected on `effect`. Parameters must already be set.
pub trait Drawable {
    fn kind(&self) -> PrimitiveKind;

    fn draw(&self, device: &mut dyn GraphicsDevice, effect: &mut dyn Effect) -> Result<()>;
}

//! Off-screen capture of the scene into a render target

use glam::{Mat4, Vec3};

use crate::clip_plane::ClipPlane;
use crate::device::{ClearColor, DepthStencilState, GraphicsDevice, TargetScope, FAR_DEPTH};
use crate::render_target::RenderTarget;
use crate::scene::SceneRenderer;
use crate::{Error, Result};

/// Camera and clip plane one pass renders the scene with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassView {
    pub view: Mat4,
    pub projection: Mat4,
    pub eye: Vec3,
    pub clip_plane: ClipPlane,
}

/// Render the whole scene into `target`, overwriting its color and depth.
///
/// The target is bound for the duration of the call only; on return, also
/// on error, the default framebuffer is bound again and the depth-stencil
/// state is back to its default.
pub fn capture(
    device: &mut dyn GraphicsDevice,
    scene: &mut SceneRenderer,
    target: &RenderTarget,
    pass: &PassView,
    clear_color: ClearColor,
) -> Result<()> {
    let viewport = device.viewport();
    if !target.matches(&viewport) {
        return Err(Error::TargetSizeMismatch {
            target: target.id(),
            expected: viewport.size(),
            actual: target.size(),
        });
    }

    let mut bound = TargetScope::bind(device, target)?;
    bound.clear(clear_color, FAR_DEPTH);

    let drawn = scene.draw_scene(&mut *bound, pass.view, pass.projection, pass.eye, pass.clip_plane);

    bound.set_depth_stencil_state(DepthStencilState::DEFAULT);
    drop(bound);

    debug_assert!(device.render_target().is_none());
    drawn
}

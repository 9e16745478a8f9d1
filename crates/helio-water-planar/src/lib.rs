//! Helio Planar Water - reflective/refractive water via render-to-texture
//!
//! Each frame runs a short, fixed pipeline:
//!
//! - Refraction capture: the scene below the water plane is drawn into an
//!   off-screen target (skipped when refraction is disabled)
//! - Reflection capture: the scene above the water plane is drawn from a
//!   camera mirrored across the plane
//! - Onscreen pass: sky and opaque objects are drawn into the default framebuffer
//! - Composite: the water quad samples both captures, perturbed by animated
//!   normal/distortion maps, and adds a specular highlight
//!
//! The graphics device, shader programs and meshes are collaborators reached
//! through the traits in [`device`], [`effect`] and [`geometry`]. [`uniforms`]
//! packs effect parameters into the blocks the [`shaders`] declare and
//! [`trace`] provides a headless recording backend.

pub mod camera;
pub mod capture;
pub mod clip_plane;
pub mod config;
pub mod device;
pub mod effect;
pub mod frame;
pub mod geometry;
pub mod reflection;
pub mod render_target;
pub mod scene;
pub mod shaders;
pub mod trace;
pub mod uniforms;
pub mod water;

pub use camera::CameraState;
pub use clip_plane::{build_clip_plane, ClipPlane};
pub use config::{PipelineFeatures, TargetFormats, WaterPipelineConfig};
pub use device::{ClearColor, CullMode, DepthStencilState, GraphicsDevice, RasterizerState, Viewport};
pub use effect::{Effect, ParameterValue, TextureHandle};
pub use frame::{FrameContext, FrameReport, FrameStage, WaterPipeline};
pub use geometry::{Drawable, PrimitiveKind};
pub use reflection::{compute_reflected_view, reflect, ReflectedView, ReflectionPlane};
pub use render_target::{CaptureTargets, RenderTarget, RenderTargetAllocator, RenderTargetDesc, RenderTargetId};
pub use scene::{Material, PointLight, SceneObject, SceneRenderer, Skybox};
pub use water::{WaterBindings, WaterCompositor, WaterSettings, WaterSurface};

/// Result type for water pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering a frame
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Resource error: {0}")]
    Resource(String),

    #[error("Render target {target} is {actual:?} but the viewport is {expected:?}")]
    TargetSizeMismatch {
        target: RenderTargetId,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Draw error: {0}")]
    Draw(String),

    #[error("Config error: {0}")]
    Config(String),
}

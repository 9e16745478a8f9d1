//! Off-screen render targets for the reflection and refraction captures

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::TargetFormats;
use crate::device::Viewport;
use crate::effect::TextureHandle;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetId(pub u32);

impl fmt::Display for RenderTargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "render target #{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColorFormat {
    #[default]
    Rgba8,
    Rgba16Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DepthFormat {
    None,
    Depth24,
    #[default]
    Depth24Stencil8,
    Depth32Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub color_format: ColorFormat,
    pub depth_format: DepthFormat,
    pub mipmapped: bool,
}

impl RenderTargetDesc {
    /// Mip-mapped RGBA8 target with a depth-stencil buffer
    pub fn color(width: u32, height: u32) -> Self {
        Self {
            label: "Render Target",
            width,
            height,
            color_format: ColorFormat::default(),
            depth_format: DepthFormat::default(),
            mipmapped: true,
        }
    }

    pub fn with_formats(mut self, formats: &TargetFormats) -> Self {
        self.color_format = formats.color;
        self.depth_format = formats.depth;
        self.mipmapped = formats.mipmapped;
        self
    }

    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }
}

/// Handle to an allocated target; the backing memory belongs to the allocator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    id: RenderTargetId,
    desc: RenderTargetDesc,
}

impl RenderTarget {
    pub fn new(id: RenderTargetId, desc: RenderTargetDesc) -> Self {
        Self { id, desc }
    }

    pub fn id(&self) -> RenderTargetId {
        self.id
    }

    pub fn desc(&self) -> &RenderTargetDesc {
        &self.desc
    }

    pub fn size(&self) -> (u32, u32) {
        (self.desc.width, self.desc.height)
    }

    /// Color buffer as a shader input
    pub fn texture(&self) -> TextureHandle {
        TextureHandle::RenderTarget(self.id)
    }

    pub fn matches(&self, viewport: &Viewport) -> bool {
        self.size() == viewport.size()
    }
}

/// Render-target collaborator
pub trait RenderTargetAllocator {
    fn create(&mut self, desc: &RenderTargetDesc) -> Result<RenderTarget>;

    fn release(&mut self, target: RenderTarget);
}

/// The reflection target plus, when refraction is enabled, the refraction target.
///
/// Both are kept at the viewport size; a stale size means reallocation.
pub struct CaptureTargets {
    formats: TargetFormats,
    refraction_enabled: bool,
    reflection: Option<RenderTarget>,
    refraction: Option<RenderTarget>,
}

impl CaptureTargets {
    pub fn new(formats: TargetFormats, refraction_enabled: bool) -> Self {
        Self {
            formats,
            refraction_enabled,
            reflection: None,
            refraction: None,
        }
    }

    pub fn reflection(&self) -> Option<&RenderTarget> {
        self.reflection.as_ref()
    }

    pub fn refraction(&self) -> Option<&RenderTarget> {
        self.refraction.as_ref()
    }

    /// Whether every required target exists and matches `viewport`
    pub fn is_current(&self, viewport: &Viewport) -> bool {
        let fits = |t: &Option<RenderTarget>| t.as_ref().is_some_and(|t| t.matches(viewport));
        fits(&self.reflection) && (!self.refraction_enabled || fits(&self.refraction))
    }

    /// Reallocate any target that is missing or sized differently from `viewport`.
    ///
    /// Returns `true` when something was (re)allocated.
    pub fn ensure(&mut self, allocator: &mut dyn RenderTargetAllocator, viewport: &Viewport) -> Result<bool> {
        if self.is_current(viewport) {
            return Ok(false);
        }
        self.allocate(allocator, viewport.width, viewport.height)?;
        Ok(true)
    }

    /// Drop the current targets and allocate new ones at `width` x `height`
    pub fn allocate(&mut self, allocator: &mut dyn RenderTargetAllocator, width: u32, height: u32) -> Result<()> {
        self.release(allocator);
        log::info!("Allocating water capture targets at {}x{}", width, height);

        let desc = RenderTargetDesc::color(width, height).with_formats(&self.formats);
        self.reflection = Some(allocator.create(&desc.with_label("Reflection Target"))?);
        if self.refraction_enabled {
            self.refraction = Some(allocator.create(&desc.with_label("Refraction Target"))?);
        }
        Ok(())
    }

    pub fn release(&mut self, allocator: &mut dyn RenderTargetAllocator) {
        for target in [self.reflection.take(), self.refraction.take()].into_iter().flatten() {
            log::debug!("Releasing {} ({}x{})", target.id(), target.desc().width, target.desc().height);
            allocator.release(target);
        }
    }
}

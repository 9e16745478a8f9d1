//! Graphics device collaborator and scoped state guards
//!
//! The device exposes global rasterizer, depth-stencil and render-target
//! state. Rasterizer and render-target changes go through a scope guard that
//! puts the previous value back when it is dropped, so state is restored on
//! every exit path including `?` propagation. Captures put depth-stencil back
//! to [`DepthStencilState::DEFAULT`] before unbinding.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::render_target::{RenderTarget, RenderTargetId};
use crate::{Error, Result};

/// Which triangle faces are discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    /// Draw both faces
    None,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterizerState {
    pub cull_mode: CullMode,
    pub wireframe: bool,
}

impl RasterizerState {
    pub const CULL_BACK: Self = Self { cull_mode: CullMode::Back, wireframe: false };
    pub const CULL_NONE: Self = Self { cull_mode: CullMode::None, wireframe: false };
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self::CULL_BACK
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    Less,
    LessEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub compare: CompareFunction,
}

impl DepthStencilState {
    pub const DEFAULT: Self = Self { depth_test: true, depth_write: true, compare: CompareFunction::LessEqual };
    pub const NONE: Self = Self { depth_test: false, depth_write: false, compare: CompareFunction::Always };
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Linear RGBA clear color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColor {
    pub const CORNFLOWER_BLUE: Self = Self { r: 100.0 / 255.0, g: 149.0 / 255.0, b: 237.0 / 255.0, a: 1.0 };

    pub fn from_array([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Depth value that clears to the far plane
pub const FAR_DEPTH: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Immediate-mode graphics device driven from a single thread
pub trait GraphicsDevice {
    fn viewport(&self) -> Viewport;

    /// Currently bound off-screen target, `None` for the default framebuffer
    fn render_target(&self) -> Option<RenderTargetId>;

    /// Bind `target`, or the default framebuffer when `None`
    fn set_render_target(&mut self, target: Option<&RenderTarget>);

    fn rasterizer_state(&self) -> RasterizerState;

    fn set_rasterizer_state(&mut self, state: RasterizerState);

    fn depth_stencil_state(&self) -> DepthStencilState;

    fn set_depth_stencil_state(&mut self, state: DepthStencilState);

    /// Clear color and depth of the bound destination
    fn clear(&mut self, color: ClearColor, depth: f32);
}

/// Rasterizer state override, restored on drop
pub struct RasterizerScope<'a, D: GraphicsDevice + ?Sized> {
    device: &'a mut D,
    saved: RasterizerState,
}

impl<'a, D: GraphicsDevice + ?Sized> RasterizerScope<'a, D> {
    pub fn new(device: &'a mut D, state: RasterizerState) -> Self {
        let saved = device.rasterizer_state();
        device.set_rasterizer_state(state);
        Self { device, saved }
    }

    pub fn saved(&self) -> RasterizerState {
        self.saved
    }
}

impl<D: GraphicsDevice + ?Sized> Deref for RasterizerScope<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        &*self.device
    }
}

impl<D: GraphicsDevice + ?Sized> DerefMut for RasterizerScope<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut *self.device
    }
}

impl<D: GraphicsDevice + ?Sized> Drop for RasterizerScope<'_, D> {
    fn drop(&mut self) {
        self.device.set_rasterizer_state(self.saved);
    }
}

/// Exclusive binding of an off-screen target.
///
/// Only one target may be bound at a time. Dropping the scope rebinds the
/// default framebuffer.
pub struct TargetScope<'a, D: GraphicsDevice + ?Sized> {
    device: &'a mut D,
    target: RenderTargetId,
}

impl<'a, D: GraphicsDevice + ?Sized> TargetScope<'a, D> {
    pub fn bind(device: &'a mut D, target: &RenderTarget) -> Result<Self> {
        if let Some(bound) = device.render_target() {
            return Err(Error::Resource(format!(
                "cannot bind {} while {} is still bound",
                target.id(),
                bound
            )));
        }
        device.set_render_target(Some(target));
        Ok(Self { device, target: target.id() })
    }

    pub fn target(&self) -> RenderTargetId {
        self.target
    }
}

impl<D: GraphicsDevice + ?Sized> Deref for TargetScope<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        &*self.device
    }
}

impl<D: GraphicsDevice + ?Sized> DerefMut for TargetScope<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut *self.device
    }
}

impl<D: GraphicsDevice + ?Sized> Drop for TargetScope<'_, D> {
    fn drop(&mut self) {
        log::trace!("Unbinding {}", self.target);
        self.device.set_render_target(None);
    }
}

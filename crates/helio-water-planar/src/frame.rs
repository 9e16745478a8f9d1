//! Per-frame sequencing of the water pipeline
//!
//! A frame walks `RefractionPass -> ReflectionPass -> OnscreenPass -> Composited`
//! exactly once. The refraction pass is skipped when refraction is disabled.
//! Each capture unbinds its target before the next stage starts, so the
//! compositor only ever samples fully written textures.

use std::sync::Arc;

use glam::Vec3;

use crate::camera::CameraState;
use crate::capture::{capture, PassView};
use crate::clip_plane::ClipPlane;
use crate::config::{PipelineFeatures, WaterPipelineConfig};
use crate::device::{GraphicsDevice, FAR_DEPTH};
use crate::effect::Effect;
use crate::geometry::Drawable;
use crate::render_target::{CaptureTargets, RenderTarget, RenderTargetAllocator};
use crate::scene::SceneRenderer;
use crate::water::{WaterCompositor, WaterFrame, WaterSurface, WaterTextures};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameStage {
    RefractionPass,
    ReflectionPass,
    OnscreenPass,
    Composited,
}

impl FrameStage {
    /// Stage every frame starts from
    pub fn first(features: &PipelineFeatures) -> Self {
        if features.refraction {
            FrameStage::RefractionPass
        } else {
            FrameStage::ReflectionPass
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            FrameStage::RefractionPass => Some(FrameStage::ReflectionPass),
            FrameStage::ReflectionPass => Some(FrameStage::OnscreenPass),
            FrameStage::OnscreenPass => Some(FrameStage::Composited),
            FrameStage::Composited => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FrameStage::RefractionPass => "refraction",
            FrameStage::ReflectionPass => "reflection",
            FrameStage::OnscreenPass => "onscreen",
            FrameStage::Composited => "composited",
        }
    }
}

/// Host inputs for one frame
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub camera: &'a CameraState,
    /// Seconds since the application started
    pub elapsed_seconds: f32,
}

/// What a completed frame did
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub stages: Vec<FrameStage>,
    /// Capture targets were (re)allocated for a new viewport size
    pub reallocated: bool,
    pub reflected_eye: Vec3,
}

/// Owns the capture targets, the scene and the water compositor
pub struct WaterPipeline {
    config: WaterPipelineConfig,
    scene: SceneRenderer,
    water: WaterCompositor,
    surface: WaterSurface,
    targets: CaptureTargets,
    stage: FrameStage,
    frame: u64,
}

impl WaterPipeline {
    pub fn new(
        config: WaterPipelineConfig,
        scene: SceneRenderer,
        surface: WaterSurface,
        water_effect: Box<dyn Effect>,
        water_mesh: Arc<dyn Drawable>,
        textures: WaterTextures,
    ) -> Self {
        log::info!(
            "Creating water pipeline (refraction: {}, distortion map: {}, fresnel: {})",
            config.features.refraction,
            config.features.distortion_map,
            config.features.fresnel
        );

        let water = WaterCompositor::new(water_effect, water_mesh, textures, config.water, config.features)
            .with_light(*scene.light());
        let targets = CaptureTargets::new(config.targets, config.features.refraction);
        let stage = FrameStage::first(&config.features);

        Self {
            config,
            scene,
            water,
            surface,
            targets,
            stage,
            frame: 0,
        }
    }

    pub fn config(&self) -> &WaterPipelineConfig {
        &self.config
    }

    /// Stage the current (or last) frame is in
    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    pub fn targets(&self) -> &CaptureTargets {
        &self.targets
    }

    pub fn scene_mut(&mut self) -> &mut SceneRenderer {
        &mut self.scene
    }

    pub fn surface(&self) -> &WaterSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut WaterSurface {
        &mut self.surface
    }

    pub fn water_mut(&mut self) -> &mut WaterCompositor {
        &mut self.water
    }

    /// Reallocate the capture targets for a new viewport size
    pub fn resize(&mut self, allocator: &mut dyn RenderTargetAllocator, width: u32, height: u32) -> Result<()> {
        self.targets.allocate(allocator, width, height)
    }

    pub fn release(&mut self, allocator: &mut dyn RenderTargetAllocator) {
        self.targets.release(allocator);
    }

    /// Render one frame.
    ///
    /// On error the frame is abandoned; the next call starts from the first
    /// stage again with device state already restored by the stage guards.
    pub fn render_frame<B>(&mut self, backend: &mut B, ctx: &FrameContext<'_>) -> Result<FrameReport>
    where
        B: GraphicsDevice + RenderTargetAllocator,
    {
        self.frame += 1;
        self.stage = FrameStage::first(&self.config.features);

        let result = self.run_frame(backend, ctx);
        if let Err(err) = &result {
            log::warn!("Abandoning frame {} during {} pass: {}", self.frame, self.stage.label(), err);
            self.stage = FrameStage::first(&self.config.features);
        }
        result
    }

    fn enter(&mut self, stage: FrameStage, stages: &mut Vec<FrameStage>) {
        log::debug!("Frame {}: {} pass", self.frame, stage.label());
        self.stage = stage;
        stages.push(stage);
    }

    fn run_frame<B>(&mut self, backend: &mut B, ctx: &FrameContext<'_>) -> Result<FrameReport>
    where
        B: GraphicsDevice + RenderTargetAllocator,
    {
        let viewport = backend.viewport();
        let reallocated = self.targets.ensure(&mut *backend, &viewport)?;

        let camera = ctx.camera;
        let clear_color = self.config.clear_color();
        let plane = self.surface.plane();
        let mut stages = Vec::with_capacity(4);

        if self.config.features.refraction {
            self.enter(FrameStage::RefractionPass, &mut stages);
            let target = self
                .targets
                .refraction()
                .ok_or_else(|| Error::Resource("refraction target missing".to_string()))?;
            let pass = PassView {
                view: camera.view,
                projection: camera.projection,
                eye: camera.position,
                clip_plane: plane.clip_plane(false),
            };
            capture(&mut *backend, &mut self.scene, target, &pass, clear_color)?;
        }

        self.enter(FrameStage::ReflectionPass, &mut stages);
        let reflected = plane.reflect_view(camera.position, camera.forward, camera.up);
        let reflection_target = self
            .targets
            .reflection()
            .ok_or_else(|| Error::Resource("reflection target missing".to_string()))?;
        let pass = PassView {
            view: reflected.view,
            projection: camera.projection,
            eye: reflected.position,
            clip_plane: plane.clip_plane(true),
        };
        capture(&mut *backend, &mut self.scene, reflection_target, &pass, clear_color)?;
        let reflection = reflection_target.texture();
        let refraction = self.targets.refraction().map(RenderTarget::texture);

        self.enter(FrameStage::OnscreenPass, &mut stages);
        debug_assert!(backend.render_target().is_none());
        backend.clear(clear_color, FAR_DEPTH);
        self.scene
            .draw_scene(&mut *backend, camera.view, camera.projection, camera.position, ClipPlane::NONE)?;

        let water_frame = WaterFrame {
            world: self.surface.world,
            view: camera.view,
            projection: camera.projection,
            reflection_view: reflected.view,
            eye: camera.position,
            elapsed_seconds: ctx.elapsed_seconds,
            reflection,
            refraction,
        };
        self.water.draw_water(&mut *backend, &water_frame)?;

        self.enter(FrameStage::Composited, &mut stages);

        Ok(FrameReport {
            frame: self.frame,
            stages,
            reallocated,
            reflected_eye: reflected.position,
        })
    }
}

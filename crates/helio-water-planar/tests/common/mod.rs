#![allow(dead_code)]

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use helio_water_planar::camera::DEFAULT_CAMERA_POSITION;
use helio_water_planar::trace::{DrawRecord, TraceDevice, TraceEffect, TraceLog, TraceMesh};
use helio_water_planar::water::WaterTextures;
use helio_water_planar::{
    CameraState, Material, PrimitiveKind, RenderTargetId, SceneObject, SceneRenderer, Skybox, TextureHandle,
    Viewport, WaterPipeline, WaterPipelineConfig, WaterSurface,
};

pub const NORMAL_MAP: TextureHandle = TextureHandle::Asset(10);
pub const DISTORTION_MAP: TextureHandle = TextureHandle::Asset(11);

pub struct Fixture {
    pub log: TraceLog,
    pub device: TraceDevice,
    pub pipeline: WaterPipeline,
    /// Makes the teapot draw fail while set
    pub teapot_fails: Arc<AtomicBool>,
}

impl Fixture {
    pub fn new(config: WaterPipelineConfig, width: u32, height: u32) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let log = TraceLog::new();
        let device = TraceDevice::new(log.clone(), Viewport::new(width, height));

        let teapot = TraceMesh::new(PrimitiveKind::Teapot, log.clone());
        let teapot_fails = teapot.fail_switch();
        let sky = TraceMesh::new(PrimitiveKind::SkyCube, log.clone());

        let scene = SceneRenderer::new(Box::new(TraceEffect::lighting(log.clone())))
            .with_skybox(
                Skybox::new(Arc::new(sky), TextureHandle::Asset(0), Box::new(TraceEffect::skybox(log.clone())))
                    .with_size(config.skybox_size),
            )
            .add_object(SceneObject::new(
                Arc::new(teapot),
                Mat4::from_translation(Vec3::new(0.0, 20.0, 0.0)),
                Material::flat(Vec3::new(0.8, 0.2, 0.2)),
            ))
            .add_object(SceneObject::new(
                Arc::new(TraceMesh::new(PrimitiveKind::Box, log.clone())),
                Mat4::from_translation(Vec3::new(60.0, -30.0, 0.0)),
                Material::flat(Vec3::new(0.6, 0.5, 0.3)),
            ))
            .add_object(SceneObject::new(
                Arc::new(TraceMesh::new(PrimitiveKind::Torus, log.clone())),
                Mat4::from_translation(Vec3::new(-60.0, 10.0, 0.0)),
                Material::default(),
            ));

        let textures = WaterTextures {
            normal_map: NORMAL_MAP,
            distortion_map: Some(DISTORTION_MAP),
        };
        let pipeline = WaterPipeline::new(
            config,
            scene,
            WaterSurface::horizontal(0.0, 1000.0),
            Box::new(TraceEffect::water(log.clone())),
            Arc::new(TraceMesh::new(PrimitiveKind::Quad, log.clone())),
            textures,
        );

        Self {
            log,
            device,
            pipeline,
            teapot_fails,
        }
    }

    pub fn reflection_id(&self) -> RenderTargetId {
        self.pipeline.targets().reflection().map(|t| t.id()).expect("reflection target")
    }

    pub fn refraction_id(&self) -> RenderTargetId {
        self.pipeline.targets().refraction().map(|t| t.id()).expect("refraction target")
    }

    /// Draws recorded into `target` since `mark`
    pub fn draws_into(&self, mark: usize, target: Option<RenderTargetId>) -> Vec<DrawRecord> {
        draws_since(&self.log, mark).into_iter().filter(|d| d.target == target).collect()
    }
}

pub fn draws_since(log: &TraceLog, mark: usize) -> Vec<DrawRecord> {
    log.since(mark)
        .into_iter()
        .filter_map(|e| match e {
            helio_water_planar::trace::TraceEvent::Draw(record) => Some(record),
            _ => None,
        })
        .collect()
}

/// Camera at the reference position looking at the origin
pub fn camera(aspect: f32) -> CameraState {
    CameraState::look_at(
        DEFAULT_CAMERA_POSITION,
        Vec3::ZERO,
        Vec3::Y,
        std::f32::consts::FRAC_PI_4,
        aspect,
        1.0,
        10_000.0,
    )
}

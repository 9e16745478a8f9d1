//! Headless walk through the planar water pipeline
//!
//! Renders a handful of frames of the reference scene (teapot, box and torus
//! around a water quad under a skybox) with the recording backend, orbiting
//! the camera and resizing the viewport half way through. Prints what each
//! frame did.
//!
//! Usage:
//!   water_frame [config.ron]
//!
//! Run with `RUST_LOG=debug` to see the per-pass log.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use helio_water_planar::camera::DEFAULT_CAMERA_POSITION;
use helio_water_planar::trace::{TraceDevice, TraceEffect, TraceEvent, TraceLog, TraceMesh};
use helio_water_planar::water::WaterTextures;
use helio_water_planar::{
    CameraState, Error, FrameContext, GraphicsDevice, Material, PrimitiveKind, SceneObject, SceneRenderer, Skybox,
    TextureHandle, Viewport, WaterPipeline, WaterPipelineConfig, WaterSurface,
};

const FRAMES: u32 = 6;
const FRAME_TIME: f32 = 1.0 / 60.0;

fn load_config() -> helio_water_planar::Result<WaterPipelineConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading pipeline config from {}", path);
            let source = std::fs::read_to_string(&path).map_err(|e| Error::Config(format!("{path}: {e}")))?;
            WaterPipelineConfig::from_ron_str(&source)
        }
        None => Ok(WaterPipelineConfig::default()),
    }
}

fn build_scene(events: &TraceLog, config: &WaterPipelineConfig) -> SceneRenderer {
    let mesh = |kind| Arc::new(TraceMesh::new(kind, events.clone()));

    SceneRenderer::new(Box::new(TraceEffect::lighting(events.clone())))
        .with_skybox(
            Skybox::new(
                mesh(PrimitiveKind::SkyCube),
                TextureHandle::Asset(0),
                Box::new(TraceEffect::skybox(events.clone())),
            )
            .with_size(config.skybox_size),
        )
        .add_object(SceneObject::new(
            mesh(PrimitiveKind::Teapot),
            Mat4::from_scale_rotation_translation(Vec3::splat(20.0), glam::Quat::IDENTITY, Vec3::new(0.0, 15.0, 0.0)),
            Material::flat(Vec3::new(0.8, 0.25, 0.2)),
        ))
        .add_object(SceneObject::new(
            mesh(PrimitiveKind::Box),
            Mat4::from_translation(Vec3::new(80.0, -20.0, -40.0)) * Mat4::from_scale(Vec3::splat(30.0)),
            Material::flat(Vec3::new(0.55, 0.45, 0.3)),
        ))
        .add_object(SceneObject::new(
            mesh(PrimitiveKind::Torus),
            Mat4::from_translation(Vec3::new(-80.0, 5.0, 30.0)) * Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2),
            Material::default(),
        ))
}

fn orbit_camera(t: f32, viewport: Viewport) -> CameraState {
    let angle = t * 0.5;
    let position = Mat4::from_rotation_y(angle).transform_point3(DEFAULT_CAMERA_POSITION);
    CameraState::look_at(
        position,
        Vec3::ZERO,
        Vec3::Y,
        std::f32::consts::FRAC_PI_4,
        viewport.aspect_ratio(),
        1.0,
        10_000.0,
    )
}

fn main() -> helio_water_planar::Result<()> {
    env_logger::init();
    log::info!("Starting planar water frame walk");

    let config = load_config()?;
    let events = TraceLog::new();
    let mut device = TraceDevice::new(events.clone(), Viewport::new(1280, 720));

    let textures = WaterTextures {
        normal_map: TextureHandle::Asset(1),
        distortion_map: config.features.distortion_map.then_some(TextureHandle::Asset(2)),
    };
    let scene = build_scene(&events, &config);
    let mut pipeline = WaterPipeline::new(
        config,
        scene,
        WaterSurface::horizontal(0.0, 1000.0),
        Box::new(TraceEffect::water(events.clone())),
        Arc::new(TraceMesh::new(PrimitiveKind::Quad, events.clone())),
        textures,
    );

    for i in 0..FRAMES {
        if i == FRAMES / 2 {
            log::info!("Resizing viewport to 800x600");
            device.set_viewport(Viewport::new(800, 600));
        }

        let elapsed = i as f32 * FRAME_TIME;
        let camera = orbit_camera(elapsed, device.viewport());
        let mark = events.len();

        let report = pipeline.render_frame(&mut device, &FrameContext { camera: &camera, elapsed_seconds: elapsed })?;

        let draws = events.since(mark).iter().filter(|e| matches!(e, TraceEvent::Draw(_))).count();
        println!(
            "frame {:>2}: {:?} draws={} reallocated={} mirrored eye={:.1?}",
            report.frame, report.stages, draws, report.reallocated, report.reflected_eye
        );
    }

    pipeline.release(&mut device);
    log::info!("Done, {} events recorded", events.len());
    Ok(())
}

mod common;

use std::sync::atomic::Ordering;

use glam::{Mat4, Vec3, Vec4};
use helio_water_planar::effect::{names, techniques};
use helio_water_planar::trace::TraceEvent;
use helio_water_planar::{
    ClearColor, Error, FrameContext, FrameStage, GraphicsDevice, ParameterValue, PrimitiveKind, RasterizerState,
    Viewport, WaterPipelineConfig, WaterSurface,
};

use common::{camera, draws_since, Fixture, DISTORTION_MAP, NORMAL_MAP};

fn vec4(p: Option<ParameterValue>) -> Vec4 {
    match p {
        Some(ParameterValue::Vector4(v)) => v,
        other => panic!("expected a vector4, got {other:?}"),
    }
}

fn vec3(p: Option<ParameterValue>) -> Vec3 {
    match p {
        Some(ParameterValue::Vector3(v)) => v,
        other => panic!("expected a vector3, got {other:?}"),
    }
}

#[test]
fn stages_run_refraction_reflection_onscreen_composite() {
    let mut fx = Fixture::new(WaterPipelineConfig::default(), 800, 600);
    let cam = camera(800.0 / 600.0);

    let report = fx
        .pipeline
        .render_frame(&mut fx.device, &FrameContext { camera: &cam, elapsed_seconds: 1.0 })
        .unwrap();

    assert_eq!(
        report.stages,
        [FrameStage::RefractionPass, FrameStage::ReflectionPass, FrameStage::OnscreenPass, FrameStage::Composited]
    );
    assert_eq!(fx.pipeline.stage(), FrameStage::Composited);
    assert!(report.reallocated);

    // Target bindings in pass order, each capture unbound before the next
    let refraction = fx.refraction_id();
    let reflection = fx.reflection_id();
    let bindings: Vec<_> = fx
        .log
        .events()
        .into_iter()
        .filter_map(|e| match e {
            TraceEvent::SetRenderTarget(t) => Some(t),
            _ => None,
        })
        .collect();
    assert_eq!(bindings, [Some(refraction), None, Some(reflection), None]);

    let draws = fx.log.draws();
    let last = draws.last().unwrap();
    assert_eq!(last.kind, PrimitiveKind::Quad);
    assert_eq!(last.effect, "water");
    assert_eq!(last.target, None);
    assert_eq!(fx.device.render_target(), None);
}

#[test]
fn every_pass_clears_to_the_configured_color() {
    let mut config = WaterPipelineConfig::default();
    config.clear_color = [0.1, 0.2, 0.3, 1.0];
    let mut fx = Fixture::new(config, 320, 240);
    let cam = camera(320.0 / 240.0);

    fx.pipeline
        .render_frame(&mut fx.device, &FrameContext { camera: &cam, elapsed_seconds: 0.0 })
        .unwrap();

    let clears: Vec<_> = fx
        .log
        .events()
        .into_iter()
        .filter_map(|e| match e {
            TraceEvent::Clear { target, color, depth } => Some((target, color, depth)),
            _ => None,
        })
        .collect();
    let color = ClearColor::from_array([0.1, 0.2, 0.3, 1.0]);
    assert_eq!(
        clears,
        [
            (Some(fx.refraction_id()), color, 1.0),
            (Some(fx.reflection_id()), color, 1.0),
            (None, color, 1.0)
        ]
    );
}

#[test]
fn captures_use_mirrored_camera_and_opposite_clip_planes() {
    let mut fx = Fixture::new(WaterPipelineConfig::default(), 800, 600);
    let cam = camera(800.0 / 600.0);

    let report = fx
        .pipeline
        .render_frame(&mut fx.device, &FrameContext { camera: &cam, elapsed_seconds: 0.0 })
        .unwrap();
    assert!(report.reflected_eye.abs_diff_eq(Vec3::new(0.0, -50.0, 300.0), 1e-4));

    let reflection = fx.draws_into(0, Some(fx.reflection_id()));
    let refraction = fx.draws_into(0, Some(fx.refraction_id()));
    let onscreen: Vec<_> = fx.draws_into(0, None).into_iter().filter(|d| d.effect == "lighting").collect();
    assert_eq!(reflection.len(), 4);
    assert_eq!(refraction.len(), 4);
    assert_eq!(onscreen.len(), 3);

    for draw in reflection.iter().filter(|d| d.effect == "lighting") {
        assert!(vec3(draw.parameter(names::EYE_POSITION)).abs_diff_eq(Vec3::new(0.0, -50.0, 300.0), 1e-4));
        assert!(vec4(draw.parameter(names::CLIP_PLANE)).abs_diff_eq(Vec4::new(0.0, 1.0, 0.0, 0.0), 1e-5));
    }
    for draw in refraction.iter().filter(|d| d.effect == "lighting") {
        assert_eq!(vec3(draw.parameter(names::EYE_POSITION)), cam.position);
        assert!(vec4(draw.parameter(names::CLIP_PLANE)).abs_diff_eq(Vec4::new(0.0, -1.0, 0.0, 0.0), 1e-5));
    }
    for draw in &onscreen {
        assert_eq!(vec4(draw.parameter(names::CLIP_PLANE)), Vec4::ZERO);
    }

    // Culling is off for every scene draw
    assert!(fx.log.draws().iter().all(|d| d.cull_mode == helio_water_planar::CullMode::None));
    assert_eq!(fx.device.rasterizer_state(), RasterizerState::CULL_BACK);
}

#[test]
fn water_samples_both_captures_and_animates() {
    let mut fx = Fixture::new(WaterPipelineConfig::default(), 640, 480);
    let cam = camera(640.0 / 480.0);

    fx.pipeline
        .render_frame(&mut fx.device, &FrameContext { camera: &cam, elapsed_seconds: 10.0 })
        .unwrap();

    let water = fx.log.draws().into_iter().find(|d| d.effect == "water").unwrap();
    assert_eq!(water.technique, techniques::WATER);
    assert_eq!(
        water.parameter(names::REFLECTION_TEXTURE),
        Some(ParameterValue::Texture(fx.pipeline.targets().reflection().unwrap().texture()))
    );
    assert_eq!(
        water.parameter(names::REFRACTION_TEXTURE),
        Some(ParameterValue::Texture(fx.pipeline.targets().refraction().unwrap().texture()))
    );
    assert_eq!(water.parameter(names::NORMAL_MAP), Some(ParameterValue::Texture(NORMAL_MAP)));
    assert_eq!(water.parameter(names::DISTORTION_MAP), Some(ParameterValue::Texture(DISTORTION_MAP)));
    assert_eq!(water.parameter(names::MOVE_FACTOR), Some(ParameterValue::Scalar(0.03 * 10.0)));
    assert_eq!(water.parameter(names::EYE_POSITION), Some(ParameterValue::Vector3(cam.position)));
    assert!(vec3(water.parameter(names::SURFACE_NORMAL)).abs_diff_eq(Vec3::Y, 1e-6));
}

#[test]
fn reflection_only_frame_never_touches_refraction() {
    let mut fx = Fixture::new(WaterPipelineConfig::reflection_only(), 400, 300);
    let cam = camera(400.0 / 300.0);

    let report = fx
        .pipeline
        .render_frame(&mut fx.device, &FrameContext { camera: &cam, elapsed_seconds: 2.0 })
        .unwrap();

    assert_eq!(report.stages, [FrameStage::ReflectionPass, FrameStage::OnscreenPass, FrameStage::Composited]);
    assert!(fx.pipeline.targets().refraction().is_none());
    assert_eq!(fx.device.live_targets(), 1);

    let touched_refraction = fx.log.events().iter().any(|e| match e {
        TraceEvent::SetParameter { name, .. } | TraceEvent::IgnoredParameter { name, .. } => {
            name == names::REFRACTION_TEXTURE
        }
        _ => false,
    });
    assert!(!touched_refraction);

    let water = fx.log.draws().into_iter().find(|d| d.effect == "water").unwrap();
    assert_eq!(water.technique, techniques::WATER_REFLECTION_ONLY);
    assert_eq!(water.parameter(names::FRESNEL_POWER), Some(ParameterValue::Scalar(0.0)));
    // Without a separate distortion map the normal map drives the distortion
    assert_eq!(water.parameter(names::DISTORTION_MAP), Some(ParameterValue::Texture(NORMAL_MAP)));
}

#[test]
fn resize_reallocates_captures_once() {
    let mut fx = Fixture::new(WaterPipelineConfig::default(), 800, 600);
    let cam = camera(800.0 / 600.0);
    let ctx = FrameContext { camera: &cam, elapsed_seconds: 0.0 };

    assert!(fx.pipeline.render_frame(&mut fx.device, &ctx).unwrap().reallocated);
    assert!(!fx.pipeline.render_frame(&mut fx.device, &ctx).unwrap().reallocated);
    let old = fx.reflection_id();

    fx.device.set_viewport(Viewport::new(1280, 720));
    let report = fx.pipeline.render_frame(&mut fx.device, &ctx).unwrap();

    assert!(report.reallocated);
    assert_eq!(fx.pipeline.targets().reflection().unwrap().size(), (1280, 720));
    assert_eq!(fx.pipeline.targets().refraction().unwrap().size(), (1280, 720));
    assert!(fx.log.events().contains(&TraceEvent::ReleaseTarget(old)));
    assert_eq!(fx.device.live_targets(), 2);
    assert_eq!(fx.pipeline.frame_index(), 3);
}

#[test]
fn failed_frame_restores_state_and_next_frame_recovers() {
    let mut fx = Fixture::new(WaterPipelineConfig::default(), 256, 256);
    let cam = camera(1.0);
    let ctx = FrameContext { camera: &cam, elapsed_seconds: 0.5 };

    fx.teapot_fails.store(true, Ordering::Relaxed);
    let result = fx.pipeline.render_frame(&mut fx.device, &ctx);

    assert!(matches!(result, Err(Error::Draw(_))));
    assert_eq!(fx.pipeline.stage(), FrameStage::RefractionPass);
    assert_eq!(fx.device.render_target(), None);
    assert_eq!(fx.device.rasterizer_state(), RasterizerState::CULL_BACK);
    assert!(fx.log.draws().iter().all(|d| d.effect != "water"));

    fx.teapot_fails.store(false, Ordering::Relaxed);
    let report = fx.pipeline.render_frame(&mut fx.device, &ctx).unwrap();
    assert_eq!(report.stages.last(), Some(&FrameStage::Composited));
    assert!(!report.reallocated);
}

#[test]
fn empty_viewport_fails_until_resized() {
    let mut fx = Fixture::new(WaterPipelineConfig::default(), 0, 0);
    let cam = camera(1.0);
    let ctx = FrameContext { camera: &cam, elapsed_seconds: 0.0 };

    assert!(matches!(fx.pipeline.render_frame(&mut fx.device, &ctx), Err(Error::Resource(_))));
    assert!(fx.log.draws().is_empty());

    fx.device.set_viewport(Viewport::new(64, 64));
    let report = fx.pipeline.render_frame(&mut fx.device, &ctx).unwrap();
    assert!(report.reallocated);
    assert_eq!(fx.pipeline.stage(), FrameStage::Composited);
}

#[test]
fn moving_the_water_moves_the_mirror() {
    let mut fx = Fixture::new(WaterPipelineConfig::default(), 800, 600);
    let cam = camera(800.0 / 600.0);
    let ctx = FrameContext { camera: &cam, elapsed_seconds: 0.0 };

    fx.pipeline.render_frame(&mut fx.device, &ctx).unwrap();
    *fx.pipeline.surface_mut() = WaterSurface::horizontal(10.0, 1000.0);

    let mark = fx.log.len();
    let report = fx.pipeline.render_frame(&mut fx.device, &ctx).unwrap();

    assert!(report.reflected_eye.abs_diff_eq(Vec3::new(0.0, -30.0, 300.0), 1e-4));
    let reflection = fx.draws_into(mark, Some(fx.reflection_id()));
    let teapot = reflection.iter().find(|d| d.kind == PrimitiveKind::Teapot).unwrap();
    assert!(vec4(teapot.parameter(names::CLIP_PLANE)).abs_diff_eq(Vec4::new(0.0, 1.0, 0.0, -10.0), 1e-4));
}

#[test]
fn tilted_water_uses_its_own_normal() {
    let mut fx = Fixture::new(WaterPipelineConfig::default(), 800, 600);
    let cam = camera(800.0 / 600.0);
    let tilt = Mat4::from_rotation_x(0.2);
    *fx.pipeline.surface_mut() = WaterSurface::new(tilt * WaterSurface::horizontal(0.0, 1000.0).world);

    fx.pipeline
        .render_frame(&mut fx.device, &FrameContext { camera: &cam, elapsed_seconds: 0.0 })
        .unwrap();

    let normal = tilt.transform_vector3(Vec3::Y);
    let water = fx.log.draws().into_iter().find(|d| d.effect == "water").unwrap();
    assert!(vec3(water.parameter(names::SURFACE_NORMAL)).abs_diff_eq(normal, 1e-5));

    let reflection = fx.draws_into(0, Some(fx.reflection_id()));
    let teapot = reflection.iter().find(|d| d.kind == PrimitiveKind::Teapot).unwrap();
    assert!(vec4(teapot.parameter(names::CLIP_PLANE)).truncate().abs_diff_eq(normal, 1e-5));
}

#[test]
fn identical_frames_issue_identical_draws() {
    let mut fx = Fixture::new(WaterPipelineConfig::default(), 800, 600);
    let cam = camera(800.0 / 600.0);
    let ctx = FrameContext { camera: &cam, elapsed_seconds: 3.0 };

    fx.pipeline.render_frame(&mut fx.device, &ctx).unwrap();
    let mark = fx.log.len();
    let first = draws_since(&fx.log, 0);
    fx.pipeline.render_frame(&mut fx.device, &ctx).unwrap();
    let second = draws_since(&fx.log, mark);

    assert_eq!(first, second);
}

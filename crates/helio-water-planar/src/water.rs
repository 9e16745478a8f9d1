//! Water surface and the compositing draw

use std::sync::Arc;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::PipelineFeatures;
use crate::device::{GraphicsDevice, RasterizerScope, RasterizerState};
use crate::effect::{names, techniques, Effect, TextureHandle};
use crate::geometry::Drawable;
use crate::reflection::ReflectionPlane;
use crate::scene::PointLight;
use crate::Result;

/// Look of the water surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterSettings {
    /// How many times the normal/distortion maps repeat across the quad
    pub tiling: f32,
    /// Scroll speed of the normal/distortion maps, in texture units per second
    pub wave_speed: f32,
    /// Maximum UV offset applied to the reflection/refraction lookups
    pub distortion_strength: f32,
    pub specular: f32,
    pub shininess: f32,
    pub fresnel_power: f32,
    /// Reflection weight used when the Fresnel blend is off
    pub reflection_mix: f32,
}

impl Default for WaterSettings {
    fn default() -> Self {
        Self {
            tiling: 4.0,
            wave_speed: 0.03,
            distortion_strength: 0.02,
            specular: 0.6,
            shininess: 20.0,
            fresnel_power: 1.0,
            reflection_mix: 0.5,
        }
    }
}

/// Scroll offset of the wave maps after `elapsed_seconds`.
///
/// Grows without bound; wrapped sampling makes it periodic on the GPU.
pub fn move_factor(wave_speed: f32, elapsed_seconds: f32) -> f32 {
    wave_speed * elapsed_seconds
}

/// The water quad. Its local +Y axis is the surface normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterSurface {
    pub world: Mat4,
}

impl WaterSurface {
    pub fn new(world: Mat4) -> Self {
        Self { world }
    }

    /// Horizontal square of side `size` at height `height`
    pub fn horizontal(height: f32, size: f32) -> Self {
        Self::new(Mat4::from_translation(Vec3::new(0.0, height, 0.0)) * Mat4::from_scale(Vec3::new(size, 1.0, size)))
    }

    pub fn height(&self) -> f32 {
        self.world.w_axis.y
    }

    /// Plane for this frame, derived from the current transform
    pub fn plane(&self) -> ReflectionPlane {
        ReflectionPlane::from_world(self.world)
    }
}

/// Textures sampled by the water technique besides the captures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterTextures {
    pub normal_map: TextureHandle,
    pub distortion_map: Option<TextureHandle>,
}

/// Optional water inputs, resolved once when the technique is selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterBindings {
    pub technique: &'static str,
    pub refraction: bool,
    /// The effect has a distortion slot; it samples the normal map unless a separate map is bound
    pub distortion_slot: bool,
    /// A separate distortion map is bound into the slot
    pub distortion_map: bool,
    pub surface_normal: bool,
    pub fresnel_power: bool,
    pub reflection_mix: bool,
}

impl WaterBindings {
    pub fn resolve(effect: &mut dyn Effect, features: &PipelineFeatures) -> Self {
        let technique = if features.refraction {
            techniques::WATER
        } else {
            techniques::WATER_REFLECTION_ONLY
        };
        effect.set_technique(technique);

        let distortion_slot = effect.has_parameter(names::DISTORTION_MAP);
        let bindings = Self {
            technique,
            refraction: features.refraction && effect.has_parameter(names::REFRACTION_TEXTURE),
            distortion_slot,
            distortion_map: features.distortion_map && distortion_slot,
            surface_normal: effect.has_parameter(names::SURFACE_NORMAL),
            fresnel_power: effect.has_parameter(names::FRESNEL_POWER),
            reflection_mix: effect.has_parameter(names::REFLECTION_MIX),
        };
        log::debug!("Resolved water bindings on {}: {:?}", effect.name(), bindings);
        bindings
    }
}

/// Per-frame inputs of the water draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterFrame {
    pub world: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub reflection_view: Mat4,
    pub eye: Vec3,
    pub elapsed_seconds: f32,
    pub reflection: TextureHandle,
    pub refraction: Option<TextureHandle>,
}

/// Draws the water quad from the captured reflection/refraction textures
pub struct WaterCompositor {
    effect: Box<dyn Effect>,
    mesh: Arc<dyn Drawable>,
    textures: WaterTextures,
    settings: WaterSettings,
    features: PipelineFeatures,
    bindings: WaterBindings,
    light: PointLight,
}

impl WaterCompositor {
    pub fn new(
        mut effect: Box<dyn Effect>,
        mesh: Arc<dyn Drawable>,
        textures: WaterTextures,
        settings: WaterSettings,
        features: PipelineFeatures,
    ) -> Self {
        let bindings = WaterBindings::resolve(effect.as_mut(), &features);
        Self {
            effect,
            mesh,
            textures,
            settings,
            features,
            bindings,
            light: PointLight::default(),
        }
    }

    pub fn with_light(mut self, light: PointLight) -> Self {
        self.light = light;
        self
    }

    pub fn bindings(&self) -> &WaterBindings {
        &self.bindings
    }

    pub fn settings(&self) -> &WaterSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut WaterSettings {
        &mut self.settings
    }

    /// Texture sampled for the UV distortion
    pub fn distortion_source(&self) -> TextureHandle {
        match self.textures.distortion_map {
            Some(distortion) if self.bindings.distortion_map => distortion,
            _ => self.textures.normal_map,
        }
    }

    pub fn draw_water(&mut self, device: &mut dyn GraphicsDevice, frame: &WaterFrame) -> Result<()> {
        let mut device = RasterizerScope::new(device, RasterizerState::CULL_NONE);
        let settings = self.settings;
        let distortion = self.distortion_source();

        let effect: &mut dyn Effect = self.effect.as_mut();
        effect.set_technique(self.bindings.technique);

        effect.set(names::WORLD, frame.world);
        effect.set(names::VIEW, frame.view);
        effect.set(names::PROJECTION, frame.projection);
        effect.set(names::WORLD_VIEW_PROJECTION, frame.projection * frame.view * frame.world);
        effect.set(names::REFLECTION_VIEW, frame.reflection_view);

        effect.set(names::REFLECTION_TEXTURE, frame.reflection);
        if self.bindings.refraction {
            if let Some(refraction) = frame.refraction {
                effect.set(names::REFRACTION_TEXTURE, refraction);
            }
        }
        effect.set(names::NORMAL_MAP, self.textures.normal_map);
        if self.bindings.distortion_slot {
            effect.set(names::DISTORTION_MAP, distortion);
        }

        effect.set(names::TILING, settings.tiling);
        effect.set(names::MOVE_FACTOR, move_factor(settings.wave_speed, frame.elapsed_seconds));
        effect.set(names::WAVE_STRENGTH, settings.distortion_strength);

        effect.set(names::LIGHT_POSITION, self.light.position);
        effect.set(names::LIGHT_COLOR, self.light.specular_color);
        effect.set(names::K_SPECULAR, settings.specular);
        effect.set(names::SHININESS, settings.shininess);
        effect.set(names::EYE_POSITION, frame.eye);
        if self.bindings.surface_normal {
            effect.set(names::SURFACE_NORMAL, ReflectionPlane::from_world(frame.world).normal);
        }

        if self.bindings.fresnel_power {
            // Zero selects the fixed mix in the shader.
            let power = if self.features.fresnel { settings.fresnel_power } else { 0.0 };
            effect.set(names::FRESNEL_POWER, power);
        }
        if self.bindings.reflection_mix {
            effect.set(names::REFLECTION_MIX, settings.reflection_mix);
        }

        log::trace!("Drawing water quad ({})", self.bindings.technique);
        self.mesh.draw(&mut *device, effect)
    }
}

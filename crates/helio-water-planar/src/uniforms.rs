//! Uniform-block effect backend
//!
//! [`UniformEffect`] packs named parameters into the `#[repr(C)]` blocks the
//! WGSL programs in [`crate::shaders`] declare. [`UniformBlock::bytes`] is the
//! buffer contents a renderer uploads before each draw.

use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::effect::{names, techniques, Effect, ParameterValue, TextureHandle};

fn mat(m: Mat4) -> [[f32; 4]; 4] {
    m.to_cols_array_2d()
}

fn point(v: Vec3) -> [f32; 4] {
    v.extend(1.0).to_array()
}

fn color(v: Vec3) -> [f32; 4] {
    v.extend(0.0).to_array()
}

/// Uniform block of the lit-object program
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub inverse_transpose_world: [[f32; 4]; 4],
    pub eye_position: [f32; 4],
    pub clip_plane: [f32; 4],
    pub light_position: [f32; 4],
    pub ambient_color: [f32; 4],
    pub diffuse_color: [f32; 4],
    pub specular_color: [f32; 4],
    pub object_color: [f32; 4],
    pub k_ambient: f32,
    pub k_diffuse: f32,
    pub k_specular: f32,
    pub shininess: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SkyboxUniforms {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub eye_position: [f32; 4],
    pub clip_plane: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct WaterUniforms {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub world_view_projection: [[f32; 4]; 4],
    pub reflection_view: [[f32; 4]; 4],
    pub light_position: [f32; 4],
    pub light_color: [f32; 4],
    pub eye_position: [f32; 4],
    pub surface_normal: [f32; 4],
    pub tiling: f32,
    pub move_factor: f32,
    pub wave_strength: f32,
    pub k_specular: f32,
    pub shininess: f32,
    pub fresnel_power: f32,
    pub reflection_mix: f32,
    pub _pad: f32,
}

/// Which program an effect drives
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformBlock {
    Object(ObjectUniforms),
    Skybox(SkyboxUniforms),
    Water(WaterUniforms),
}

impl UniformBlock {
    pub fn bytes(&self) -> &[u8] {
        match self {
            UniformBlock::Object(u) => bytemuck::bytes_of(u),
            UniformBlock::Skybox(u) => bytemuck::bytes_of(u),
            UniformBlock::Water(u) => bytemuck::bytes_of(u),
        }
    }
}

/// Effect whose parameters land in a CPU-side uniform block
pub struct UniformEffect {
    name: String,
    technique: String,
    block: UniformBlock,
    textures: BTreeMap<String, TextureHandle>,
}

impl UniformEffect {
    pub fn lighting() -> Self {
        Self::with_block("lighting", techniques::LIGHTING, UniformBlock::Object(ObjectUniforms::zeroed()))
    }

    pub fn skybox() -> Self {
        Self::with_block("skybox", techniques::SKYBOX, UniformBlock::Skybox(SkyboxUniforms::zeroed()))
    }

    /// Water program. Its distortion slot takes the normal map when no separate map is used.
    pub fn water() -> Self {
        Self::with_block("water", techniques::WATER, UniformBlock::Water(WaterUniforms::zeroed()))
    }

    fn with_block(name: &str, technique: &str, block: UniformBlock) -> Self {
        Self {
            name: name.to_string(),
            technique: technique.to_string(),
            block,
            textures: BTreeMap::new(),
        }
    }

    pub fn block(&self) -> &UniformBlock {
        &self.block
    }

    pub fn texture(&self, name: &str) -> Option<TextureHandle> {
        self.textures.get(name).copied()
    }

    fn texture_slots(&self) -> &'static [&'static str] {
        match self.block {
            UniformBlock::Object(_) => &[],
            UniformBlock::Skybox(_) => &[names::SKYBOX_TEXTURE],
            UniformBlock::Water(_) if self.technique == techniques::WATER_REFLECTION_ONLY => {
                &[names::REFLECTION_TEXTURE, names::NORMAL_MAP, names::DISTORTION_MAP]
            }
            UniformBlock::Water(_) => &[
                names::REFLECTION_TEXTURE,
                names::REFRACTION_TEXTURE,
                names::NORMAL_MAP,
                names::DISTORTION_MAP,
            ],
        }
    }

    /// Write a non-texture value; `false` if the block has no such field
    fn write(&mut self, name: &str, value: ParameterValue) -> bool {
        use ParameterValue::{Matrix, Scalar, Vector3, Vector4};

        match (&mut self.block, value) {
            (UniformBlock::Object(u), Matrix(m)) => match name {
                names::WORLD => u.world = mat(m),
                names::VIEW => u.view = mat(m),
                names::PROJECTION => u.projection = mat(m),
                names::INVERSE_TRANSPOSE_WORLD => u.inverse_transpose_world = mat(m),
                _ => return false,
            },
            (UniformBlock::Object(u), Vector3(v)) => match name {
                names::EYE_POSITION => u.eye_position = point(v),
                names::LIGHT_POSITION => u.light_position = point(v),
                names::AMBIENT_COLOR => u.ambient_color = color(v),
                names::DIFFUSE_COLOR => u.diffuse_color = color(v),
                names::SPECULAR_COLOR => u.specular_color = color(v),
                names::OBJECT_COLOR => u.object_color = color(v),
                _ => return false,
            },
            (UniformBlock::Object(u), Vector4(v)) => match name {
                names::CLIP_PLANE => u.clip_plane = v.to_array(),
                names::OBJECT_COLOR => u.object_color = v.to_array(),
                _ => return false,
            },
            (UniformBlock::Object(u), Scalar(s)) => match name {
                names::K_AMBIENT => u.k_ambient = s,
                names::K_DIFFUSE => u.k_diffuse = s,
                names::K_SPECULAR => u.k_specular = s,
                names::SHININESS => u.shininess = s,
                _ => return false,
            },
            (UniformBlock::Skybox(u), Matrix(m)) => match name {
                names::WORLD => u.world = mat(m),
                names::VIEW => u.view = mat(m),
                names::PROJECTION => u.projection = mat(m),
                _ => return false,
            },
            (UniformBlock::Skybox(u), Vector3(v)) if name == names::EYE_POSITION => u.eye_position = point(v),
            (UniformBlock::Skybox(u), Vector4(v)) if name == names::CLIP_PLANE => u.clip_plane = v.to_array(),
            (UniformBlock::Water(u), Matrix(m)) => match name {
                names::WORLD => u.world = mat(m),
                names::VIEW => u.view = mat(m),
                names::PROJECTION => u.projection = mat(m),
                names::WORLD_VIEW_PROJECTION => u.world_view_projection = mat(m),
                names::REFLECTION_VIEW => u.reflection_view = mat(m),
                _ => return false,
            },
            (UniformBlock::Water(u), Vector3(v)) => match name {
                names::LIGHT_POSITION => u.light_position = point(v),
                names::LIGHT_COLOR => u.light_color = color(v),
                names::EYE_POSITION => u.eye_position = point(v),
                names::SURFACE_NORMAL => u.surface_normal = color(v),
                _ => return false,
            },
            (UniformBlock::Water(u), Scalar(s)) => match name {
                names::TILING => u.tiling = s,
                names::MOVE_FACTOR => u.move_factor = s,
                names::WAVE_STRENGTH => u.wave_strength = s,
                names::K_SPECULAR => u.k_specular = s,
                names::SHININESS => u.shininess = s,
                names::FRESNEL_POWER if self.technique == techniques::WATER => u.fresnel_power = s,
                names::REFLECTION_MIX => u.reflection_mix = s,
                _ => return false,
            },
            _ => return false,
        }
        true
    }
}

impl Effect for UniformEffect {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_technique(&mut self, technique: &str) {
        self.technique = technique.to_string();
    }

    fn technique(&self) -> &str {
        &self.technique
    }

    fn has_parameter(&self, name: &str) -> bool {
        if self.texture_slots().contains(&name) {
            return true;
        }
        let sample = match name {
            names::TILING
            | names::MOVE_FACTOR
            | names::WAVE_STRENGTH
            | names::K_AMBIENT
            | names::K_DIFFUSE
            | names::K_SPECULAR
            | names::SHININESS
            | names::FRESNEL_POWER
            | names::REFLECTION_MIX => ParameterValue::Scalar(0.0),
            names::CLIP_PLANE => ParameterValue::Vector4(Vec4::ZERO),
            names::EYE_POSITION
            | names::LIGHT_POSITION
            | names::LIGHT_COLOR
            | names::AMBIENT_COLOR
            | names::DIFFUSE_COLOR
            | names::SPECULAR_COLOR
            | names::OBJECT_COLOR
            | names::SURFACE_NORMAL => ParameterValue::Vector3(Vec3::ZERO),
            _ => ParameterValue::Matrix(Mat4::IDENTITY),
        };
        // Write into a scratch copy so the real block stays untouched
        let mut scratch = Self {
            name: String::new(),
            technique: self.technique.clone(),
            block: self.block,
            textures: BTreeMap::new(),
        };
        scratch.write(name, sample)
    }

    fn set_parameter(&mut self, name: &str, value: ParameterValue) {
        let accepted = match value {
            ParameterValue::Texture(handle) => {
                let slot = self.texture_slots().contains(&name);
                if slot {
                    self.textures.insert(name.to_string(), handle);
                }
                slot
            }
            other => self.write(name, other),
        };
        if !accepted {
            log::trace!("{} ignores parameter {}", self.name, name);
        }
    }
}

//! Shader program collaborator
//!
//! An effect is a key-value parameter sink with named techniques. Callers
//! set every parameter a technique reads before each draw; nothing is
//! assumed to persist between draws. Setting a parameter the effect does
//! not expose is a no-op.

use glam::{Mat4, Vec3, Vec4};

use crate::clip_plane::ClipPlane;
use crate::render_target::RenderTargetId;

/// Parameter names shared by the effects and the WGSL uniform blocks
pub mod names {
    pub const WORLD: &str = "World";
    pub const VIEW: &str = "View";
    pub const PROJECTION: &str = "Projection";
    pub const WORLD_VIEW_PROJECTION: &str = "WorldViewProjection";
    pub const INVERSE_TRANSPOSE_WORLD: &str = "InverseTransposeWorld";
    pub const EYE_POSITION: &str = "EyePosition";
    pub const CLIP_PLANE: &str = "ClipPlane";

    pub const LIGHT_POSITION: &str = "LightPosition";
    pub const LIGHT_COLOR: &str = "LightColor";
    pub const AMBIENT_COLOR: &str = "AmbientColor";
    pub const DIFFUSE_COLOR: &str = "DiffuseColor";
    pub const SPECULAR_COLOR: &str = "SpecularColor";
    pub const K_AMBIENT: &str = "KAmbient";
    pub const K_DIFFUSE: &str = "KDiffuse";
    pub const K_SPECULAR: &str = "KSpecular";
    pub const SHININESS: &str = "Shininess";
    pub const OBJECT_COLOR: &str = "ObjectColor";

    pub const SKYBOX_TEXTURE: &str = "SkyBoxTexture";

    pub const REFLECTION_VIEW: &str = "ReflectionView";
    pub const REFLECTION_TEXTURE: &str = "ReflectionTexture";
    pub const REFRACTION_TEXTURE: &str = "RefractionTexture";
    pub const NORMAL_MAP: &str = "NormalMap";
    pub const DISTORTION_MAP: &str = "DistortionMap";
    pub const TILING: &str = "Tiling";
    pub const MOVE_FACTOR: &str = "MoveFactor";
    pub const WAVE_STRENGTH: &str = "WaveStrength";
    pub const FRESNEL_POWER: &str = "FresnelPower";
    pub const REFLECTION_MIX: &str = "ReflectionMix";
    /// World-space normal of the water plane
    pub const SURFACE_NORMAL: &str = "SurfaceNormal";
}

/// Technique names
pub mod techniques {
    pub const LIGHTING: &str = "Lighting";
    pub const SKYBOX: &str = "Skybox";
    pub const WATER: &str = "Water";
    pub const WATER_REFLECTION_ONLY: &str = "WaterReflectionOnly";
}

/// Texture reference understood by the effect backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureHandle {
    /// Texture owned by the host's asset system
    Asset(u32),
    /// Color buffer of an off-screen render target
    RenderTarget(RenderTargetId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    Scalar(f32),
    Vector3(Vec3),
    Vector4(Vec4),
    Matrix(Mat4),
    Texture(TextureHandle),
}

impl From<f32> for ParameterValue {
    fn from(v: f32) -> Self {
        ParameterValue::Scalar(v)
    }
}

impl From<Vec3> for ParameterValue {
    fn from(v: Vec3) -> Self {
        ParameterValue::Vector3(v)
    }
}

impl From<Vec4> for ParameterValue {
    fn from(v: Vec4) -> Self {
        ParameterValue::Vector4(v)
    }
}

impl From<Mat4> for ParameterValue {
    fn from(m: Mat4) -> Self {
        ParameterValue::Matrix(m)
    }
}

impl From<TextureHandle> for ParameterValue {
    fn from(t: TextureHandle) -> Self {
        ParameterValue::Texture(t)
    }
}

impl From<ClipPlane> for ParameterValue {
    fn from(p: ClipPlane) -> Self {
        ParameterValue::Vector4(p.0)
    }
}

/// Shader program with named parameters and techniques
pub trait Effect {
    fn name(&self) -> &str;

    /// Select the technique used by subsequent draws
    fn set_technique(&mut self, technique: &str);

    fn technique(&self) -> &str;

    /// Whether the current technique reads `name`
    fn has_parameter(&self, name: &str) -> bool;

    /// Bind a parameter; unknown names are ignored
    fn set_parameter(&mut self, name: &str, value: ParameterValue);
}

impl dyn Effect + '_ {
    pub fn set<V: Into<ParameterValue>>(&mut self, name: &str, value: V) {
        self.set_parameter(name, value.into());
    }
}

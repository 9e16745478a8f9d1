//! Scene draw orchestration shared by the capture and onscreen passes
//!
//! Draw order is fixed: the skybox first, centered on the eye, then every
//! opaque object with the shared lighting technique. Culling is disabled
//! for the whole scene since the mirrored reflection camera flips winding
//! order.

use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::clip_plane::ClipPlane;
use crate::config::DEFAULT_SKYBOX_SIZE;
use crate::device::{GraphicsDevice, RasterizerScope, RasterizerState};
use crate::effect::{names, techniques, Effect, TextureHandle};
use crate::geometry::Drawable;
use crate::Result;

/// Blinn-Phong material parameters of one object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Flat base color
    pub color: Vec3,
    pub k_ambient: f32,
    pub k_diffuse: f32,
    pub k_specular: f32,
    pub shininess: f32,
}

impl Material {
    pub fn flat(color: Vec3) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            k_ambient: 0.3,
            k_diffuse: 0.7,
            k_specular: 0.5,
            shininess: 16.0,
        }
    }
}

/// The single scene light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub ambient_color: Vec3,
    pub diffuse_color: Vec3,
    pub specular_color: Vec3,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(-300.0, 500.0, 200.0),
            ambient_color: Vec3::new(0.25, 0.3, 0.4),
            diffuse_color: Vec3::new(1.0, 0.95, 0.85),
            specular_color: Vec3::ONE,
        }
    }
}

/// An opaque object drawn with the lighting technique
#[derive(Clone)]
pub struct SceneObject {
    pub mesh: Arc<dyn Drawable>,
    pub world: Mat4,
    pub material: Material,
}

impl SceneObject {
    pub fn new(mesh: Arc<dyn Drawable>, world: Mat4, material: Material) -> Self {
        Self { mesh, world, material }
    }
}

/// Sky cube that follows the eye and is never clipped
pub struct Skybox {
    mesh: Arc<dyn Drawable>,
    texture: TextureHandle,
    effect: Box<dyn Effect>,
    size: f32,
}

impl Skybox {
    pub fn new(mesh: Arc<dyn Drawable>, texture: TextureHandle, effect: Box<dyn Effect>) -> Self {
        Self {
            mesh,
            texture,
            effect,
            size: DEFAULT_SKYBOX_SIZE,
        }
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn world(&self, eye: Vec3) -> Mat4 {
        Mat4::from_translation(eye) * Mat4::from_scale(Vec3::splat(self.size))
    }

    pub fn draw(&mut self, device: &mut dyn GraphicsDevice, view: Mat4, projection: Mat4, eye: Vec3) -> Result<()> {
        let mut device = RasterizerScope::new(device, RasterizerState::CULL_NONE);
        let world = self.world(eye);

        let effect: &mut dyn Effect = self.effect.as_mut();
        effect.set_technique(techniques::SKYBOX);
        effect.set(names::WORLD, world);
        effect.set(names::VIEW, view);
        effect.set(names::PROJECTION, projection);
        effect.set(names::EYE_POSITION, eye);
        effect.set(names::SKYBOX_TEXTURE, self.texture);
        if effect.has_parameter(names::CLIP_PLANE) {
            effect.set(names::CLIP_PLANE, ClipPlane::NONE);
        }

        log::trace!("Drawing skybox at {:?}", eye);
        self.mesh.draw(&mut *device, effect)
    }
}

/// Owns the opaque scene and draws it under a given camera and clip plane
pub struct SceneRenderer {
    objects: Vec<SceneObject>,
    skybox: Option<Skybox>,
    light: PointLight,
    lighting: Box<dyn Effect>,
}

impl SceneRenderer {
    pub fn new(lighting: Box<dyn Effect>) -> Self {
        Self {
            objects: Vec::new(),
            skybox: None,
            light: PointLight::default(),
            lighting,
        }
    }

    pub fn with_skybox(mut self, skybox: Skybox) -> Self {
        self.skybox = Some(skybox);
        self
    }

    pub fn with_light(mut self, light: PointLight) -> Self {
        self.light = light;
        self
    }

    pub fn add_object(mut self, object: SceneObject) -> Self {
        self.objects.push(object);
        self
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Objects may be moved between frames
    pub fn objects_mut(&mut self) -> &mut [SceneObject] {
        &mut self.objects
    }

    pub fn light(&self) -> &PointLight {
        &self.light
    }

    /// Draw the skybox and every opaque object.
    ///
    /// The caller's rasterizer state is restored on return, also when a
    /// draw fails part way.
    pub fn draw_scene(
        &mut self,
        device: &mut dyn GraphicsDevice,
        view: Mat4,
        projection: Mat4,
        eye: Vec3,
        clip_plane: ClipPlane,
    ) -> Result<()> {
        let mut device = RasterizerScope::new(device, RasterizerState::CULL_NONE);

        if let Some(skybox) = self.skybox.as_mut() {
            skybox.draw(&mut *device, view, projection, eye)?;
        }

        let effect: &mut dyn Effect = self.lighting.as_mut();
        effect.set_technique(techniques::LIGHTING);
        let clip_input = effect.has_parameter(names::CLIP_PLANE);

        for object in &self.objects {
            let material = &object.material;
            effect.set(names::WORLD, object.world);
            effect.set(names::VIEW, view);
            effect.set(names::PROJECTION, projection);
            effect.set(names::INVERSE_TRANSPOSE_WORLD, object.world.inverse().transpose());
            effect.set(names::LIGHT_POSITION, self.light.position);
            effect.set(names::EYE_POSITION, eye);
            effect.set(names::AMBIENT_COLOR, self.light.ambient_color);
            effect.set(names::DIFFUSE_COLOR, self.light.diffuse_color);
            effect.set(names::SPECULAR_COLOR, self.light.specular_color);
            effect.set(names::K_AMBIENT, material.k_ambient);
            effect.set(names::K_DIFFUSE, material.k_diffuse);
            effect.set(names::K_SPECULAR, material.k_specular);
            effect.set(names::SHININESS, material.shininess);
            effect.set(names::OBJECT_COLOR, material.color);
            if clip_input {
                effect.set(names::CLIP_PLANE, clip_plane);
            }

            log::trace!("Drawing {}", object.mesh.kind().label());
            object.mesh.draw(&mut *device, effect)?;
        }

        Ok(())
    }
}

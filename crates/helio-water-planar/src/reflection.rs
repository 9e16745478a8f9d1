//! Mirrored-view math for planar reflections

use glam::{Mat4, Vec3};

use crate::clip_plane::{build_clip_plane, ClipPlane};

/// Reflect `v` about the plane with normal `n`.
///
/// `n` must be unit length; reflecting twice returns the original vector.
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Signed distance of `point` from the plane through `plane_point` with normal `plane_normal`
pub fn distance_to_plane(point: Vec3, plane_point: Vec3, plane_normal: Vec3) -> f32 {
    plane_normal.normalize().dot(point - plane_point)
}

/// Camera transform mirrored across a plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReflectedView {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub view: Mat4,
}

/// Mirror a camera across the plane through `plane_point` with normal `plane_normal`.
///
/// A camera lying exactly on the plane reflects onto itself.
pub fn compute_reflected_view(
    camera_pos: Vec3,
    camera_forward: Vec3,
    camera_up: Vec3,
    plane_point: Vec3,
    plane_normal: Vec3,
) -> ReflectedView {
    let n = plane_normal.normalize();
    let d = n.dot(camera_pos - plane_point);

    let position = camera_pos - 2.0 * d * n;
    let forward = reflect(camera_forward, n);
    let up = reflect(camera_up, n);
    let view = Mat4::look_at_rh(position, position + forward, up);

    ReflectedView { position, forward, up, view }
}

/// Plane the reflection and refraction captures are taken about.
///
/// Recomputed from the water transform every frame, never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReflectionPlane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl ReflectionPlane {
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self { point, normal: normal.normalize() }
    }

    /// Derive the plane of a water quad whose local surface normal is +Y.
    ///
    /// The normal goes through the inverse-transpose so non-uniform scale
    /// keeps it perpendicular to the surface.
    pub fn from_world(world: Mat4) -> Self {
        let normal = world.inverse().transpose().transform_vector3(Vec3::Y);
        Self::new(world.w_axis.truncate(), normal)
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point - self.point)
    }

    pub fn reflect_view(&self, camera_pos: Vec3, camera_forward: Vec3, camera_up: Vec3) -> ReflectedView {
        compute_reflected_view(camera_pos, camera_forward, camera_up, self.point, self.normal)
    }

    /// Clip plane keeping the half-space above (`keep_above`) or below the surface
    pub fn clip_plane(&self, keep_above: bool) -> ClipPlane {
        build_clip_plane(self.point, self.normal, keep_above)
    }
}

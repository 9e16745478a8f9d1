//! Camera state consumed by the water pipeline

use glam::{Mat4, Vec3};

/// Starting position of the free camera in the reference scene
pub const DEFAULT_CAMERA_POSITION: Vec3 = Vec3::new(0.0, 50.0, 300.0);

/// Snapshot of the host camera for one frame.
///
/// The pipeline only reads it; the host updates it from input before rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
    pub forward: Vec3,
    pub up: Vec3,
}

impl CameraState {
    pub fn new(position: Vec3, forward: Vec3, up: Vec3, projection: Mat4) -> Self {
        let forward = forward.normalize();
        let up = up.normalize();
        Self {
            position,
            view: Mat4::look_at_rh(position, position + forward, up),
            projection,
            forward,
            up,
        }
    }

    /// Create a perspective camera looking from `position` at `target`
    pub fn look_at(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let projection = Mat4::perspective_rh(fov_y, aspect, near, far);
        Self::new(position, target - position, up, projection)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

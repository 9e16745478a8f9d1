//! Clip planes separating the reflection and refraction captures

use std::ops::Neg;

use glam::{Vec3, Vec4};

/// Plane equation `(a, b, c, d)`; geometry with `ax + by + cz + d >= 0` is kept.
///
/// The zero plane disables clipping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClipPlane(pub Vec4);

impl ClipPlane {
    /// Sentinel meaning "no clipping"
    pub const NONE: Self = Self(Vec4::ZERO);

    pub fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self(Vec4::new(a, b, c, d))
    }

    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        Self(normal.extend(-normal.dot(point)))
    }

    pub fn normal(&self) -> Vec3 {
        self.0.truncate()
    }

    pub fn is_disabled(&self) -> bool {
        self.0 == Vec4::ZERO
    }

    pub fn evaluate(&self, point: Vec3) -> f32 {
        self.0.dot(point.extend(1.0))
    }

    /// Whether a world-space point survives clipping
    pub fn keeps(&self, point: Vec3) -> bool {
        self.is_disabled() || self.evaluate(point) >= 0.0
    }

    pub fn to_array(&self) -> [f32; 4] {
        self.0.to_array()
    }
}

impl Neg for ClipPlane {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

/// Build the clip plane for one capture pass.
///
/// The reflection capture keeps everything above the surface; the refraction
/// capture keeps everything below it, which is the same plane negated.
pub fn build_clip_plane(plane_point: Vec3, plane_normal: Vec3, keep_above: bool) -> ClipPlane {
    let above = ClipPlane::from_point_normal(plane_point, plane_normal.normalize());
    if keep_above {
        above
    } else {
        -above
    }
}

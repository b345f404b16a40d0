//! Controller rays against planar toolbar rectangles.

use glam::{Mat4, Vec2, Vec3};
use vista_xr::NodeId;

use crate::record::ObjectRole;

const PARALLEL_EPS: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Ray along the controller's local -Z, from its world position.
    pub fn from_controller(world: Mat4) -> Option<Self> {
        let origin = world.transform_point3(Vec3::ZERO);
        // transform_vector3 ignores the translation column.
        let direction = world.transform_vector3(Vec3::NEG_Z).try_normalize()?;
        Some(Self { origin, direction })
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub object: NodeId,
    pub role: ObjectRole,
    pub distance: f32,
    /// World-space intersection point.
    pub point: Vec3,
    /// Intersection point in the object's local frame.
    pub local_point: Vec3,
}

/// Intersect `ray` with the rectangle spanning `±half_extents` in the local
/// XY plane of `world`. Both faces are hit.
pub fn intersect_rect(ray: &Ray, world: Mat4, half_extents: Vec2) -> Option<(f32, Vec3, Vec3)> {
    if world.determinant().abs() < f32::EPSILON {
        return None;
    }
    let inverse = world.inverse();
    let origin = inverse.transform_point3(ray.origin);
    let direction = inverse.transform_vector3(ray.direction);
    if direction.z.abs() < PARALLEL_EPS {
        return None;
    }

    // Affine maps keep the ray parameter, so t is also the world distance.
    let t = -origin.z / direction.z;
    if t < 0.0 {
        return None;
    }
    let local = origin + direction * t;
    if local.x.abs() > half_extents.x || local.y.abs() > half_extents.y {
        return None;
    }
    Some((t, ray.at(t), local))
}

/// Sort hits nearest first.
pub fn sort_hits(hits: &mut [Hit]) {
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

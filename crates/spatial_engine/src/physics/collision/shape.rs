//! Collision shapes a body can carry
//!
//! Shapes live in their body's local frame; the body's [`Transform`]
//! places them in the world at query time.

use crate::foundation::math::{Transform, Vec3};
use crate::spatial::AABB;
use super::Trimesh;

/// Collision shape types (stored in local space)
#[derive(Debug, Clone)]
pub enum CollisionShape {
    /// Triangle mesh (level geometry, props)
    Trimesh(Box<Trimesh>),
    /// Infinite plane through the local origin with normal local +Z
    Plane,
    /// Sphere of the given radius centered on the local origin
    Sphere(f32),
}

impl CollisionShape {
    /// Wrap a mesh
    pub fn trimesh(mesh: Trimesh) -> Self {
        Self::Trimesh(Box::new(mesh))
    }

    /// Creates a spherical collision shape with given radius
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere(radius)
    }

    /// World-space bounds of this shape placed by `frame`
    pub fn world_aabb(&self, frame: &Transform) -> AABB {
        match self {
            Self::Trimesh(mesh) => mesh.calculate_world_aabb(frame),
            Self::Plane => {
                let max = Vec3::repeat(f32::MAX);
                AABB::new(-max, max)
            }
            Self::Sphere(radius) => {
                AABB::from_center_extents(frame.position, Vec3::repeat(*radius))
            }
        }
    }

    /// Radius of the local bounding sphere
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Self::Trimesh(mesh) => mesh.bounding_sphere_radius(),
            Self::Plane => f32::MAX,
            Self::Sphere(radius) => *radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_world_aabb_follows_position() {
        let shape = CollisionShape::sphere(2.0);
        let aabb = shape.world_aabb(&Transform::from_position(Vec3::new(1.0, 0.0, -1.0)));

        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(aabb.max, Vec3::new(3.0, 2.0, 1.0));
    }

    #[test]
    fn test_plane_world_aabb_is_unbounded() {
        let aabb = CollisionShape::Plane.world_aabb(&Transform::identity());

        assert!(aabb.contains_point(&Vec3::new(1e30, -1e30, 0.0)));
    }
}

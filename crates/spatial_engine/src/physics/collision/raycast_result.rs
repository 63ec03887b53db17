//! Outcome of a ray cast
//!
//! One result lives inside each [`Ray`](super::Ray) and is reused from cast
//! to cast via [`RaycastResult::reset`].

use crate::foundation::math::Vec3;
use crate::physics::world::BodyKey;

/// Hit information in world space
#[derive(Debug, Clone, PartialEq)]
pub struct RaycastResult {
    /// Ray start in world space
    pub ray_from_world: Vec3,
    /// Ray end in world space
    pub ray_to_world: Vec3,
    /// Surface normal at the hit, world space
    pub hit_normal_world: Vec3,
    /// Hit point, world space
    pub hit_point_world: Vec3,
    /// Whether anything was hit
    pub has_hit: bool,
    /// Distance from the ray start to the hit point, `-1.0` without a hit
    pub distance: f32,
    /// Triangle index for trimesh hits
    pub hit_face_index: Option<usize>,
    /// Body that was hit, for world casts
    pub body: Option<BodyKey>,
    /// Set by [`RayMode::Any`](super::RayMode::Any) to end the traversal early
    ///
    /// Only [`RaycastResult::reset`] clears it.
    pub should_stop: bool,
}

impl Default for RaycastResult {
    fn default() -> Self {
        Self {
            ray_from_world: Vec3::zeros(),
            ray_to_world: Vec3::zeros(),
            hit_normal_world: Vec3::zeros(),
            hit_point_world: Vec3::zeros(),
            has_hit: false,
            distance: -1.0,
            hit_face_index: None,
            body: None,
            should_stop: false,
        }
    }
}

impl RaycastResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to the no-hit state so the result can be reused
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Stop the current traversal after this hit
    pub fn abort(&mut self) {
        self.should_stop = true;
    }

    /// Record a hit
    pub fn set(
        &mut self,
        ray_from_world: Vec3,
        ray_to_world: Vec3,
        hit_normal_world: Vec3,
        hit_point_world: Vec3,
        distance: f32,
        hit_face_index: Option<usize>,
        body: Option<BodyKey>,
    ) {
        self.ray_from_world = ray_from_world;
        self.ray_to_world = ray_to_world;
        self.hit_normal_world = hit_normal_world;
        self.hit_point_world = hit_point_world;
        self.distance = distance;
        self.hit_face_index = hit_face_index;
        self.body = body;
        self.has_hit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_hit_and_stop_flag() {
        let mut result = RaycastResult::new();
        result.set(
            Vec3::zeros(),
            Vec3::new(0.0, 0.0, -10.0),
            Vec3::z(),
            Vec3::new(0.0, 0.0, -3.0),
            3.0,
            Some(4),
            None,
        );
        result.abort();
        assert!(result.has_hit);
        assert!(result.should_stop);

        result.reset();

        assert_eq!(result, RaycastResult::default());
        assert_eq!(result.distance, -1.0);
        assert_eq!(result.hit_face_index, None);
    }
}

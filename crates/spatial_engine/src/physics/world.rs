//! Collision world holding static bodies
//!
//! Bodies are stored in a slot map and addressed by [`BodyKey`]. Each body
//! caches its world-space bounds, refreshed whenever its transform changes,
//! so ray casts and visibility checks can reject it without touching the
//! shape.

use slotmap::SlotMap;

use crate::foundation::math::Transform;
use crate::physics::collision::{CollisionShape, Ray, RayMode};
use crate::physics::collision_layers::CollisionLayers;
use crate::scene::Frustum;
use crate::spatial::AABB;

slotmap::new_key_type! {
    /// Handle to a body inside a [`CollisionWorld`]
    pub struct BodyKey;
}

/// A shape placed in the world
#[derive(Debug, Clone)]
pub struct CollisionBody {
    /// Local-space shape
    pub shape: CollisionShape,
    /// Layers this body sits on
    pub layer: CollisionLayers,
    /// Layers this body interacts with
    pub mask: CollisionLayers,
    transform: Transform,
    world_aabb: AABB,
}

impl CollisionBody {
    /// Place `shape` in the world on the default layer
    pub fn new(shape: CollisionShape, transform: Transform) -> Self {
        let world_aabb = shape.world_aabb(&transform);
        Self {
            shape,
            layer: CollisionLayers::default(),
            mask: CollisionLayers::all(),
            transform,
            world_aabb,
        }
    }

    /// Set layer and mask
    pub fn with_layers(mut self, layer: CollisionLayers, mask: CollisionLayers) -> Self {
        self.layer = layer;
        self.mask = mask;
        self
    }

    /// Local-to-world placement
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Cached world bounds
    pub fn world_aabb(&self) -> &AABB {
        &self.world_aabb
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.world_aabb = self.shape.world_aabb(&transform);
    }
}

/// Set of static bodies that rays and frustums are tested against
#[derive(Debug, Default)]
pub struct CollisionWorld {
    bodies: SlotMap<BodyKey, CollisionBody>,
}

impl CollisionWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body and return its key
    pub fn add_body(&mut self, body: CollisionBody) -> BodyKey {
        let key = self.bodies.insert(body);
        log::debug!("Added collision body {:?} ({} total)", key, self.bodies.len());
        key
    }

    /// Remove a body, returning it if the key was live
    pub fn remove_body(&mut self, key: BodyKey) -> Option<CollisionBody> {
        let body = self.bodies.remove(key);
        if body.is_none() {
            log::warn!("Tried to remove unknown collision body {:?}", key);
        }
        body
    }

    /// Move a body; returns false if the key is not live
    pub fn set_body_transform(&mut self, key: BodyKey, transform: Transform) -> bool {
        match self.bodies.get_mut(key) {
            Some(body) => {
                body.set_transform(transform);
                true
            }
            None => false,
        }
    }

    /// Look up a body
    pub fn body(&self, key: BodyKey) -> Option<&CollisionBody> {
        self.bodies.get(key)
    }

    /// Number of bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the world has no bodies
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Iterate over all bodies
    pub fn bodies(&self) -> impl Iterator<Item = (BodyKey, &CollisionBody)> {
        self.bodies.iter()
    }

    /// Cast `ray` keeping only the nearest hit
    pub fn raycast_closest(&self, ray: &mut Ray) -> bool {
        ray.mode = RayMode::Closest;
        ray.intersect_world(self)
    }

    /// Cast `ray` stopping at the first hit
    pub fn raycast_any(&self, ray: &mut Ray) -> bool {
        ray.mode = RayMode::Any;
        ray.intersect_world(self)
    }

    /// Cast `ray` reporting every hit to its callback
    pub fn raycast_all(&self, ray: &mut Ray) -> bool {
        ray.mode = RayMode::All;
        ray.intersect_world(self)
    }

    /// Collect the bodies whose world bounds touch `frustum`
    pub fn visible_bodies(&self, frustum: &Frustum, result: &mut Vec<BodyKey>) {
        result.extend(
            self.bodies
                .iter()
                .filter(|(_, body)| body.world_aabb.is_visible(&frustum.planes))
                .map(|(key, _)| key),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::physics::collision::Trimesh;

    /// Two-triangle unit quad in the XY plane
    fn quad_body(z: f32) -> CollisionBody {
        let mesh = Trimesh::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2, 0, 2, 3],
        )
        .unwrap();
        CollisionBody::new(
            CollisionShape::trimesh(mesh),
            Transform::from_position(Vec3::new(0.0, 0.0, z)),
        )
    }

    fn down_ray() -> Ray {
        Ray::new(Vec3::new(0.5, 0.25, 10.0), Vec3::new(0.5, 0.25, -10.0))
    }

    #[test]
    fn test_add_remove_body() {
        let mut world = CollisionWorld::new();
        let key = world.add_body(quad_body(0.0));
        assert_eq!(world.len(), 1);

        assert!(world.remove_body(key).is_some());
        assert!(world.is_empty());
        assert!(world.remove_body(key).is_none());
        assert!(world.body(key).is_none());
    }

    #[test]
    fn test_closest_picks_nearer_body() {
        let mut world = CollisionWorld::new();
        let _low = world.add_body(quad_body(-2.0));
        let high = world.add_body(quad_body(3.0));

        let mut ray = down_ray();
        assert!(world.raycast_closest(&mut ray));
        assert_eq!(ray.result.body, Some(high));
        assert!((ray.result.distance - 7.0).abs() < 1e-5);
    }

    #[test]
    fn test_any_stops_at_first_body() {
        let mut world = CollisionWorld::new();
        let first = world.add_body(quad_body(3.0));
        world.add_body(quad_body(0.0));
        world.add_body(quad_body(-2.0));

        let mut ray = down_ray();
        assert!(world.raycast_any(&mut ray));

        // Later bodies must not overwrite the first hit
        assert_eq!(ray.result.body, Some(first));
        assert!((ray.result.distance - 7.0).abs() < 1e-5);
    }

    #[test]
    fn test_set_body_transform_moves_bounds() {
        let mut world = CollisionWorld::new();
        let key = world.add_body(quad_body(0.0));

        assert!(world.set_body_transform(key, Transform::from_position(Vec3::new(50.0, 0.0, 0.0))));
        assert!((world.body(key).unwrap().world_aabb().min.x - 50.0).abs() < 1e-5);

        let mut ray = down_ray();
        assert!(!world.raycast_closest(&mut ray));
    }

    #[test]
    fn test_layer_filter_skips_body() {
        let mut world = CollisionWorld::new();
        world.add_body(quad_body(0.0).with_layers(CollisionLayers::PICKUP, CollisionLayers::all()));

        let mut ray = down_ray().with_collision_filter(CollisionLayers::all(), CollisionLayers::WORLD);
        assert!(!world.raycast_any(&mut ray));

        let mut ray = down_ray();
        assert!(world.raycast_any(&mut ray));
        assert!(ray.result.should_stop);
    }

    #[test]
    fn test_all_counts_every_body() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let mut world = CollisionWorld::new();
        world.add_body(quad_body(0.0));
        world.add_body(quad_body(-1.0));
        world.add_body(CollisionBody::new(
            CollisionShape::sphere(0.5),
            Transform::from_position(Vec3::new(0.5, 0.25, 5.0)),
        ));

        let hits = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&hits);
        let mut ray = down_ray().with_callback(move |_| {
            sink.fetch_add(1, Ordering::Relaxed);
        });

        assert!(world.raycast_all(&mut ray));
        // One per quad, two for the sphere
        assert_eq!(hits.load(Ordering::Relaxed), 4);
    }
}

//! Ray casting against collision shapes
//!
//! A [`Ray`] is a finite world-space segment `from -> to`. Casting it
//! against a shape reports every accepted hit through
//! [`Ray::report_intersection`], which applies the ray's [`RayMode`]:
//!
//! - [`RayMode::Closest`] keeps the nearest hit seen so far
//! - [`RayMode::Any`] keeps the first hit and raises `should_stop`
//! - [`RayMode::All`] hands every hit to the ray's callback
//!
//! Each ray owns its scratch buffers, so casting the same ray every frame
//! does not allocate once the buffers have grown, and separate rays can be
//! cast from separate threads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::config::RaycastConfig;
use crate::foundation::math::{Transform, Vec3};
use crate::physics::collision_layers::CollisionLayers;
use crate::physics::world::{BodyKey, CollisionWorld};
use crate::spatial::{QueryStack, AABB};
use super::{CollisionShape, RaycastResult, Trimesh};

/// How a ray treats multiple hits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RayMode {
    /// Keep the nearest hit
    #[default]
    Closest,
    /// Stop at the first hit
    Any,
    /// Report every hit to the callback
    All,
}

/// Per-ray buffers reused between casts
#[derive(Debug, Default)]
pub struct RaycastScratch {
    stack: QueryStack,
    candidates: Vec<u32>,
}

/// Callback invoked for each hit in [`RayMode::All`]
pub type RaycastCallback = Box<dyn FnMut(&RaycastResult) + Send>;

/// A world-space ray segment
pub struct Ray {
    from: Vec3,
    to: Vec3,
    direction: Vec3,

    /// Tolerance for near-parallel plane hits
    pub precision: f32,
    /// Hit bookkeeping policy
    pub mode: RayMode,
    /// Ignore hits on faces whose normal points along the ray
    pub skip_backfaces: bool,
    /// Layers this ray belongs to
    pub collision_filter_group: CollisionLayers,
    /// Layers this ray can hit
    pub collision_filter_mask: CollisionLayers,
    /// Most recent result
    pub result: RaycastResult,

    callback: Option<RaycastCallback>,
    scratch: RaycastScratch,
}

impl fmt::Debug for Ray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ray")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("direction", &self.direction)
            .field("precision", &self.precision)
            .field("mode", &self.mode)
            .field("skip_backfaces", &self.skip_backfaces)
            .field("result", &self.result)
            .field("has_callback", &self.callback.is_some())
            .finish_non_exhaustive()
    }
}

impl Ray {
    /// Creates a ray from `from` to `to` with default settings
    pub fn new(from: Vec3, to: Vec3) -> Self {
        Self::from_config(from, to, &RaycastConfig::default())
    }

    /// Creates a ray using the settings in `config`
    pub fn from_config(from: Vec3, to: Vec3, config: &RaycastConfig) -> Self {
        Self {
            from,
            to,
            direction: direction_between(&from, &to),
            precision: config.precision,
            mode: config.mode,
            skip_backfaces: config.skip_backfaces,
            collision_filter_group: CollisionLayers::all(),
            collision_filter_mask: CollisionLayers::all(),
            result: RaycastResult::default(),
            callback: None,
            scratch: RaycastScratch::default(),
        }
    }

    /// Set the hit mode
    pub fn with_mode(mut self, mode: RayMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable backface culling
    pub fn with_skip_backfaces(mut self, skip: bool) -> Self {
        self.skip_backfaces = skip;
        self
    }

    /// Set the ray's own layers and the layers it can hit
    pub fn with_collision_filter(mut self, group: CollisionLayers, mask: CollisionLayers) -> Self {
        self.collision_filter_group = group;
        self.collision_filter_mask = mask;
        self
    }

    /// Set the per-hit callback used by [`RayMode::All`]
    pub fn with_callback(mut self, callback: impl FnMut(&RaycastResult) + Send + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Replace or remove the per-hit callback
    pub fn set_callback(&mut self, callback: Option<RaycastCallback>) {
        self.callback = callback;
    }

    /// Move the ray; the direction is re-derived
    pub fn set_endpoints(&mut self, from: Vec3, to: Vec3) {
        self.from = from;
        self.to = to;
        self.direction = direction_between(&from, &to);
    }

    /// Start of the segment
    pub fn from(&self) -> Vec3 {
        self.from
    }

    /// End of the segment
    pub fn to(&self) -> Vec3 {
        self.to
    }

    /// Unit direction, zero for a degenerate ray
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Whether the current result holds a hit
    pub fn has_hit(&self) -> bool {
        self.result.has_hit
    }

    /// World-space bounds of the segment
    pub fn aabb(&self) -> AABB {
        AABB::new(self.from.inf(&self.to), self.from.sup(&self.to))
    }

    /// Reset the result and cast against a single mesh placed by `frame`
    pub fn raycast_trimesh(&mut self, mesh: &Trimesh, frame: &Transform) -> &RaycastResult {
        self.result.reset();
        self.intersect_trimesh(mesh, frame);
        &self.result
    }

    /// Reset the result and cast against every body in `world`
    ///
    /// Bodies filtered out by layer, or whose world bounds miss the ray's
    /// bounds, are skipped. Returns whether anything was hit.
    pub fn intersect_world(&mut self, world: &CollisionWorld) -> bool {
        self.result.reset();
        let ray_aabb = self.aabb();

        for (key, body) in world.bodies() {
            if self.result.should_stop {
                break;
            }
            if !CollisionLayers::should_collide(
                self.collision_filter_group,
                self.collision_filter_mask,
                body.layer,
                body.mask,
            ) {
                continue;
            }
            if !body.world_aabb().overlaps(&ray_aabb) {
                continue;
            }
            self.intersect_body_shape(&body.shape, body.transform(), Some(key));
        }

        self.result.has_hit
    }

    /// Cast against one shape without touching the current result first
    pub fn intersect_shape(&mut self, shape: &CollisionShape, frame: &Transform) {
        self.intersect_body_shape(shape, frame, None);
    }

    pub(crate) fn intersect_body_shape(
        &mut self,
        shape: &CollisionShape,
        frame: &Transform,
        body: Option<BodyKey>,
    ) {
        match shape {
            CollisionShape::Trimesh(mesh) => self.intersect_trimesh_body(mesh, frame, body),
            CollisionShape::Plane => self.intersect_plane_body(frame, body),
            CollisionShape::Sphere(radius) => self.intersect_sphere_body(*radius, frame, body),
        }
    }

    /// Cast against a trimesh placed in the world by `frame`
    ///
    /// Hits accumulate into the current result according to the ray mode.
    pub fn intersect_trimesh(&mut self, mesh: &Trimesh, frame: &Transform) {
        self.intersect_trimesh_body(mesh, frame, None);
    }

    fn intersect_trimesh_body(&mut self, mesh: &Trimesh, frame: &Transform, body: Option<BodyKey>) {
        let local_from = frame.point_to_local(&self.from);
        let local_to = frame.point_to_local(&self.to);
        let local_direction = direction_between(&local_from, &local_to);
        let from_to_distance_squared = (local_to - local_from).magnitude_squared();
        let local_aabb = AABB::new(local_from.inf(&local_to), local_from.sup(&local_to));

        let mut candidates = std::mem::take(&mut self.scratch.candidates);
        candidates.clear();
        mesh.get_triangles_in_aabb_with(&local_aabb, &mut self.scratch.stack, &mut candidates);
        log::trace!("Ray vs trimesh: {} candidate triangles", candidates.len());

        for &triangle in &candidates {
            if self.result.should_stop {
                break;
            }

            let triangle = triangle as usize;
            let normal = mesh.get_normal(triangle);
            let [a, b, c] = mesh.triangle_vertices(triangle);

            // Parallel rays divide by zero here; the infinite or NaN result
            // fails the checks below.
            let scalar = normal.dot(&(a - local_from)) / normal.dot(&local_direction);
            if scalar < 0.0 {
                continue;
            }

            let point = local_from + local_direction * scalar;
            if (point - local_from).magnitude_squared() > from_to_distance_squared {
                continue;
            }

            // Both vertex orders: an edge hit rejected by one is accepted by the other
            if !(point_in_triangle(&point, &b, &a, &c) || point_in_triangle(&point, &a, &b, &c)) {
                continue;
            }

            let world_point = frame.point_to_world(&point);
            let rotated = frame.vector_to_world_frame(&normal);
            let world_normal = rotated.try_normalize(0.0).unwrap_or(rotated);
            self.report_intersection(world_normal, world_point, Some(triangle), body);
        }

        self.scratch.candidates = candidates;
    }

    /// Cast against an infinite plane through `frame.position` whose
    /// normal is the frame's local +Z
    pub fn intersect_plane(&mut self, frame: &Transform) {
        self.intersect_plane_body(frame, None);
    }

    fn intersect_plane_body(&mut self, frame: &Transform, body: Option<BodyKey>) {
        let world_normal = frame.vector_to_world_frame(&Vec3::z());

        let plane_to_from = (self.from - frame.position).dot(&world_normal);
        let plane_to_to = (self.to - frame.position).dot(&world_normal);
        if plane_to_from * plane_to_to > 0.0 {
            // Both ends on the same side
            return;
        }

        let n_dot_dir = world_normal.dot(&self.direction);
        if n_dot_dir.abs() < self.precision {
            return;
        }

        let t = -plane_to_from / n_dot_dir;
        let hit_point = self.from + self.direction * t;
        self.report_intersection(world_normal, hit_point, None, body);
    }

    /// Cast against a sphere of `radius` centered on `frame.position`
    pub fn intersect_sphere(&mut self, radius: f32, frame: &Transform) {
        self.intersect_sphere_body(radius, frame, None);
    }

    fn intersect_sphere_body(&mut self, radius: f32, frame: &Transform, body: Option<BodyKey>) {
        let segment = self.to - self.from;
        let offset = self.from - frame.position;

        let a = segment.magnitude_squared();
        let b = 2.0 * segment.dot(&offset);
        let c = offset.magnitude_squared() - radius * radius;
        let delta = b * b - 4.0 * a * c;
        if delta < 0.0 {
            return;
        }

        let sqrt_delta = delta.sqrt();
        let entry = (-b - sqrt_delta) / (2.0 * a);
        let exit = (-b + sqrt_delta) / (2.0 * a);

        for (i, t) in [entry, exit].into_iter().enumerate() {
            // A tangent hit has one root, reported once
            if i == 1 && delta == 0.0 {
                break;
            }
            if self.result.should_stop {
                break;
            }
            if (0.0..=1.0).contains(&t) {
                let point = self.from + segment * t;
                let normal = point - frame.position;
                let normal = normal.try_normalize(0.0).unwrap_or(normal);
                self.report_intersection(normal, point, None, body);
            }
        }
    }

    /// Apply the ray mode to a candidate hit given in world space
    pub fn report_intersection(
        &mut self,
        normal: Vec3,
        hit_point_world: Vec3,
        hit_face_index: Option<usize>,
        body: Option<BodyKey>,
    ) {
        if self.skip_backfaces && normal.dot(&self.direction) > 0.0 {
            return;
        }

        let distance = (hit_point_world - self.from).magnitude();

        match self.mode {
            RayMode::All => {
                self.result.set(self.from, self.to, normal, hit_point_world, distance, hit_face_index, body);
                if let Some(callback) = self.callback.as_mut() {
                    callback(&self.result);
                }
            }
            RayMode::Closest => {
                if !self.result.has_hit || distance < self.result.distance {
                    self.result.set(self.from, self.to, normal, hit_point_world, distance, hit_face_index, body);
                }
            }
            RayMode::Any => {
                self.result.set(self.from, self.to, normal, hit_point_world, distance, hit_face_index, body);
                self.result.should_stop = true;
            }
        }
    }
}

fn direction_between(from: &Vec3, to: &Vec3) -> Vec3 {
    (to - from).try_normalize(0.0).unwrap_or_else(Vec3::zeros)
}

/// Barycentric point-in-triangle test for a point already on the triangle's plane
///
/// The far edge `b -> c` is exclusive, the edges through `a` inclusive.
fn point_in_triangle(p: &Vec3, a: &Vec3, b: &Vec3, c: &Vec3) -> bool {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;

    let dot00 = v0.dot(&v0);
    let dot01 = v0.dot(&v1);
    let dot02 = v0.dot(&v2);
    let dot11 = v1.dot(&v1);
    let dot12 = v1.dot(&v2);

    let u = dot11 * dot02 - dot01 * dot12;
    let v = dot00 * dot12 - dot01 * dot02;
    u >= 0.0 && v >= 0.0 && u + v < dot00 * dot11 - dot01 * dot01
}

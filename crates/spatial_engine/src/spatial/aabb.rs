//! Axis-aligned bounding box
//!
//! The box is a plain value type. Callers keep `min <= max` on every axis;
//! none of the operations below re-check it.

use crate::foundation::math::{Mat4, Point3, Transform, Vec3};
use crate::scene::Plane;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Fit a box around a flat `[x0, y0, z0, x1, ...]` coordinate buffer
    ///
    /// A trailing partial triple is ignored. No points gives the zero box.
    pub fn from_points(coords: &[f32]) -> Self {
        let mut aabb = Self::default();
        aabb.fit(coords.chunks_exact(3).map(|c| Vec3::new(c[0], c[1], c[2])));
        aabb
    }

    /// Refit this box around a set of points. No points gives the zero box.
    pub fn set_from_points(&mut self, points: &[Vec3]) -> &mut Self {
        self.fit(points.iter().copied());
        self
    }

    fn fit<I: IntoIterator<Item = Vec3>>(&mut self, points: I) {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            *self = Self::default();
            return;
        };

        self.min = first;
        self.max = first;
        for p in points {
            self.min = self.min.inf(&p);
            self.max = self.max.sup(&p);
        }
    }

    /// Overwrite both corners
    pub fn set(&mut self, min: Vec3, max: Vec3) -> &mut Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Copy another box into this one
    pub fn copy_from(&mut self, other: &AABB) -> &mut Self {
        *self = *other;
        self
    }

    /// Grow this box so it also encloses `other`
    pub fn extend(&mut self, other: &AABB) -> &mut Self {
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
        self
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point (boundary inclusive)
    pub fn contains_point(&self, point: &Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if `other` lies entirely inside this box (boundary inclusive)
    pub fn contains(&self, other: &AABB) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x &&
        self.min.y <= other.min.y && self.max.y >= other.max.y &&
        self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    /// Check if the two boxes overlap on all three axes
    ///
    /// Touching faces count as overlapping. The test is symmetric.
    pub fn overlaps(&self, other: &AABB) -> bool {
        (0..3).all(|i| {
            (other.min[i] <= self.max[i] && self.max[i] <= other.max[i])
                || (self.min[i] <= other.max[i] && other.max[i] <= self.max[i])
        })
    }

    /// The 8 corners; bit 0 of the index picks max x, bit 1 max y, bit 2 max z
    pub fn get_corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 != 0 { self.max.x } else { self.min.x },
                if i & 2 != 0 { self.max.y } else { self.min.y },
                if i & 4 != 0 { self.max.z } else { self.min.z },
            )
        })
    }

    /// Box enclosing this box after transformation by `matrix`
    ///
    /// All 8 corners are transformed and refit, so under rotation the result
    /// over-approximates the true bounds.
    pub fn transform(&self, matrix: &Mat4) -> AABB {
        let mut target = AABB::default();
        self.transform_into(matrix, &mut target);
        target
    }

    /// Same as [`AABB::transform`], writing into an existing box
    pub fn transform_into(&self, matrix: &Mat4, target: &mut AABB) {
        let corners = self
            .get_corners()
            .map(|c| matrix.transform_point(&Point3::from(c)).coords);
        target.set_from_points(&corners);
    }

    /// Move a world-space box into `frame`'s local space
    pub fn to_local_frame(&self, frame: &Transform) -> AABB {
        let corners = self.get_corners().map(|c| frame.point_to_local(&c));
        let mut target = AABB::default();
        target.set_from_points(&corners);
        target
    }

    /// Move a box in `frame`'s local space out to world space
    pub fn to_world_frame(&self, frame: &Transform) -> AABB {
        let corners = self.get_corners().map(|c| frame.point_to_world(&c));
        let mut target = AABB::default();
        target.set_from_points(&corners);
        target
    }

    /// Conservative frustum test against 6 inward-facing planes
    ///
    /// For each plane the corner furthest along the plane normal is tested;
    /// if it is behind any plane the box is culled. Boxes near frustum
    /// corners may pass even though they are outside.
    pub fn is_visible(&self, planes: &[Plane; 6]) -> bool {
        planes.iter().all(|plane| {
            let n = plane.normal;
            let p = Vec3::new(
                if n.x > 0.0 { self.max.x } else { self.min.x },
                if n.y > 0.0 { self.max.y } else { self.min.y },
                if n.z > 0.0 { self.max.z } else { self.min.z },
            );
            plane.distance_to_point(&p) >= 0.0
        })
    }
}

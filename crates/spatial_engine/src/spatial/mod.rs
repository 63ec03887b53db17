//! Spatial partitioning data structures
//!
//! Provides the bounding-box primitive and the octree index used by
//! trimesh colliders for ray casting and region queries in 3D space.

mod aabb;
mod octree;

pub use aabb::AABB;
pub use octree::{NodeId, Octree, OctreeConfig, OctreeNode, QueryStack, MAX_OCTREE_DEPTH};

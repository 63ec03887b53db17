//! # Spatial Engine
//!
//! Spatial queries for a browser FPS: bounding boxes, an octree, triangle
//! mesh colliders, ray casting and frustum culling.
//!
//! ## Features
//!
//! - **AABB**: axis-aligned boxes with frame transforms and plane culling
//! - **Octree**: arena-backed tree indexing payloads by their bounds
//! - **Trimesh**: indexed triangle meshes with per-face normals and a triangle octree
//! - **Raycasting**: closest, any and all-hits modes against meshes, planes and spheres
//! - **Collision World**: layered static bodies addressed by key
//!
//! ## Quick Start
//!
//! ```rust
//! use spatial_engine::prelude::*;
//!
//! let mesh = Trimesh::new(
//!     vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
//!     vec![0, 1, 2],
//! )?;
//!
//! let mut ray = Ray::new(Vec3::new(0.25, 0.25, 10.0), Vec3::new(0.25, 0.25, -10.0));
//! let result = ray.raycast_trimesh(&mesh, &Transform::identity());
//!
//! assert!(result.has_hit);
//! assert_eq!(result.hit_face_index, Some(0));
//! # Ok::<(), MeshError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;

pub mod config;
pub mod foundation;
pub mod physics;
pub mod scene;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{Config, ConfigError, RaycastConfig, SpatialConfig},
        foundation::math::{Mat4, Mat4Ext, Quat, Transform, Vec3},
        physics::{
            BodyKey, CollisionBody, CollisionLayers, CollisionShape, CollisionWorld, MeshError,
            Ray, RayMode, RaycastResult, Trimesh,
        },
        scene::{Frustum, Plane},
        spatial::{Octree, OctreeConfig, QueryStack, AABB},
    };
}

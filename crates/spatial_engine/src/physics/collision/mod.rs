//! Narrow-phase collision queries
//!
//! Shapes are stored in their body's local frame. Rays are moved into that
//! frame per query and hits are mapped back to world space.
//!
//! - [`trimesh`] - indexed triangle mesh with a triangle octree
//! - [`ray`] - ray segments and their hit policy
//! - [`shape`] - the shapes a body can carry

pub mod ray;
pub mod raycast_result;
pub mod shape;
pub mod trimesh;

pub use ray::{Ray, RayMode, RaycastCallback, RaycastScratch};
pub use raycast_result::RaycastResult;
pub use shape::CollisionShape;
pub use trimesh::{MeshError, Trimesh};

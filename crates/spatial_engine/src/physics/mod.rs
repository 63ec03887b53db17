//! Physics module for ray queries against static collision geometry

pub mod collision;
pub mod collision_layers;
pub mod world;

pub use collision::{CollisionShape, MeshError, Ray, RayMode, RaycastResult, Trimesh};
pub use collision_layers::CollisionLayers;
pub use world::{BodyKey, CollisionBody, CollisionWorld};

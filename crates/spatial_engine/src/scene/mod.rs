//! Scene-level visibility helpers
//!
//! Frustum extraction and culling used by the renderer before it issues
//! draw calls.

mod frustum;

pub use frustum::{Frustum, Plane};

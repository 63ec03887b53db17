//! # Core Module
//!
//! Engine-wide configuration shared by the spatial and physics subsystems.

pub mod config;

pub use config::{Config, ConfigError, RaycastConfig, SpatialConfig};

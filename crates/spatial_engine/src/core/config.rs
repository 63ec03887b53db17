//! # Spatial Configuration
//!
//! Tunables for the spatial index and ray queries, loadable from TOML or
//! RON through the [`Config`] trait. Missing fields fall back to defaults,
//! so a file only needs to name what it changes:
//!
//! ```toml
//! [octree]
//! max_depth = 6
//!
//! [raycast]
//! skip_backfaces = true
//! mode = "any"
//! ```

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};
use crate::physics::collision::RayMode;
pub use crate::spatial::MAX_OCTREE_DEPTH;
use crate::spatial::OctreeConfig;

/// # Raycast Configuration
///
/// Defaults applied to rays built with [`Ray::from_config`](crate::physics::Ray::from_config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaycastConfig {
    /// Tolerance for near-parallel plane hits
    pub precision: f32,
    /// Ignore hits on faces whose normal points along the ray
    pub skip_backfaces: bool,
    /// Hit bookkeeping policy
    pub mode: RayMode,
}

impl RaycastConfig {
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

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.precision.is_finite() || self.precision < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "raycast precision must be a non-negative number, got {}",
                self.precision
            )));
        }
        Ok(())
    }
}

impl Default for RaycastConfig {
    fn default() -> Self {
        Self {
            precision: 1e-4,
            skip_backfaces: false,
            mode: RayMode::Closest,
        }
    }
}

/// # Complete Spatial Configuration
///
/// Top-level configuration for the spatial and physics subsystems.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Octree settings used for trimesh triangle trees
    pub octree: OctreeConfig,
    /// Ray defaults
    pub raycast: RaycastConfig,
}

impl Config for SpatialConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.octree.validate()?;
        self.raycast.validate()
    }
}

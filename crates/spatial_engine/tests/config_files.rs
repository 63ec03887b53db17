//! Integration tests for loading and saving configuration files

use spatial_engine::prelude::*;
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("spatial_engine_{}_{}", std::process::id(), name))
}

#[test]
fn toml_round_trip_through_file() {
    let path = temp_path("round_trip.toml");
    let mut config = SpatialConfig::default();
    config.octree.max_depth = 5;
    config.raycast = RaycastConfig::default().with_mode(RayMode::All).with_skip_backfaces(true);

    config.save_to_file(&path).unwrap();
    let loaded = SpatialConfig::load_from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn ron_round_trip_through_file() {
    let path = temp_path("round_trip.ron");
    let config = SpatialConfig::default();

    config.save_to_file(&path).unwrap();
    let loaded = SpatialConfig::load_from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn unknown_extension_is_rejected() {
    let result = SpatialConfig::default().save_to_file(temp_path("config.json"));
    assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
}

#[test]
fn invalid_values_fail_on_load() {
    let path = temp_path("too_deep.toml");
    std::fs::write(&path, "[octree]\nmax_depth = 40\n").unwrap();

    let result = SpatialConfig::load_from_file(&path);
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn missing_file_is_io_error() {
    let result = SpatialConfig::load_from_file(temp_path("does_not_exist.toml"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn ray_picks_up_configured_defaults() {
    let config = RaycastConfig::default().with_mode(RayMode::Any).with_skip_backfaces(true);
    let ray = Ray::from_config(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0), &config);

    assert_eq!(ray.mode, RayMode::Any);
    assert!(ray.skip_backfaces);
    assert_eq!(ray.precision, config.precision);
}

//! Ray probe demo
//!
//! Builds a small static level (ground grid, a ramp and a floating pickup),
//! then fires closest, any and all-hits rays into it and culls it against a
//! camera frustum, logging what each query finds.
//!
//! Usage: `probe_demo [config.toml|config.ron]`

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use spatial_engine::foundation::logging;
use spatial_engine::prelude::*;

#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error("mesh error: {0}")]
    Mesh(#[from] MeshError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Flat grid of unit cells in the local XY plane
fn grid_mesh(cells: u32, config: &SpatialConfig) -> Result<Trimesh, MeshError> {
    let side = cells + 1;
    let vertices = (0..side)
        .flat_map(|y| (0..side).flat_map(move |x| [x as f32, y as f32, 0.0]))
        .collect();

    let mut indices = Vec::with_capacity((cells * cells * 6) as usize);
    for y in 0..cells {
        for x in 0..cells {
            let i = y * side + x;
            indices.extend_from_slice(&[i, i + side, i + 1, i + 1, i + side, i + side + 1]);
        }
    }

    Trimesh::with_config(vertices, indices, &config.octree)
}

fn build_level(config: &SpatialConfig) -> Result<CollisionWorld, DemoError> {
    let mut world = CollisionWorld::new();

    // Ground: 20x20 grid turned so local +Z faces world +Y
    world.add_body(CollisionBody::new(
        CollisionShape::trimesh(grid_mesh(20, config)?),
        Transform::from_position_rotation(
            Vec3::new(-10.0, 0.0, 10.0),
            Quat::from_axis_angle(&Vec3::x_axis(), -FRAC_PI_2),
        ),
    ));

    // Ramp: a stretched 4x4 grid tilted 45 degrees
    let mut ramp = grid_mesh(4, config)?;
    ramp.set_scale(Vec3::new(1.0, 2.0, 1.0));
    world.add_body(CollisionBody::new(
        CollisionShape::trimesh(ramp),
        Transform::from_position_rotation(
            Vec3::new(2.0, 0.0, -2.0),
            Quat::from_axis_angle(&Vec3::x_axis(), -FRAC_PI_4),
        ),
    ));

    // Pickup floating above the origin
    world.add_body(
        CollisionBody::new(
            CollisionShape::sphere(0.5),
            Transform::from_position(Vec3::new(0.0, 1.5, 0.0)),
        )
        .with_layers(CollisionLayers::PICKUP, CollisionLayers::PLAYER),
    );

    log::info!("Level built with {} bodies", world.len());
    Ok(world)
}

fn log_result(label: &str, result: &RaycastResult) {
    if result.has_hit {
        log::info!(
            "{}: hit {:?} at ({:.2}, {:.2}, {:.2}), distance {:.2}, face {:?}",
            label,
            result.body,
            result.hit_point_world.x,
            result.hit_point_world.y,
            result.hit_point_world.z,
            result.distance,
            result.hit_face_index,
        );
    } else {
        log::info!("{}: no hit", label);
    }
}

fn run(config: &SpatialConfig) -> Result<(), DemoError> {
    let world = build_level(config)?;
    let from = Vec3::new(0.0, 10.0, 0.0);
    let to = Vec3::new(0.0, -10.0, 0.0);

    let mut ray = Ray::from_config(from, to, &config.raycast);
    world.raycast_closest(&mut ray);
    log_result("closest", &ray.result);

    // Ground probe that ignores pickups
    let mut probe = Ray::from_config(from, to, &config.raycast)
        .with_collision_filter(CollisionLayers::PLAYER, CollisionLayers::WORLD);
    world.raycast_any(&mut probe);
    log_result("ground probe", &probe.result);

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let mut sweep = Ray::from_config(Vec3::new(3.0, 10.0, -3.0), Vec3::new(3.0, -10.0, -3.0), &config.raycast)
        .with_callback(move |result| {
            counter.fetch_add(1, Ordering::Relaxed);
            log_result("  all", result);
        });
    world.raycast_all(&mut sweep);
    log::info!("all: {} hits", hits.load(Ordering::Relaxed));

    let view = Mat4::look_at(Vec3::new(0.0, 3.0, 12.0), Vec3::zeros(), Vec3::y());
    let projection = Mat4::perspective(FRAC_PI_4, 16.0 / 9.0, 0.1, 100.0);
    let frustum = Frustum::from_matrix(&(projection * view));

    let mut visible = Vec::new();
    world.visible_bodies(&frustum, &mut visible);
    log::info!("{} of {} bodies in view", visible.len(), world.len());

    Ok(())
}

fn main() -> Result<(), DemoError> {
    logging::init_with_level(logging::LevelFilter::Info);

    println!("=== Ray Probe Demo ===");

    let config = match std::env::args().nth(1) {
        Some(path) => SpatialConfig::load_from_file(path)?,
        None => SpatialConfig::default(),
    };

    run(&config)
}

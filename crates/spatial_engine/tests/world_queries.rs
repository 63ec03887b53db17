//! Integration tests for ray casts and culling against a small level

use approx::assert_relative_eq;
use spatial_engine::prelude::*;
use std::f32::consts::FRAC_PI_2;

/// Grid of unit cells in the local XY plane, two triangles per cell
fn grid_mesh(cells: u32) -> Trimesh {
    let side = cells + 1;
    let mut vertices = Vec::new();
    for y in 0..side {
        for x in 0..side {
            vertices.extend_from_slice(&[x as f32, y as f32, 0.0]);
        }
    }

    let mut indices = Vec::new();
    for y in 0..cells {
        for x in 0..cells {
            let i = y * side + x;
            indices.extend_from_slice(&[i, i + side, i + 1]);
            indices.extend_from_slice(&[i + 1, i + side, i + side + 1]);
        }
    }

    Trimesh::new(vertices, indices).unwrap()
}

/// Ground grid laid flat (local +Z turned to world +Y) plus a floating sphere
fn level() -> (CollisionWorld, BodyKey, BodyKey) {
    let mut world = CollisionWorld::new();
    let ground = world.add_body(CollisionBody::new(
        CollisionShape::trimesh(grid_mesh(10)),
        Transform::from_position_rotation(
            Vec3::new(-5.0, 0.0, 5.0),
            Quat::from_axis_angle(&Vec3::x_axis(), -FRAC_PI_2),
        ),
    ));
    let ball = world.add_body(
        CollisionBody::new(
            CollisionShape::sphere(1.0),
            Transform::from_position(Vec3::new(0.0, 3.0, 0.0)),
        )
        .with_layers(CollisionLayers::PICKUP, CollisionLayers::all()),
    );
    (world, ground, ball)
}

#[test]
fn ground_probe_hits_grid_from_above() {
    let (world, ground, _) = level();
    let mut ray = Ray::new(Vec3::new(2.3, 10.0, -1.4), Vec3::new(2.3, -10.0, -1.4))
        .with_collision_filter(CollisionLayers::PLAYER, CollisionLayers::WORLD);

    assert!(world.raycast_closest(&mut ray));
    assert_eq!(ray.result.body, Some(ground));
    assert_relative_eq!(ray.result.hit_point_world, Vec3::new(2.3, 0.0, -1.4), epsilon = 1e-4);
    assert_relative_eq!(ray.result.distance, 10.0, epsilon = 1e-4);
    assert!(ray.result.hit_face_index.is_some());
}

#[test]
fn closest_prefers_sphere_over_ground() {
    let (world, _, ball) = level();
    let mut ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, -10.0, 0.0));

    assert!(world.raycast_closest(&mut ray));
    assert_eq!(ray.result.body, Some(ball));
    assert_relative_eq!(ray.result.hit_point_world, Vec3::new(0.0, 4.0, 0.0), epsilon = 1e-4);
    assert_relative_eq!(ray.result.hit_normal_world, Vec3::y(), epsilon = 1e-4);
}

#[test]
fn ray_outside_level_misses_everything() {
    let (world, _, _) = level();
    let mut ray = Ray::new(Vec3::new(50.0, 10.0, 0.0), Vec3::new(50.0, -10.0, 0.0));

    assert!(!world.raycast_any(&mut ray));
    assert_eq!(ray.result.distance, -1.0);
    assert_eq!(ray.result.body, None);
}

#[test]
fn result_is_reset_between_casts() {
    let (world, _, _) = level();
    let mut ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, -10.0, 0.0));
    assert!(world.raycast_any(&mut ray));

    ray.set_endpoints(Vec3::new(50.0, 10.0, 0.0), Vec3::new(50.0, -10.0, 0.0));
    assert!(!world.raycast_any(&mut ray));
    assert!(!ray.result.should_stop);
}

#[test]
fn octree_culls_candidates_for_short_ray() {
    let mesh = grid_mesh(10);
    let mut candidates = Vec::new();
    mesh.get_triangles_in_aabb(&AABB::new(Vec3::new(2.2, 3.2, -1.0), Vec3::new(2.4, 3.4, 1.0)), &mut candidates);

    assert!(!candidates.is_empty());
    assert!(candidates.len() < mesh.triangle_count());
}

#[test]
fn camera_sees_ground_but_not_body_behind() {
    let (mut world, ground, ball) = level();
    world.set_body_transform(ball, Transform::from_position(Vec3::new(0.0, 3.0, 40.0)));

    let view = Mat4::look_at(Vec3::new(0.0, 2.0, 10.0), Vec3::new(0.0, 0.0, 0.0), Vec3::y());
    let projection = Mat4::perspective(FRAC_PI_2, 16.0 / 9.0, 0.1, 200.0);
    let frustum = Frustum::from_matrix(&(projection * view));

    let mut visible = Vec::new();
    world.visible_bodies(&frustum, &mut visible);

    assert_eq!(visible, vec![ground]);
}

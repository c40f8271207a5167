//! End-to-end behavior of a world through its public API.

use std::sync::{Mutex, MutexGuard};

use approx::assert_relative_eq;
use shared::{CallerQuat, CallerVec3, Layer, LayerMask};
use world_sim::{
    BoxParams, CapsuleParams, CharacterAction, CharacterParams, CollisionBody, CollisionTriMesh,
    MeshTransform, PhysicsInput, PrimitiveParams, QueryFilters, SphereParams, StaticMeshAsset,
    TriangleIndices, WorldKey, WorldSimConfig, WorldSimError, WorldSimOwner,
};

/// One world per process at a time.
fn world() -> (MutexGuard<'static, ()>, WorldSimOwner) {
    static LOCK: Mutex<()> = Mutex::new(());
    let guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let world = WorldSimOwner::new(WorldSimConfig::default().with_worker_threads(2))
        .expect("world builds");
    (guard, world)
}

fn unit_box(at: CallerVec3, layer: Layer) -> BoxParams {
    BoxParams::new(at, CallerVec3::new(1.0, 1.0, 1.0), layer)
}

fn floor_mesh(half: f32) -> StaticMeshAsset {
    StaticMeshAsset {
        name: "floor".into(),
        is_compiling: false,
        has_render_data: true,
        collision: Some(CollisionBody {
            tri_meshes: vec![CollisionTriMesh {
                vertices: vec![
                    CallerVec3::new(-half, -half, 0.0),
                    CallerVec3::new(half, -half, 0.0),
                    CallerVec3::new(half, half, 0.0),
                    CallerVec3::new(-half, half, 0.0),
                ],
                indices: TriangleIndices::Small(vec![[0, 1, 2], [0, 2, 3]]),
            }],
        }),
    }
}

#[test]
fn identical_boxes_share_a_cached_shape() {
    let (_guard, mut world) = world();

    let a = world.create_box(&unit_box(CallerVec3::new(0.0, 0.0, 0.0), Layer::NonMoving));
    let b = world.create_box(&unit_box(CallerVec3::new(5.0, 0.0, 0.0), Layer::NonMoving));
    assert!(a.is_some() && b.is_some());
    assert_ne!(a, b);
    assert_eq!(world.shape_cache().len(), 1);

    world.create_box(&BoxParams::new(
        CallerVec3::new(10.0, 0.0, 0.0),
        CallerVec3::new(2.0, 1.0, 1.0),
        Layer::NonMoving,
    ));
    assert_eq!(world.shape_cache().len(), 2);
}

#[test]
fn removed_key_is_never_handed_out_again() {
    let (_guard, mut world) = world();

    let first = world
        .create_box(&unit_box(CallerVec3::zeros(), Layer::NonMoving))
        .expect("first");
    assert!(world.remove_primitive(first));

    let second = world
        .create_box(&unit_box(CallerVec3::zeros(), Layer::NonMoving))
        .expect("second");
    assert_ne!(first, second);
    assert_eq!(first.world_id(), second.world_id());
    assert!(world.position(first).is_none());
    assert!(world.position(second).is_some());
}

#[test]
fn ray_in_empty_world_reports_the_invalid_sentinel() {
    let (_guard, world) = world();

    let hit = world.cast_ray(
        CallerVec3::zeros(),
        CallerVec3::new(0.0, 0.0, -100.0),
        &QueryFilters::default(),
    );
    assert!(!hit.blocking_hit);
    assert_eq!(hit.my_item, -1);
    assert!(!hit.is_hit());
}

#[test]
fn ray_hits_static_box_and_reports_its_key() {
    let (_guard, mut world) = world();
    let key = world
        .create_box(&unit_box(CallerVec3::zeros(), Layer::NonMoving))
        .expect("box");
    world.step();

    let hit = world.cast_ray(
        CallerVec3::new(0.0, 0.0, 5.0),
        CallerVec3::new(0.0, 0.0, -10.0),
        &QueryFilters::default(),
    );
    assert!(hit.is_hit());
    assert_relative_eq!(hit.distance, 4.0, epsilon = 1.0e-3);
    assert_relative_eq!(hit.impact_normal.z(), 1.0, epsilon = 1.0e-3);
    assert_eq!(hit.body_id().and_then(|id| world.key_for_body(id)), Some(key));

    // Too short to reach the box.
    let miss = world.cast_ray(
        CallerVec3::new(0.0, 0.0, 5.0),
        CallerVec3::new(0.0, 0.0, -3.0),
        &QueryFilters::default(),
    );
    assert!(!miss.is_hit());
}

#[test]
fn query_layers_and_ignore_filter_bodies() {
    let (_guard, mut world) = world();
    let crate_key = world
        .create_box(&unit_box(CallerVec3::new(0.0, 0.0, 3.0), Layer::Moving))
        .expect("crate");
    let ground = world
        .create_box(&unit_box(CallerVec3::zeros(), Layer::NonMoving))
        .expect("ground");
    world.optimize_broad_phase();
    world.step();

    let down = CallerVec3::new(0.0, 0.0, -20.0);
    let origin = CallerVec3::new(0.0, 0.0, 10.0);

    let first = world.cast_ray(origin, down, &QueryFilters::default());
    assert_eq!(first.body_id().and_then(|id| world.key_for_body(id)), Some(crate_key));

    let level_only = QueryFilters::layers(Layer::CastQueryLevelGeometryOnly.collides_with());
    let hit = world.cast_ray(origin, down, &level_only);
    assert_eq!(hit.body_id().and_then(|id| world.key_for_body(id)), Some(ground));

    let ignoring = QueryFilters::default().ignoring(crate_key);
    let hit = world.cast_ray(origin, down, &ignoring);
    assert_eq!(hit.body_id().and_then(|id| world.key_for_body(id)), Some(ground));

    let nothing = QueryFilters::layers(LayerMask::NONE);
    assert!(!world.cast_ray(origin, down, &nothing).is_hit());
}

#[test]
fn sphere_cast_distance_runs_to_the_contact_point() {
    let (_guard, mut world) = world();
    let key = world
        .create_box(&unit_box(CallerVec3::zeros(), Layer::NonMoving))
        .expect("box");
    world.step();

    let hit = world.sphere_cast(
        CallerVec3::new(-5.0, 0.0, 0.0),
        CallerVec3::new(1.0, 0.0, 0.0),
        0.5,
        10.0,
        &QueryFilters::default(),
    );
    assert!(hit.is_hit());
    assert_eq!(hit.body_id().and_then(|id| world.key_for_body(id)), Some(key));
    // Sphere center stops at x = -1.5 and touches the box face at x = -1.
    assert_relative_eq!(hit.distance, 4.0, epsilon = 1.0e-2);
    assert_relative_eq!(hit.impact_point.x(), -1.0, epsilon = 1.0e-2);
    assert_eq!(hit.location, hit.impact_point);
    assert_relative_eq!(hit.impact_normal.x(), -1.0, epsilon = 1.0e-2);
}

#[test]
fn sphere_cast_starting_inside_reports_deepest_point() {
    let (_guard, mut world) = world();
    world
        .create_box(&unit_box(CallerVec3::zeros(), Layer::NonMoving))
        .expect("box");
    world.step();

    let hit = world.sphere_cast(
        CallerVec3::new(-1.2, 0.0, 0.0),
        CallerVec3::new(1.0, 0.0, 0.0),
        0.5,
        10.0,
        &QueryFilters::default(),
    );
    assert!(hit.is_hit());
    // Deepest point of the sphere inside the box, half a metre past the origin.
    assert_relative_eq!(hit.location.x(), -0.7, epsilon = 1.0e-2);
    assert_eq!(hit.location, hit.impact_point);
    assert_relative_eq!(hit.distance, 0.5, epsilon = 1.0e-2);
}

#[test]
fn sphere_cast_grazing_a_box_top_reports_the_edge_contact() {
    let (_guard, mut world) = world();
    let key = world
        .create_box(&unit_box(CallerVec3::zeros(), Layer::NonMoving))
        .expect("box");
    world.step();

    // Sphere bottom skims the top face at z = 1.
    let hit = world.sphere_cast(
        CallerVec3::new(-5.0, 0.0, 1.5),
        CallerVec3::new(1.0, 0.0, 0.0),
        0.5,
        10.0,
        &QueryFilters::default(),
    );
    assert!(hit.is_hit());
    assert_eq!(hit.body_id().and_then(|id| world.key_for_body(id)), Some(key));

    // First touch at the near top edge: 4m of travel, contact half a metre below the path.
    let expected = (4.0f32 * 4.0 + 0.5 * 0.5).sqrt();
    assert_relative_eq!(hit.distance, expected, epsilon = 1.0e-2);
    assert_relative_eq!(hit.impact_point.z(), 1.0, epsilon = 1.0e-2);
    assert_relative_eq!(hit.impact_point.x(), -1.0, epsilon = 1.0e-2);
    assert!(hit.impact_normal.z() > 0.99, "normal {:?}", hit.impact_normal.0);
}

#[test]
fn sphere_cast_misses_off_axis() {
    let (_guard, mut world) = world();
    world
        .create_box(&unit_box(CallerVec3::zeros(), Layer::NonMoving))
        .expect("box");
    world.step();

    let hit = world.sphere_cast(
        CallerVec3::new(-5.0, 0.0, 3.0),
        CallerVec3::new(1.0, 0.0, 0.0),
        0.5,
        10.0,
        &QueryFilters::default(),
    );
    assert!(!hit.is_hit());
}

#[test]
fn sphere_search_finds_only_nearby_bodies() {
    let (_guard, mut world) = world();
    let near = world
        .create_box(&unit_box(CallerVec3::zeros(), Layer::NonMoving))
        .expect("near");
    world
        .create_box(&unit_box(CallerVec3::new(20.0, 0.0, 0.0), Layer::NonMoving))
        .expect("far");
    world.step();

    let found = world.sphere_search(CallerVec3::new(0.0, 0.0, 2.5), 2.0, &QueryFilters::default());
    let keys: Vec<WorldKey> = found.iter().filter_map(|id| world.key_for_body(*id)).collect();
    assert_eq!(keys, vec![near]);
}

#[test]
fn placement_round_trips_through_kernel_space() {
    let (_guard, mut world) = world();

    let yaw = CallerQuat(nalgebra::Quaternion::new(0.25f32.cos(), 0.0, 0.0, 0.25f32.sin()));
    let mut params = unit_box(CallerVec3::new(3.2, 7.0, 1.9), Layer::NonMoving);
    params.rotation = yaw;
    let key = world.create_box(&params).expect("box");

    // Placement snaps to the 1m grid.
    assert_eq!(world.position(key), Some(CallerVec3::new(3.0, 7.0, 2.0)));

    let rotation = world.rotation(key).expect("rotation").0;
    assert_relative_eq!(rotation.w, yaw.0.w, epsilon = 1.0e-5);
    assert_relative_eq!(rotation.k, yaw.0.k, epsilon = 1.0e-5);
    assert_relative_eq!(rotation.i, 0.0, epsilon = 1.0e-5);
    assert_relative_eq!(rotation.j, 0.0, epsilon = 1.0e-5);
}

#[test]
fn kinematic_sensor_detects_static_geometry() {
    let (_guard, mut world) = world();
    let ground = world
        .create_box(&unit_box(CallerVec3::zeros(), Layer::NonMoving))
        .expect("ground");
    let sensor = world
        .create_box(
            &BoxParams::new(
                CallerVec3::new(0.0, 0.0, 1.0),
                CallerVec3::new(0.5, 0.5, 0.5),
                Layer::Hitbox,
            )
            .sensor(),
        )
        .expect("sensor");

    world.step();

    assert_eq!(world.overlaps(sensor), vec![ground]);
    let events = world.drain_contact_events();
    assert!(events.iter().any(|e| {
        e.started && e.sensor && [e.a, e.b].contains(&sensor) && [e.a, e.b].contains(&ground)
    }));
    assert!(world.drain_contact_events().is_empty());

    // Sensors are skipped by default queries.
    let hit = world.cast_ray(
        CallerVec3::new(0.0, 0.0, 5.0),
        CallerVec3::new(0.0, 0.0, -10.0),
        &QueryFilters::default(),
    );
    assert_eq!(hit.body_id().and_then(|id| world.key_for_body(id)), Some(ground));
}

#[test]
fn dynamic_box_falls_under_gravity() {
    let (_guard, mut world) = world();
    let key = world
        .create_box(
            &unit_box(CallerVec3::zeros(), Layer::Moving).with_mass(shared::MassCategory::Medium),
        )
        .expect("box");

    let dt = world.config().delta_time;
    let g = 9.81;
    world.step();

    let after_one = world.position(key).expect("position");
    let drop = -after_one.z();
    assert!(
        drop > 0.4 * g * dt * dt && drop < 1.1 * g * dt * dt,
        "unexpected first-step drop {drop}"
    );
    assert_relative_eq!(after_one.x(), 0.0, epsilon = 1.0e-6);
    assert_relative_eq!(after_one.y(), 0.0, epsilon = 1.0e-6);

    for _ in 0..59 {
        world.step();
    }
    let velocity = world.linear_velocity(key).expect("velocity");
    assert!(velocity.z() < -9.0 && velocity.z() > -10.5, "vz = {}", velocity.z());
    assert_eq!(world.steps(), 60);
}

#[test]
fn bulk_insert_then_optimize_keeps_contacts() {
    let (_guard, mut world) = world();
    let ground = world
        .create_box(&BoxParams::new(
            CallerVec3::zeros(),
            CallerVec3::new(10.0, 10.0, 1.0),
            Layer::NonMoving,
        ))
        .expect("ground");
    let crate_key = world
        .create_box(
            &unit_box(CallerVec3::new(0.0, 0.0, 2.0), Layer::Moving)
                .with_mass(shared::MassCategory::Medium),
        )
        .expect("crate");
    let sensor = world
        .create_box(
            &BoxParams::new(
                CallerVec3::new(5.0, 5.0, 1.0),
                CallerVec3::new(0.5, 0.5, 0.5),
                Layer::Hitbox,
            )
            .sensor(),
        )
        .expect("sensor");

    world.optimize_broad_phase();

    // Visible to queries before any step.
    let hit = world.cast_ray(
        CallerVec3::new(0.0, 0.0, 10.0),
        CallerVec3::new(0.0, 0.0, -20.0),
        &QueryFilters::default(),
    );
    assert_eq!(hit.body_id().and_then(|id| world.key_for_body(id)), Some(crate_key));

    for _ in 0..120 {
        world.step();
    }
    let resting = world.position(crate_key).expect("position").z();
    assert!(resting > 1.5 && resting < 2.5, "crate at z {resting}");
    assert_eq!(world.overlaps(sensor), vec![ground]);
}

#[test]
fn capsule_offset_moves_the_collider_not_the_body() {
    let (_guard, mut world) = world();
    let key = world
        .create_capsule(
            &CapsuleParams::new(CallerVec3::zeros(), 1.0, 0.5, Layer::NonMoving)
                .with_offset(CallerVec3::new(3.0, 0.0, 0.0)),
        )
        .expect("capsule");
    world.step();

    assert_eq!(world.position(key), Some(CallerVec3::zeros()));

    let down = CallerVec3::new(0.0, 0.0, -10.0);
    let at_body = world.cast_ray(CallerVec3::new(0.0, 0.0, 5.0), down, &QueryFilters::default());
    assert!(!at_body.is_hit());

    // Upright capsule: its top sits half height plus radius above the offset point.
    let at_offset = world.cast_ray(CallerVec3::new(3.0, 0.0, 5.0), down, &QueryFilters::default());
    assert_eq!(at_offset.body_id().and_then(|id| world.key_for_body(id)), Some(key));
    assert_relative_eq!(at_offset.impact_point.z(), 1.5, epsilon = 1.0e-3);
}

#[test]
fn force_dynamic_overrides_a_kinematic_layer() {
    let (_guard, mut world) = world();
    let pinned = world
        .create_box(&unit_box(CallerVec3::new(0.0, 0.0, 10.0), Layer::Hitbox))
        .expect("pinned");
    let dropped = world
        .create_box(&unit_box(CallerVec3::new(5.0, 0.0, 10.0), Layer::Hitbox).force_dynamic())
        .expect("dropped");

    for _ in 0..10 {
        world.step();
    }
    assert_eq!(world.position(pinned).map(|p| p.z()), Some(10.0));
    assert!(world.position(dropped).expect("position").z() < 10.0);
}

#[test]
fn character_inputs_apply_in_order() {
    let (_guard, mut world) = world();
    world
        .create_box(&BoxParams::new(
            CallerVec3::zeros(),
            CallerVec3::new(50.0, 50.0, 1.0),
            Layer::NonMoving,
        ))
        .expect("floor");
    let hero = world
        .create_character(&CharacterParams::new(
            CallerVec3::new(0.0, 0.0, 2.3),
            0.9,
            0.3,
            4.0,
        ))
        .expect("character");
    world.step();

    let stranger = WorldKey::from_raw(hero.raw() ^ 0x00FF_FFFF);
    let inputs = [
        PhysicsInput {
            target: hero,
            action: CharacterAction::Locomotion(CallerVec3::new(1.0, 0.0, 0.0)),
        },
        PhysicsInput {
            target: stranger,
            action: CharacterAction::Jump,
        },
        PhysicsInput {
            target: hero,
            action: CharacterAction::Locomotion(CallerVec3::new(0.0, 1.0, 0.0)),
        },
    ];
    assert!(!world.update_characters(&inputs));

    let start = world.position(hero).expect("start");
    for _ in 0..30 {
        world.step();
    }
    let end = world.position(hero).expect("end");

    // The later command replaced the earlier one.
    assert!(end.y() - start.y() > 0.2, "moved {:?}", (end - start).0);
    assert!((end.x() - start.x()).abs() < 0.05, "moved {:?}", (end - start).0);
    // Resting on the floor rather than falling through it.
    assert!(end.z() > 1.5);
    assert!(world.character(hero).expect("state").is_grounded());
}

#[test]
fn character_update_for_unknown_key_is_refused() {
    let (_guard, mut world) = world();
    let rock = world
        .create_sphere(&SphereParams::new(CallerVec3::zeros(), 0.5, Layer::NonMoving))
        .expect("rock");

    assert!(!world.update_character(&PhysicsInput {
        target: rock,
        action: CharacterAction::Jump,
    }));
}

#[test]
fn complex_mesh_loads_and_blocks_rays() {
    let (_guard, mut world) = world();
    let asset = floor_mesh(5.0);

    let key = world
        .load_complex_static_mesh(&MeshTransform::default(), Some(&asset))
        .expect("no error")
        .expect("mesh key");
    world.step();

    let hit = world.cast_ray(
        CallerVec3::new(1.0, 1.0, 5.0),
        CallerVec3::new(0.0, 0.0, -10.0),
        &QueryFilters::default(),
    );
    assert_eq!(hit.body_id().and_then(|id| world.key_for_body(id)), Some(key));
    assert_relative_eq!(hit.distance, 5.0, epsilon = 1.0e-3);
}

#[test]
fn complex_mesh_edge_cases() {
    let (_guard, mut world) = world();

    assert!(matches!(
        world.load_complex_static_mesh(&MeshTransform::default(), None),
        Ok(None)
    ));

    let mut compiling = floor_mesh(1.0);
    compiling.is_compiling = true;
    assert!(matches!(
        world.load_complex_static_mesh(&MeshTransform::default(), Some(&compiling)),
        Ok(None)
    ));

    let flat = MeshTransform {
        scale: CallerVec3::new(1.0, 0.0, 1.0),
        ..MeshTransform::default()
    };
    assert!(matches!(
        world.load_complex_static_mesh(&flat, Some(&floor_mesh(1.0))),
        Err(WorldSimError::MeshScale { .. })
    ));
    assert_eq!(world.body_count(), 0);
}

#[test]
fn create_primitive_dispatches_every_kind() {
    let (_guard, mut world) = world();
    let asset = floor_mesh(2.0);

    let kinds = [
        PrimitiveParams::Box(unit_box(CallerVec3::zeros(), Layer::NonMoving)),
        PrimitiveParams::Sphere(SphereParams::new(CallerVec3::new(4.0, 0.0, 0.0), 0.5, Layer::Debris)),
        PrimitiveParams::Capsule(CapsuleParams::new(
            CallerVec3::new(8.0, 0.0, 0.0),
            0.5,
            0.25,
            Layer::Enemy,
        )),
        PrimitiveParams::Character(CharacterParams::new(CallerVec3::new(12.0, 0.0, 3.0), 0.9, 0.3, 4.0)),
        PrimitiveParams::ComplexMesh {
            transform: MeshTransform::default(),
            mesh: Some(&asset),
        },
    ];
    let keys: Vec<WorldKey> = kinds
        .iter()
        .map(|p| world.create_primitive(p).expect("no error").expect("created"))
        .collect();

    assert_eq!(world.body_count(), 5);
    let mut unique = keys.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), keys.len());
}

/*!
Primitive construction.

Every creation call validates its inputs, derives the motion policy from the layer, pulls
its shape from the [`ShapeCache`], inserts one body with one collider, and registers the
body under a fresh [`WorldKey`]. Bad input and a full world both yield `None`; the only
hard error is a degenerate complex-mesh scale.
*/

use rapier3d::prelude::*;
use shared::constants::{
    LINEAR_CAST_EDGE_SHRINK, MAX_CONVEX_RADIUS, MESH_FRICTION, MESH_RESTITUTION,
};
use shared::{
    CallerVec3, KernelVec3, Layer, MotionQuality, MotionType, to_kernel_coordinates, to_kernel_rotation,
};

use crate::character::CharacterState;
use crate::clock::PhysicsSystem;
use crate::config::WorldSimConfig;
use crate::error::{WorldSimError, WorldSimResult};
use crate::kernel::{body_type, layer_groups, sensor_collision_types, to_ang_vector, to_point, to_vector};
use crate::key::{KeyRegistry, WorldKey};
use crate::mesh::{StaticMeshAsset, merge_collision_meshes};
use crate::params::{
    BoxParams, CapsuleParams, CharacterParams, MeshTransform, PrimitiveParams, SphereParams,
};
use crate::shape_cache::ShapeCache;

/// Borrowed view over the parts of a world needed to build primitives.
pub(crate) struct PrimitiveFactory<'w> {
    pub physics: &'w mut PhysicsSystem,
    pub shapes: &'w mut ShapeCache,
    pub keys: &'w mut KeyRegistry,
    pub config: &'w WorldSimConfig,
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

impl PrimitiveFactory<'_> {
    pub fn create(&mut self, params: &PrimitiveParams<'_>) -> WorldSimResult<Option<WorldKey>> {
        Ok(match params {
            PrimitiveParams::Box(p) => self.create_box(p),
            PrimitiveParams::Sphere(p) => self.create_sphere(p),
            PrimitiveParams::Capsule(p) => self.create_capsule(p),
            PrimitiveParams::Character(p) => self.create_character(p),
            PrimitiveParams::ComplexMesh { transform, mesh } => {
                return self.load_complex_static_mesh(transform, *mesh);
            }
        })
    }

    fn has_capacity(&self) -> bool {
        if self.keys.len() as u64 >= self.config.max_bodies as u64 {
            log::warn!(
                "world {} is full ({} bodies), refusing new primitive",
                self.keys.world_id(),
                self.config.max_bodies
            );
            return false;
        }
        true
    }

    fn rigid_body(&self, motion: MotionType, quality: MotionQuality, at: KernelVec3) -> RigidBodyBuilder {
        RigidBodyBuilder::new(body_type(motion))
            .translation(to_vector(at))
            .ccd_enabled(quality == MotionQuality::LinearCast)
    }

    fn insert(&mut self, body: RigidBodyBuilder, collider: ColliderBuilder) -> WorldKey {
        let physics = &mut *self.physics;
        let handle = physics.bodies.insert(body);
        physics
            .colliders
            .insert_with_parent(collider, handle, &mut physics.bodies);
        self.keys.register(handle)
    }

    fn placed(&self, point: CallerVec3) -> KernelVec3 {
        to_kernel_coordinates(point.grid_snap(self.config.grid_snap))
    }

    pub fn create_box(&mut self, p: &BoxParams) -> Option<WorldKey> {
        let half_extent = to_kernel_coordinates(p.half_extent);
        if !half_extent.0.iter().all(|c| positive(*c)) {
            log::warn!("box with half extent {:?} rejected", p.half_extent.0);
            return None;
        }
        if !self.has_capacity() {
            return None;
        }

        let policy = p.layer.motion_policy();
        let motion = if p.force_dynamic {
            MotionType::Dynamic
        } else {
            policy.motion_type
        };
        let edge_shrink = match policy.quality {
            MotionQuality::LinearCast => LINEAR_CAST_EDGE_SHRINK,
            MotionQuality::Discrete => (half_extent.min_component() * 0.5).min(MAX_CONVEX_RADIUS),
        };
        // The cache halves the shrink again when deriving the convex radius.
        let shape = self.shapes.get_or_create_box_shape(half_extent, edge_shrink);

        let body = self
            .rigid_body(motion, policy.quality, self.placed(p.point))
            .rotation(to_ang_vector(to_kernel_rotation(p.rotation)));
        let collider = self
            .collider(shape, p.layer, p.is_sensor)
            .translation(to_vector(to_kernel_coordinates(p.offset)))
            .mass(p.mass.kilograms());

        let key = self.insert(body, collider);
        log::trace!("box {key:?} on {:?} as {motion:?}", p.layer);
        Some(key)
    }

    pub fn create_sphere(&mut self, p: &SphereParams) -> Option<WorldKey> {
        if !positive(p.radius) {
            log::warn!("sphere with radius {} rejected", p.radius);
            return None;
        }
        if !self.has_capacity() {
            return None;
        }

        let policy = p.layer.motion_policy();
        let body = self.rigid_body(policy.motion_type, policy.quality, self.placed(p.point));
        let collider = self
            .collider(SharedShape::ball(p.radius), p.layer, p.is_sensor)
            .mass(p.mass.kilograms());

        Some(self.insert(body, collider))
    }

    pub fn create_capsule(&mut self, p: &CapsuleParams) -> Option<WorldKey> {
        if !positive(p.radius) || !(p.half_height.is_finite() && p.half_height >= 0.0) {
            log::warn!("capsule {}x{} rejected", p.half_height, p.radius);
            return None;
        }
        if !self.has_capacity() {
            return None;
        }

        let policy = p.layer.motion_policy();
        let shape = self.shapes.get_or_create_capsule_shape(p.half_height, p.radius);
        let body = self
            .rigid_body(policy.motion_type, policy.quality, self.placed(p.point))
            .rotation(to_ang_vector(to_kernel_rotation(p.rotation)));
        let collider = self
            .collider(shape, p.layer, p.is_sensor)
            .translation(to_vector(to_kernel_coordinates(p.offset)))
            .mass(p.mass.kilograms());

        Some(self.insert(body, collider))
    }

    pub fn create_character(&mut self, p: &CharacterParams) -> Option<WorldKey> {
        if !positive(p.radius)
            || !(p.half_height.is_finite() && p.half_height >= 0.0)
            || !(p.max_speed.is_finite() && p.max_speed >= 0.0)
        {
            log::warn!(
                "character {}x{} speed {} rejected",
                p.half_height,
                p.radius,
                p.max_speed
            );
            return None;
        }
        if !self.has_capacity() {
            return None;
        }

        let mut spawn = to_kernel_coordinates(p.point);
        if spawn.is_nan() || spawn.is_near_zero() {
            spawn = KernelVec3::zeros();
        }

        let shape = self.shapes.get_or_create_capsule_shape(p.half_height, p.radius);
        let groups = layer_groups(p.layer);
        let body = RigidBodyBuilder::kinematic_position_based().translation(to_vector(spawn));
        let collider = ColliderBuilder::new(shape)
            .collision_groups(groups)
            .active_collision_types(sensor_collision_types())
            .active_events(ActiveEvents::COLLISION_EVENTS);

        let physics = &mut *self.physics;
        let body = physics.bodies.insert(body);
        let collider = physics
            .colliders
            .insert_with_parent(collider, body, &mut physics.bodies);
        let key = self.keys.register(body);

        let state = CharacterState::new(
            self.keys.world_id(),
            body,
            collider,
            groups,
            p.half_height,
            p.radius,
            spawn,
            p.max_speed,
        );
        self.keys.register_character(key, state);
        log::debug!("character {key:?} spawned at {:?}", spawn.0);
        Some(key)
    }

    /// Load a static triangle mesh from a content asset.
    ///
    /// `Ok(None)` when the asset is missing, still compiling, has no collision data, or the
    /// kernel rejects the triangles. `Err` when the transform's scale is degenerate.
    pub fn load_complex_static_mesh(
        &mut self,
        transform: &MeshTransform,
        mesh: Option<&StaticMeshAsset>,
    ) -> WorldSimResult<Option<WorldKey>> {
        let Some(asset) = mesh else {
            return Ok(None);
        };
        let Some(collision) = asset.ready_collision() else {
            log::debug!("mesh '{}' has no loadable collision", asset.name);
            return Ok(None);
        };
        let Some(merged) = merge_collision_meshes(collision) else {
            return Ok(None);
        };

        let scale = to_kernel_coordinates(transform.scale);
        if !scale.0.iter().all(|c| c.is_finite() && *c != 0.0) {
            log::error!(
                "mesh '{}' has degenerate scale {:?}",
                asset.name,
                transform.scale.0
            );
            return Err(WorldSimError::MeshScale {
                scale: [transform.scale.x(), transform.scale.y(), transform.scale.z()],
            });
        }
        if !self.has_capacity() {
            return Ok(None);
        }

        let vertices: Vec<Point<Real>> = merged
            .vertices
            .iter()
            .map(|v| to_point(KernelVec3(v.0.component_mul(&scale.0))))
            .collect();
        let mut triangles = merged.triangles;
        // A mirroring scale flips winding back.
        if scale.0.iter().filter(|c| **c < 0.0).count() % 2 == 1 {
            for t in &mut triangles {
                t.swap(0, 2);
            }
        }

        let shape = match SharedShape::trimesh(vertices, triangles) {
            Ok(shape) => shape,
            Err(err) => {
                log::warn!("mesh '{}' rejected by the kernel: {err:?}", asset.name);
                return Ok(None);
            }
        };

        let body = RigidBodyBuilder::fixed()
            .translation(to_vector(to_kernel_coordinates(transform.location)))
            .rotation(to_ang_vector(to_kernel_rotation(transform.rotation)));
        let collider = self
            .collider(shape, Layer::NonMoving, false)
            .friction(MESH_FRICTION)
            .restitution(MESH_RESTITUTION);

        let key = self.insert(body, collider);
        log::debug!("mesh '{}' loaded as {key:?}", asset.name);
        Ok(Some(key))
    }

    fn collider(&self, shape: SharedShape, layer: Layer, is_sensor: bool) -> ColliderBuilder {
        let builder = ColliderBuilder::new(shape)
            .collision_groups(layer_groups(layer))
            .sensor(is_sensor)
            .active_events(ActiveEvents::COLLISION_EVENTS);
        if is_sensor {
            builder.active_collision_types(sensor_collision_types())
        } else {
            builder
        }
    }
}

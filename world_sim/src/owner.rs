/*!
The composition root: one physics world, its shapes, keys and clock.

`WorldSimOwner` is single-threaded by contract. Every method takes `&self` or `&mut self`
on the owning thread; the kernel's worker pool is only used inside `step()`.
*/

use rapier3d::prelude::ColliderHandle;
use shared::{CallerQuat, CallerVec3, from_kernel_coordinates, from_kernel_rotation};

use crate::character::{CharacterState, PhysicsInput};
use crate::clock::{PhysicsSystem, SimulationClock};
use crate::config::WorldSimConfig;
use crate::error::WorldSimResult;
use crate::factory::PrimitiveFactory;
use crate::kernel::{from_rotation, from_vector};
use crate::key::{BodyId, KeyRegistry, WorldKey, next_world_id};
use crate::mesh::StaticMeshAsset;
use crate::params::{
    BoxParams, CapsuleParams, CharacterParams, MeshTransform, PrimitiveParams, SphereParams,
};
use crate::query::{self, HitResult, QueryFilters};
use crate::registration::KernelRegistration;
use crate::shape_cache::ShapeCache;

/// Begin or end of a contact or sensor overlap between two primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContactEvent {
    pub a: WorldKey,
    pub b: WorldKey,
    pub started: bool,
    pub sensor: bool,
}

pub struct WorldSimOwner {
    config: WorldSimConfig,
    clock: SimulationClock,
    shapes: ShapeCache,
    keys: KeyRegistry,
    _registration: KernelRegistration,
}

impl WorldSimOwner {
    /// Build a world. Fails if the configuration is invalid, another world is alive in
    /// this process, or the worker pool cannot start.
    pub fn new(config: WorldSimConfig) -> WorldSimResult<Self> {
        config.validate()?;
        let registration = KernelRegistration::acquire()?;
        let clock = SimulationClock::new(&config)?;
        let keys = KeyRegistry::new(next_world_id());

        let mut owner = Self {
            config,
            clock,
            shapes: ShapeCache::new(),
            keys,
            _registration: registration,
        };
        owner.optimize_broad_phase();
        log::info!(
            "world {} up: dt={} capacity={}",
            owner.keys.world_id(),
            owner.config.delta_time,
            owner.config.max_bodies
        );
        Ok(owner)
    }

    pub fn config(&self) -> &WorldSimConfig {
        &self.config
    }

    pub fn world_id(&self) -> u32 {
        self.keys.world_id()
    }

    pub fn body_count(&self) -> usize {
        self.keys.len()
    }

    pub fn shape_cache(&self) -> &ShapeCache {
        &self.shapes
    }

    pub fn physics(&self) -> &PhysicsSystem {
        self.clock.physics()
    }

    pub fn steps(&self) -> u64 {
        self.clock.steps()
    }

    fn factory(&mut self) -> PrimitiveFactory<'_> {
        PrimitiveFactory {
            physics: self.clock.physics_mut(),
            shapes: &mut self.shapes,
            keys: &mut self.keys,
            config: &self.config,
        }
    }

    pub fn create_primitive(&mut self, params: &PrimitiveParams<'_>) -> WorldSimResult<Option<WorldKey>> {
        self.factory().create(params)
    }

    pub fn create_box(&mut self, params: &BoxParams) -> Option<WorldKey> {
        self.factory().create_box(params)
    }

    pub fn create_sphere(&mut self, params: &SphereParams) -> Option<WorldKey> {
        self.factory().create_sphere(params)
    }

    pub fn create_capsule(&mut self, params: &CapsuleParams) -> Option<WorldKey> {
        self.factory().create_capsule(params)
    }

    pub fn create_character(&mut self, params: &CharacterParams) -> Option<WorldKey> {
        self.factory().create_character(params)
    }

    pub fn load_complex_static_mesh(
        &mut self,
        transform: &MeshTransform,
        mesh: Option<&StaticMeshAsset>,
    ) -> WorldSimResult<Option<WorldKey>> {
        self.factory().load_complex_static_mesh(transform, mesh)
    }

    /// Remove a primitive and its character state. Returns `false` for unknown keys.
    pub fn remove_primitive(&mut self, key: WorldKey) -> bool {
        let Some(handle) = self.keys.remove(key) else {
            return false;
        };
        self.clock.physics_mut().remove_body(handle)
    }

    /// Advance the world by one fixed step.
    pub fn step(&mut self) {
        self.clock.step(&mut self.keys);
    }

    /// Expensive broad-phase rebuild. Call after bulk loading, not per tick.
    pub fn optimize_broad_phase(&mut self) {
        self.clock.optimize_broad_phase();
    }

    pub fn cast_ray(&self, origin: CallerVec3, direction: CallerVec3, filters: &QueryFilters) -> HitResult {
        query::cast_ray(self.clock.physics(), &self.keys, origin, direction, filters)
    }

    pub fn sphere_cast(
        &self,
        origin: CallerVec3,
        direction: CallerVec3,
        radius: f32,
        distance: f32,
        filters: &QueryFilters,
    ) -> HitResult {
        query::sphere_cast(
            self.clock.physics(),
            &self.keys,
            origin,
            direction,
            radius,
            distance,
            filters,
        )
    }

    pub fn sphere_search(&self, origin: CallerVec3, radius: f32, filters: &QueryFilters) -> Vec<BodyId> {
        query::sphere_search(self.clock.physics(), &self.keys, origin, radius, filters)
    }

    /// World key of a body id reported by a query on this world.
    pub fn key_for_body(&self, body: BodyId) -> Option<WorldKey> {
        let key = self.keys.key_for_body_id(body);
        self.keys.resolve(key).map(|_| key)
    }

    /// Apply one command. Returns `false` when the target is not a character of this world.
    pub fn update_character(&mut self, input: &PhysicsInput) -> bool {
        match self.keys.find_character_mut(input.target) {
            Some(character) => {
                character.ingest(input.action);
                true
            }
            None => {
                log::debug!("input for unknown character {:?} dropped", input.target);
                false
            }
        }
    }

    /// Apply commands in order. Returns `true` only if every command found its character;
    /// unknown targets are skipped without affecting the rest.
    pub fn update_characters(&mut self, inputs: &[PhysicsInput]) -> bool {
        inputs
            .iter()
            .fold(true, |all, input| self.update_character(input) && all)
    }

    pub fn character(&self, key: WorldKey) -> Option<&CharacterState> {
        self.keys.find_character(key)
    }

    pub fn position(&self, key: WorldKey) -> Option<CallerVec3> {
        let handle = self.keys.resolve(key)?;
        let body = self.clock.physics().bodies.get(handle)?;
        Some(from_kernel_coordinates(from_vector(body.translation())))
    }

    pub fn rotation(&self, key: WorldKey) -> Option<CallerQuat> {
        let handle = self.keys.resolve(key)?;
        let body = self.clock.physics().bodies.get(handle)?;
        Some(from_kernel_rotation(from_rotation(body.rotation())))
    }

    pub fn linear_velocity(&self, key: WorldKey) -> Option<CallerVec3> {
        let handle = self.keys.resolve(key)?;
        let body = self.clock.physics().bodies.get(handle)?;
        Some(from_kernel_coordinates(from_vector(body.linvel())))
    }

    /// Primitives currently touching or overlapping `key`, as of the last step.
    pub fn overlaps(&self, key: WorldKey) -> Vec<WorldKey> {
        let Some(handle) = self.keys.resolve(key) else {
            return Vec::new();
        };
        let physics = self.clock.physics();
        let Some(body) = physics.bodies.get(handle) else {
            return Vec::new();
        };

        let mut others: Vec<WorldKey> = Vec::new();
        for collider in body.colliders() {
            for (c1, c2, intersecting) in physics.narrow_phase.intersection_pairs_with(*collider) {
                if intersecting {
                    others.extend(self.other_key(*collider, c1, c2));
                }
            }
            for pair in physics.narrow_phase.contact_pairs_with(*collider) {
                if pair.has_any_active_contact {
                    others.extend(self.other_key(*collider, pair.collider1, pair.collider2));
                }
            }
        }
        others.sort_unstable();
        others.dedup();
        others.retain(|k| *k != key);
        others
    }

    fn other_key(&self, own: ColliderHandle, c1: ColliderHandle, c2: ColliderHandle) -> Option<WorldKey> {
        let other = if c1 == own { c2 } else { c1 };
        self.collider_key(other)
    }

    fn collider_key(&self, collider: ColliderHandle) -> Option<WorldKey> {
        let parent = self.clock.physics().colliders.get(collider)?.parent()?;
        Some(self.keys.key_for(parent))
    }

    /// Contact and sensor begin/end events recorded since the last drain.
    pub fn drain_contact_events(&self) -> Vec<ContactEvent> {
        self.clock
            .listener()
            .drain()
            .into_iter()
            .filter_map(|e| {
                Some(ContactEvent {
                    a: self.collider_key(e.collider1)?,
                    b: self.collider_key(e.collider2)?,
                    started: e.started,
                    sensor: e.sensor,
                })
            })
            .collect()
    }
}

impl Drop for WorldSimOwner {
    fn drop(&mut self) {
        log::info!(
            "world {} shutting down with {} bodies, {} cached shapes",
            self.keys.world_id(),
            self.keys.len(),
            self.shapes.len()
        );
    }
}

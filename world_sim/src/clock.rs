/*!
Kernel state and the fixed-rate step.

[`PhysicsSystem`] owns every rapier set and pipeline of one world.
[`SimulationClock`] owns the physics system together with what it needs to advance:
the worker pool, the per-step scratch buffers and the contact listener.

Teardown order is fixed by field order in [`SimulationClock`]. Physics goes first, then
one yield so in-flight worker jobs can drain, then the worker pool, then the scratch
buffers. The listener outlives all of them.
*/

use rapier3d::control::KinematicCharacterController;
use rapier3d::prelude::*;
use rayon::prelude::*;

use crate::config::WorldSimConfig;
use crate::error::WorldSimResult;
use crate::kernel::to_vector;
use crate::key::{KeyRegistry, WorldKey};
use crate::listener::ContactListener;

pub struct PhysicsSystem {
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub pipeline: PhysicsPipeline,
    pub islands: IslandManager,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub impulse_joints: ImpulseJointSet,
    pub multibody_joints: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
}

impl PhysicsSystem {
    pub fn new(gravity: Vector<Real>, delta_time: f32) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: delta_time,
            ..IntegrationParameters::default()
        };
        Self {
            gravity,
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    /// Read-only scene-query view over the current broad phase.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    fn step(&mut self, dt: f32, events: &ContactListener) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            events,
        );
    }

    /// Remove a body with its colliders and joints. Returns whether it existed.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.bodies
            .remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }
}

/// One character's movement for one sub-step, filled in two phases: planned on the
/// owning thread, resolved against the world on the worker pool.
#[derive(Clone, Debug)]
pub(crate) struct CharacterMove {
    key: WorldKey,
    body: RigidBodyHandle,
    collider: ColliderHandle,
    controller: KinematicCharacterController,
    groups: InteractionGroups,
    start: Vector<Real>,
    desired: Vector<Real>,
    translation: Vector<Real>,
    grounded: bool,
}

/// Scratch buffers reused across steps.
#[derive(Default)]
pub(crate) struct StepAllocator {
    pub character_moves: Vec<CharacterMove>,
}

impl StepAllocator {
    fn with_capacity(characters: usize) -> Self {
        Self {
            character_moves: Vec::with_capacity(characters),
        }
    }
}

struct YieldOnDrop;

impl Drop for YieldOnDrop {
    fn drop(&mut self) {
        std::thread::yield_now();
    }
}

pub struct SimulationClock {
    physics: PhysicsSystem,
    _drain: YieldOnDrop,
    jobs: rayon::ThreadPool,
    allocator: StepAllocator,
    listener: ContactListener,
    delta_time: f32,
    collision_steps: u32,
    steps: u64,
}

impl SimulationClock {
    pub fn new(config: &WorldSimConfig) -> WorldSimResult<Self> {
        let allocator = StepAllocator::with_capacity(64);
        let listener = ContactListener::new();
        let threads = config.resolved_worker_threads();
        let jobs = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("physics-worker-{i}"))
            .build()?;
        let gravity = to_vector(shared::to_kernel_coordinates(config.gravity));
        let physics = PhysicsSystem::new(gravity, config.delta_time);

        log::debug!(
            "simulation clock: dt={} sub-steps={} workers={threads}",
            config.delta_time,
            config.collision_steps()
        );
        Ok(Self {
            physics,
            _drain: YieldOnDrop,
            jobs,
            allocator,
            listener,
            delta_time: config.delta_time,
            collision_steps: config.collision_steps(),
            steps: 0,
        })
    }

    pub fn physics(&self) -> &PhysicsSystem {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsSystem {
        &mut self.physics
    }

    pub fn listener(&self) -> &ContactListener {
        &self.listener
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn collision_steps(&self) -> u32 {
        self.collision_steps
    }

    /// Completed `step()` calls.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advance the world by one `delta_time`, split into `collision_steps` sub-steps.
    ///
    /// Characters are moved first in each sub-step so the solver sees their new kinematic
    /// targets.
    pub fn step(&mut self, keys: &mut KeyRegistry) {
        let dt = self.delta_time / self.collision_steps as f32;
        for _ in 0..self.collision_steps {
            self.move_characters(keys, dt);

            let physics = &mut self.physics;
            let listener = &self.listener;
            self.jobs.install(|| physics.step(dt, listener));
        }
        self.steps += 1;
    }

    fn move_characters(&mut self, keys: &mut KeyRegistry, dt: f32) {
        let gravity_y = self.physics.gravity.y;
        let moves = &mut self.allocator.character_moves;
        moves.clear();

        for (key, character) in keys.characters() {
            let Some(body) = self.physics.bodies.get(character.body) else {
                continue;
            };
            moves.push(CharacterMove {
                key: *key,
                body: character.body,
                collider: character.collider,
                controller: character.controller.clone(),
                groups: character.groups,
                start: *body.translation(),
                desired: Vector::zeros(),
                translation: Vector::zeros(),
                grounded: false,
            });
        }
        if moves.is_empty() {
            return;
        }
        for m in moves.iter_mut() {
            if let Some(character) = keys.find_character_mut(m.key) {
                m.desired = to_vector(character.desired_translation(dt, gravity_y));
            }
        }

        let scene = SceneView::of(&self.physics);
        self.jobs.install(|| {
            moves
                .par_iter_mut()
                .for_each(|m| resolve_character_move(&scene, m, dt));
        });

        for m in moves.iter() {
            if let Some(body) = self.physics.bodies.get_mut(m.body) {
                body.set_next_kinematic_translation(m.start + m.translation);
            }
            if let Some(character) = keys.find_character_mut(m.key) {
                character.finish_move(m.grounded);
            }
        }
    }

    /// Batch-insert every collider's bounds into the broad phase so they are query-visible
    /// before the next step. Expensive: call after bulk loading, not per tick.
    ///
    /// Pair discovery is left to the next pipeline step, which still sees every new
    /// overlap and hands it to the narrow phase.
    pub fn optimize_broad_phase(&mut self) {
        let physics = &mut self.physics;
        let mut count = 0usize;
        for (handle, collider) in physics.colliders.iter() {
            physics.broad_phase.set_aabb(
                &physics.integration_parameters,
                handle,
                collider.compute_aabb(),
            );
            count += 1;
        }
        log::debug!("broad phase optimized: {count} colliders");
    }
}

/// The shared, read-only part of the world a character move is resolved against.
struct SceneView<'a> {
    bodies: &'a RigidBodySet,
    colliders: &'a ColliderSet,
    broad_phase: &'a BroadPhaseBvh,
    narrow_phase: &'a NarrowPhase,
}

impl<'a> SceneView<'a> {
    fn of(physics: &'a PhysicsSystem) -> Self {
        Self {
            bodies: &physics.bodies,
            colliders: &physics.colliders,
            broad_phase: &physics.broad_phase,
            narrow_phase: &physics.narrow_phase,
        }
    }
}

fn resolve_character_move(scene: &SceneView<'_>, m: &mut CharacterMove, dt: f32) {
    let Some(collider) = scene.colliders.get(m.collider) else {
        return;
    };
    let filter = QueryFilter::default()
        .exclude_rigid_body(m.body)
        .exclude_sensors()
        .groups(m.groups);
    let query = scene.broad_phase.as_query_pipeline(
        scene.narrow_phase.query_dispatcher(),
        scene.bodies,
        scene.colliders,
        filter,
    );
    let position = Isometry::translation(m.start.x, m.start.y, m.start.z);

    let movement = m
        .controller
        .move_shape(dt, &query, collider.shape(), &position, m.desired, |_| {});
    m.translation = movement.translation;
    m.grounded = movement.grounded;
}

impl Drop for SimulationClock {
    fn drop(&mut self) {
        log::debug!(
            "simulation clock stopping after {} steps, {} bodies live",
            self.steps,
            self.physics.bodies.len()
        );
    }
}

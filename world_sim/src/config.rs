/*!
World construction settings.

Defaults come from `shared::constants`; override with the `with_*` builders.

Notes
- `delta_time` is the fixed step the owning thread ticks at. Steps longer than
  `design_tick` are split into `collision_steps()` equal sub-steps so a slow tick rate
  does not destabilize the solver.
- `gravity` is in caller space.
*/

use shared::{
    BODY_INDEX_LIMIT, CallerVec3, DEFAULT_DELTA_TIME, DEFAULT_GRID_SNAP, DEFAULT_MAX_BODIES,
    DESIGN_TICK, GRAVITY_MPS2, MAX_COLLISION_STEPS,
};

use crate::error::{WorldSimError, WorldSimResult};

#[derive(Clone, Debug)]
pub struct WorldSimConfig {
    /// Fixed simulation step (seconds).
    pub delta_time: f32,
    /// Longest step one collision sub-step may cover (seconds).
    pub design_tick: f32,
    /// Body capacity; creation returns `None` once reached.
    pub max_bodies: u32,
    /// Translation grid for primitive placement (caller units, 0 disables).
    pub grid_snap: f32,
    /// Gravity in caller space.
    pub gravity: CallerVec3,
    /// Physics worker threads; `None` uses hardware concurrency minus one.
    pub worker_threads: Option<usize>,
}

impl Default for WorldSimConfig {
    fn default() -> Self {
        Self {
            delta_time: DEFAULT_DELTA_TIME,
            design_tick: DESIGN_TICK,
            max_bodies: DEFAULT_MAX_BODIES,
            grid_snap: DEFAULT_GRID_SNAP,
            gravity: CallerVec3::new(0.0, 0.0, -GRAVITY_MPS2),
            worker_threads: None,
        }
    }
}

impl WorldSimConfig {
    #[must_use]
    pub fn with_delta_time(mut self, delta_time: f32) -> Self {
        self.delta_time = delta_time;
        self
    }

    #[must_use]
    pub fn with_max_bodies(mut self, max_bodies: u32) -> Self {
        self.max_bodies = max_bodies;
        self
    }

    #[must_use]
    pub fn with_grid_snap(mut self, grid_snap: f32) -> Self {
        self.grid_snap = grid_snap;
        self
    }

    #[must_use]
    pub fn with_gravity(mut self, gravity: CallerVec3) -> Self {
        self.gravity = gravity;
        self
    }

    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Number of collision sub-steps per `step()`: one per `design_tick`, rounded up.
    pub fn collision_steps(&self) -> u32 {
        let ratio = self.delta_time / self.design_tick;
        // Shave float noise so exactly 1/60 over 1/60 stays a single step.
        (ratio - 1.0e-4).ceil().max(1.0) as u32
    }

    /// Worker count for the physics pool, never zero.
    pub fn resolved_worker_threads(&self) -> usize {
        self.worker_threads
            .unwrap_or_else(|| num_cpus::get().saturating_sub(1))
            .max(1)
    }

    pub fn validate(&self) -> WorldSimResult<()> {
        if !(self.delta_time.is_finite() && self.delta_time > 0.0) {
            return Err(WorldSimError::InvalidConfig(format!(
                "delta_time must be positive, got {}",
                self.delta_time
            )));
        }
        if !(self.design_tick.is_finite() && self.design_tick > 0.0) {
            return Err(WorldSimError::InvalidConfig(format!(
                "design_tick must be positive, got {}",
                self.design_tick
            )));
        }
        let ratio = self.delta_time / self.design_tick;
        if !ratio.is_finite() || self.collision_steps() > MAX_COLLISION_STEPS {
            return Err(WorldSimError::InvalidConfig(format!(
                "delta_time {} needs more than {MAX_COLLISION_STEPS} sub-steps of {}",
                self.delta_time, self.design_tick
            )));
        }
        // The top index is reserved so no live body id can equal `BodyId::INVALID`.
        if self.max_bodies == 0 || self.max_bodies >= BODY_INDEX_LIMIT {
            return Err(WorldSimError::InvalidConfig(format!(
                "max_bodies must be in 1..{BODY_INDEX_LIMIT}, got {}",
                self.max_bodies
            )));
        }
        if !self.grid_snap.is_finite() || self.grid_snap < 0.0 {
            return Err(WorldSimError::InvalidConfig(format!(
                "grid_snap must be finite and non-negative, got {}",
                self.grid_snap
            )));
        }
        Ok(())
    }
}

/// Fixed simulation timestep in seconds.
///
/// The owning thread ticks the world at this rate; `WorldSimConfig::delta_time`
/// defaults to it.
pub const DEFAULT_DELTA_TIME: f32 = 1.0 / 60.0;

/// Largest timestep a single collision sub-step is expected to stay stable at.
///
/// A world configured with a larger `delta_time` splits each step into
/// `ceil(delta_time / DESIGN_TICK)` sub-steps.
pub const DESIGN_TICK: f32 = 1.0 / 60.0;

/// Most collision sub-steps one `step()` may be split into.
pub const MAX_COLLISION_STEPS: u32 = 16;

/// Default body capacity of a world.
pub const DEFAULT_MAX_BODIES: u32 = 65_536;

/// Hard upper bound on body capacity.
///
/// Body ids pack the arena index into 24 bits, so a world must stay strictly
/// below this many slots.
pub const BODY_INDEX_LIMIT: u32 = 1 << 24;

/// Default translation grid (caller units) primitive placements are snapped to.
pub const DEFAULT_GRID_SNAP: f32 = 1.0;

/// Gravity magnitude in meters per second squared (positive value).
pub const GRAVITY_MPS2: f32 = 9.81;

/// Upper bound on the convex radius used to round box edges (meters).
/// Thin boxes use half their requested shrink instead.
pub const MAX_CONVEX_RADIUS: f32 = 0.01;

/// Edge shrink used for continuously-collided (LinearCast) boxes.
pub const LINEAR_CAST_EDGE_SHRINK: f32 = 0.01;

/// Friction applied to complex static meshes.
pub const MESH_FRICTION: f32 = 0.5;

/// Restitution applied to complex static meshes.
pub const MESH_RESTITUTION: f32 = 0.0;

/// Squared length under which a character spawn position is treated as degenerate
/// and collapsed to the world origin.
pub const NEAR_ZERO_SQ: f32 = 1.0e-12;

/// Vertical speed (m/s) a character `Jump` command adds.
pub const DEFAULT_JUMP_SPEED_MPS: f32 = 5.0;

/// Vertical speed clamp for falling characters (m/s, negative = down).
pub const TERMINAL_FALL_SPEED_MPS: f32 = -50.0;

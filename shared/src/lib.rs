pub mod constants;
pub mod coords;
pub mod layers;
pub mod mass;

pub use constants::{
    BODY_INDEX_LIMIT, DEFAULT_DELTA_TIME, DEFAULT_GRID_SNAP, DEFAULT_MAX_BODIES, DESIGN_TICK,
    GRAVITY_MPS2, MAX_COLLISION_STEPS, MAX_CONVEX_RADIUS,
};
pub use coords::{
    CallerQuat, CallerVec3, KernelQuat, KernelVec3, from_kernel_coordinates, from_kernel_rotation,
    to_kernel_coordinates, to_kernel_rotation,
};
pub use layers::{Layer, LayerMask, MotionPolicy, MotionQuality, MotionType, motion_policy_for_raw_layer};
pub use mass::MassCategory;

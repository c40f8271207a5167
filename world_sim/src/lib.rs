//! Physics world ownership on top of rapier.
//!
//! [`WorldSimOwner`] owns a single simulated world: it builds primitives from gameplay
//! parameters, hands out stable [`WorldKey`]s for them, answers scene queries, drives
//! virtual characters and steps the simulation at a fixed rate. Inputs and outputs are
//! in caller space (Z-up); the conversion to the kernel's Y-up frame happens here.

pub mod character;
pub mod clock;
pub mod config;
pub mod error;
mod factory;
mod kernel;
pub mod key;
mod listener;
pub mod mesh;
pub mod owner;
pub mod params;
pub mod query;
mod registration;
pub mod shape_cache;

pub use character::{CharacterAction, CharacterState, PhysicsInput};
pub use config::WorldSimConfig;
pub use error::{WorldSimError, WorldSimResult};
pub use key::{BodyId, KeyRegistry, WorldKey};
pub use mesh::{CollisionBody, CollisionTriMesh, StaticMeshAsset, TriangleIndices};
pub use owner::{ContactEvent, WorldSimOwner};
pub use params::{
    BoxParams, CapsuleParams, CharacterParams, MeshTransform, PrimitiveParams, SphereParams,
};
pub use query::{HitResult, QueryFilters};
pub use shape_cache::ShapeCache;

/// Worlds are process-wide singletons, so tests that build one run one at a time.
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

//! Error types for world-sim construction and complex-mesh loading.
//!
//! Ordinary per-primitive failures (capacity exhaustion, malformed input, stale keys) are
//! not errors here: creation calls return `None` and updates return `false`. Only conditions
//! the caller must not ignore are surfaced through [`WorldSimError`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldSimError {
    /// Another world is already alive in this process.
    #[error("a physics world is already active in this process")]
    AlreadyActive,

    /// The physics worker pool could not be started.
    #[error("failed to start physics worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Rejected configuration value.
    #[error("invalid world configuration: {0}")]
    InvalidConfig(String),

    /// A complex mesh could not be scaled into the world.
    ///
    /// This points at corrupt transform data rather than ordinary runtime variance.
    #[error("complex mesh scale {scale:?} is degenerate")]
    MeshScale { scale: [f32; 3] },
}

pub type WorldSimResult<T> = std::result::Result<T, WorldSimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = WorldSimError::MeshScale {
            scale: [1.0, 0.0, 1.0],
        };
        assert!(format!("{err}").contains("degenerate"));

        let err = WorldSimError::InvalidConfig("delta_time must be positive".into());
        assert_eq!(
            format!("{err}"),
            "invalid world configuration: delta_time must be positive"
        );
    }
}

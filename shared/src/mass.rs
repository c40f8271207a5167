/// Discrete mass classes for simulated primitives.
///
/// Gameplay picks a class rather than a free-form mass so bodies interact in a predictable
/// way; the kernel derives inertia from the class mass and the body's shape.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MassCategory {
    /// Pickups, shell casings.
    Negligible,
    /// Debris, props.
    Light,
    /// Most characters and enemies.
    #[default]
    Medium,
    /// Large enemies, vehicles.
    Heavy,
    /// Things that should only ever be moved by script.
    Immovable,
}

impl MassCategory {
    /// Mass in kilograms.
    pub fn kilograms(self) -> f32 {
        match self {
            MassCategory::Negligible => 1.0,
            MassCategory::Light => 10.0,
            MassCategory::Medium => 80.0,
            MassCategory::Heavy => 400.0,
            MassCategory::Immovable => 10_000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_strictly_ordered() {
        let order = [
            MassCategory::Negligible,
            MassCategory::Light,
            MassCategory::Medium,
            MassCategory::Heavy,
            MassCategory::Immovable,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].kilograms() < pair[1].kilograms());
        }
    }
}

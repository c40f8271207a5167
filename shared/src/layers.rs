/*!
Collision layers and the motion policy derived from them.

The layer set is closed: every layer maps to exactly one motion type and one motion
quality, and to a fixed set of layers it may collide with. Adding a layer means
extending the matches below, which the compiler enforces.

Raw `u16` layer values arriving from outside the crate go through
[`motion_policy_for_raw_layer`], which asserts in debug builds and falls back to
Static/Discrete in release builds.
*/

/// Object layer of a physics primitive.
///
/// The numeric values are the raw layer ids used by content and gameplay data.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    NonMoving = 0,
    Moving = 1,
    Hitbox = 2,
    Projectile = 3,
    EnemyProjectile = 4,
    Enemy = 5,
    BonkFreeEnemy = 6,
    CastQuery = 7,
    CastQueryLevelGeometryOnly = 8,
    Debris = 9,
}

/// How the kernel moves a body.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MotionType {
    /// Never moves.
    Static,
    /// Fully simulated.
    Dynamic,
    /// Driven externally, unaffected by forces.
    Kinematic,
}

/// How the kernel detects collisions for a moving body.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MotionQuality {
    /// Checked once per step.
    Discrete,
    /// Continuous collision along the travel path (fast, thin movers).
    LinearCast,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MotionPolicy {
    pub motion_type: MotionType,
    pub quality: MotionQuality,
}

impl MotionPolicy {
    pub const STATIC: MotionPolicy = MotionPolicy {
        motion_type: MotionType::Static,
        quality: MotionQuality::Discrete,
    };
}

/// Bitset over [`Layer`], one bit per raw layer id.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);

    pub fn all() -> Self {
        Self::of(&Layer::ALL)
    }

    pub fn of(layers: &[Layer]) -> Self {
        LayerMask(layers.iter().fold(0, |acc, l| acc | l.bit()))
    }

    #[inline]
    pub fn contains(&self, layer: Layer) -> bool {
        self.0 & layer.bit() != 0
    }

    #[inline]
    pub fn with(self, layer: Layer) -> Self {
        LayerMask(self.0 | layer.bit())
    }

    #[inline]
    pub fn without(self, layer: Layer) -> Self {
        LayerMask(self.0 & !layer.bit())
    }
}

impl Layer {
    pub const ALL: [Layer; 10] = [
        Layer::NonMoving,
        Layer::Moving,
        Layer::Hitbox,
        Layer::Projectile,
        Layer::EnemyProjectile,
        Layer::Enemy,
        Layer::BonkFreeEnemy,
        Layer::CastQuery,
        Layer::CastQueryLevelGeometryOnly,
        Layer::Debris,
    ];

    /// Decode a raw layer id. Returns `None` for ids outside the closed set.
    pub fn from_raw(raw: u16) -> Option<Layer> {
        Layer::ALL.into_iter().find(|l| *l as u16 == raw)
    }

    #[inline]
    pub fn raw(self) -> u16 {
        self as u16
    }

    #[inline]
    pub fn bit(self) -> u32 {
        1u32 << (self as u16)
    }

    /// Motion type and quality for bodies on this layer.
    pub fn motion_policy(self) -> MotionPolicy {
        use MotionQuality::*;
        use MotionType::*;

        let (motion_type, quality) = match self {
            Layer::NonMoving => (Static, Discrete),
            Layer::Moving | Layer::Enemy | Layer::BonkFreeEnemy | Layer::Debris => {
                (Dynamic, Discrete)
            }
            Layer::Projectile | Layer::EnemyProjectile => (Kinematic, LinearCast),
            Layer::Hitbox | Layer::CastQuery | Layer::CastQueryLevelGeometryOnly => {
                (Kinematic, Discrete)
            }
        };
        MotionPolicy {
            motion_type,
            quality,
        }
    }

    /// Layers a body on this layer may collide with. The relation is symmetric.
    pub fn collides_with(self) -> LayerMask {
        use Layer::*;

        match self {
            NonMoving => LayerMask::all().without(NonMoving),
            Moving => LayerMask::of(&[
                NonMoving,
                Moving,
                Enemy,
                BonkFreeEnemy,
                EnemyProjectile,
                CastQuery,
                Debris,
            ]),
            Hitbox => LayerMask::of(&[NonMoving, Projectile, EnemyProjectile, CastQuery]),
            Projectile => LayerMask::of(&[NonMoving, Enemy, BonkFreeEnemy, Hitbox]),
            EnemyProjectile => LayerMask::of(&[NonMoving, Moving, Hitbox]),
            Enemy => LayerMask::of(&[NonMoving, Moving, Enemy, Projectile, CastQuery, Debris]),
            BonkFreeEnemy => LayerMask::of(&[NonMoving, Moving, Projectile, CastQuery]),
            CastQuery => LayerMask::of(&[NonMoving, Moving, Enemy, BonkFreeEnemy, Hitbox]),
            CastQueryLevelGeometryOnly => LayerMask::of(&[NonMoving]),
            Debris => LayerMask::of(&[NonMoving, Moving, Enemy, Debris]),
        }
    }

    #[inline]
    pub fn should_collide(self, other: Layer) -> bool {
        self.collides_with().contains(other)
    }
}

/// Motion policy for a raw layer id.
///
/// An id outside the closed set is a programming error: debug builds assert, release
/// builds fall back to Static/Discrete.
pub fn motion_policy_for_raw_layer(raw: u16) -> MotionPolicy {
    match Layer::from_raw(raw) {
        Some(layer) => layer.motion_policy(),
        None => {
            debug_assert!(false, "unmapped collision layer {raw}");
            MotionPolicy::STATIC
        }
    }
}

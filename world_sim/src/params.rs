/*!
Creation parameters for every primitive kind.

All positions, extents and rotations are in caller space; the factory converts them.
*/

use shared::{CallerQuat, CallerVec3, Layer, MassCategory};

use crate::mesh::StaticMeshAsset;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxParams {
    /// Body position. Snapped to the world grid on creation.
    pub point: CallerVec3,
    /// Collider offset relative to the body.
    pub offset: CallerVec3,
    pub half_extent: CallerVec3,
    pub rotation: CallerQuat,
    pub layer: Layer,
    pub is_sensor: bool,
    /// Simulate as Dynamic regardless of the layer's motion type.
    pub force_dynamic: bool,
    pub mass: MassCategory,
}

impl BoxParams {
    pub fn new(point: CallerVec3, half_extent: CallerVec3, layer: Layer) -> Self {
        Self {
            point,
            offset: CallerVec3::zeros(),
            half_extent,
            rotation: CallerQuat::identity(),
            layer,
            is_sensor: false,
            force_dynamic: false,
            mass: MassCategory::default(),
        }
    }

    #[must_use]
    pub fn sensor(mut self) -> Self {
        self.is_sensor = true;
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: CallerVec3) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn with_mass(mut self, mass: MassCategory) -> Self {
        self.mass = mass;
        self
    }

    #[must_use]
    pub fn force_dynamic(mut self) -> Self {
        self.force_dynamic = true;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereParams {
    pub point: CallerVec3,
    pub radius: f32,
    pub layer: Layer,
    pub is_sensor: bool,
    pub mass: MassCategory,
}

impl SphereParams {
    pub fn new(point: CallerVec3, radius: f32, layer: Layer) -> Self {
        Self {
            point,
            radius,
            layer,
            is_sensor: false,
            mass: MassCategory::default(),
        }
    }

    #[must_use]
    pub fn sensor(mut self) -> Self {
        self.is_sensor = true;
        self
    }
}

/// Upright capsule: `half_height` is half the length of the cylindrical section.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsuleParams {
    pub point: CallerVec3,
    /// Collider offset relative to the body.
    pub offset: CallerVec3,
    pub rotation: CallerQuat,
    pub half_height: f32,
    pub radius: f32,
    pub layer: Layer,
    pub is_sensor: bool,
    pub mass: MassCategory,
}

impl CapsuleParams {
    pub fn new(point: CallerVec3, half_height: f32, radius: f32, layer: Layer) -> Self {
        Self {
            point,
            offset: CallerVec3::zeros(),
            rotation: CallerQuat::identity(),
            half_height,
            radius,
            layer,
            is_sensor: false,
            mass: MassCategory::default(),
        }
    }

    #[must_use]
    pub fn with_offset(mut self, offset: CallerVec3) -> Self {
        self.offset = offset;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CharacterParams {
    /// Spawn position. A NaN or near-zero position spawns at the world origin.
    pub point: CallerVec3,
    /// Half the length of the capsule's cylindrical section.
    pub half_height: f32,
    pub radius: f32,
    /// Horizontal speed cap for locomotion (m/s).
    pub max_speed: f32,
    pub layer: Layer,
}

impl CharacterParams {
    pub fn new(point: CallerVec3, half_height: f32, radius: f32, max_speed: f32) -> Self {
        Self {
            point,
            half_height,
            radius,
            max_speed,
            layer: Layer::Moving,
        }
    }
}

/// Placement of a complex static mesh. Applied scale, then rotation, then translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshTransform {
    pub location: CallerVec3,
    pub rotation: CallerQuat,
    pub scale: CallerVec3,
}

impl Default for MeshTransform {
    fn default() -> Self {
        Self {
            location: CallerVec3::zeros(),
            rotation: CallerQuat::identity(),
            scale: CallerVec3::new(1.0, 1.0, 1.0),
        }
    }
}

/// Any primitive the factory can build.
#[derive(Clone, Copy, Debug)]
pub enum PrimitiveParams<'a> {
    Box(BoxParams),
    Sphere(SphereParams),
    Capsule(CapsuleParams),
    Character(CharacterParams),
    ComplexMesh {
        transform: MeshTransform,
        mesh: Option<&'a StaticMeshAsset>,
    },
}

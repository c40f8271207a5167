//! Conversions between the shared kernel-space types and rapier's math and filtering types.

use rapier3d::prelude::*;
use shared::{KernelQuat, KernelVec3, Layer, LayerMask, MotionType};

#[inline]
pub(crate) fn to_vector(v: KernelVec3) -> Vector<Real> {
    vector![v.0.x, v.0.y, v.0.z]
}

#[inline]
pub(crate) fn to_point(v: KernelVec3) -> Point<Real> {
    point![v.0.x, v.0.y, v.0.z]
}

#[inline]
pub(crate) fn from_vector(v: &Vector<Real>) -> KernelVec3 {
    KernelVec3::new(v.x, v.y, v.z)
}

#[inline]
pub(crate) fn from_point(p: &Point<Real>) -> KernelVec3 {
    KernelVec3::new(p.x, p.y, p.z)
}

/// Axis-angle form expected by rigid-body builders.
pub(crate) fn to_ang_vector(q: KernelQuat) -> AngVector<Real> {
    let axis = q.to_unit().scaled_axis();
    vector![axis.x, axis.y, axis.z]
}

pub(crate) fn from_rotation(r: &Rotation<Real>) -> KernelQuat {
    let q = r.quaternion();
    KernelQuat(nalgebra::Quaternion::new(q.w, q.i, q.j, q.k))
}

pub(crate) fn body_type(motion: MotionType) -> RigidBodyType {
    match motion {
        MotionType::Static => RigidBodyType::Fixed,
        MotionType::Dynamic => RigidBodyType::Dynamic,
        MotionType::Kinematic => RigidBodyType::KinematicPositionBased,
    }
}

/// Membership of a collider on `layer`, filtered by the layer collision table.
pub(crate) fn layer_groups(layer: Layer) -> InteractionGroups {
    InteractionGroups {
        memberships: Group::from_bits_truncate(layer.bit()),
        filter: Group::from_bits_truncate(layer.collides_with().0),
        ..InteractionGroups::all()
    }
}

/// Groups for a scene query that should only report colliders on `mask`.
pub(crate) fn query_groups(mask: LayerMask) -> InteractionGroups {
    InteractionGroups {
        memberships: Group::all(),
        filter: Group::from_bits_truncate(mask.0),
        ..InteractionGroups::all()
    }
}

/// Sensors must also detect kinematic and static bodies, not only dynamic ones.
pub(crate) fn sensor_collision_types() -> ActiveCollisionTypes {
    ActiveCollisionTypes::default()
        | ActiveCollisionTypes::KINEMATIC_FIXED
        | ActiveCollisionTypes::KINEMATIC_KINEMATIC
}

/*!
Caller-space and kernel-space coordinates.

Gameplay code works in a Z-up, left-handed frame. The physics kernel works in a
Y-up, right-handed frame. Both use the same unit, so a conversion is a pure axis
permutation (plus a sign flip of the quaternion vector part for rotations).
No arithmetic touches the values, which makes the pair an exact bijection:
`from_kernel_coordinates(to_kernel_coordinates(v))` reproduces every bit of `v`,
including `-0.0`, subnormals and NaN payloads.

The two frames get distinct newtypes so a raw caller vector can never be handed
to the kernel (or the reverse) without going through this module.
*/

use nalgebra as na;

use crate::constants::NEAR_ZERO_SQ;

/// A position, direction or extent in caller (gameplay) space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CallerVec3(pub na::Vector3<f32>);

/// A position, direction or extent in kernel (physics) space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KernelVec3(pub na::Vector3<f32>);

/// A rotation in caller space. Not required to be normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CallerQuat(pub na::Quaternion<f32>);

/// A rotation in kernel space. Not required to be normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KernelQuat(pub na::Quaternion<f32>);

impl CallerVec3 {
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self(na::Vector3::new(x, y, z))
    }

    #[inline]
    pub fn zeros() -> Self {
        Self(na::Vector3::zeros())
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.0.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.0.y
    }

    #[inline]
    pub fn z(&self) -> f32 {
        self.0.z
    }

    /// Snap every component to the nearest multiple of `grid`.
    ///
    /// Halfway values round up. A non-positive or non-finite grid leaves the vector untouched.
    pub fn grid_snap(self, grid: f32) -> Self {
        if !(grid.is_finite() && grid > 0.0) {
            return self;
        }
        Self(self.0.map(|c| ((c + grid * 0.5) / grid).floor() * grid))
    }

    /// Euclidean length.
    #[inline]
    pub fn length(&self) -> f32 {
        self.0.norm()
    }
}

impl std::ops::Sub for CallerVec3 {
    type Output = CallerVec3;

    fn sub(self, rhs: CallerVec3) -> CallerVec3 {
        CallerVec3(self.0 - rhs.0)
    }
}

impl KernelVec3 {
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self(na::Vector3::new(x, y, z))
    }

    #[inline]
    pub fn zeros() -> Self {
        Self(na::Vector3::zeros())
    }

    #[inline]
    pub fn is_near_zero(&self) -> bool {
        self.0.norm_squared() <= NEAR_ZERO_SQ
    }

    #[inline]
    pub fn is_nan(&self) -> bool {
        self.0.iter().any(|c| c.is_nan())
    }

    /// Smallest component (used to derive a box edge shrink from its half extent).
    #[inline]
    pub fn min_component(&self) -> f32 {
        self.0.min()
    }

    /// Components as a fixed array, for handing to the kernel.
    #[inline]
    pub fn to_array(&self) -> [f32; 3] {
        [self.0.x, self.0.y, self.0.z]
    }
}

impl CallerQuat {
    #[inline]
    pub fn identity() -> Self {
        Self(na::Quaternion::identity())
    }

    /// Build from `(x, y, z, w)` components.
    #[inline]
    pub fn from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self(na::Quaternion::new(w, x, y, z))
    }
}

impl Default for CallerQuat {
    fn default() -> Self {
        Self::identity()
    }
}

impl KernelQuat {
    #[inline]
    pub fn identity() -> Self {
        Self(na::Quaternion::identity())
    }

    /// Normalized form for the kernel. Degenerate (zero or non-finite) rotations become identity.
    pub fn to_unit(&self) -> na::UnitQuaternion<f32> {
        let norm = self.0.norm();
        if norm.is_finite() && norm > 0.0 {
            na::UnitQuaternion::from_quaternion(self.0)
        } else {
            na::UnitQuaternion::identity()
        }
    }
}

/// Caller (Z-up, left-handed) to kernel (Y-up, right-handed): `(x, y, z) -> (x, z, y)`.
#[inline]
pub fn to_kernel_coordinates(v: CallerVec3) -> KernelVec3 {
    KernelVec3(na::Vector3::new(v.0.x, v.0.z, v.0.y))
}

/// Kernel to caller: `(x, y, z) -> (x, z, y)`.
#[inline]
pub fn from_kernel_coordinates(v: KernelVec3) -> CallerVec3 {
    CallerVec3(na::Vector3::new(v.0.x, v.0.z, v.0.y))
}

/// Rotations cross a handedness change, so the axis is permuted and negated.
#[inline]
pub fn to_kernel_rotation(q: CallerQuat) -> KernelQuat {
    let q = q.0;
    KernelQuat(na::Quaternion::new(q.w, -q.i, -q.k, -q.j))
}

#[inline]
pub fn from_kernel_rotation(q: KernelQuat) -> CallerQuat {
    let q = q.0;
    CallerQuat(na::Quaternion::new(q.w, -q.i, -q.k, -q.j))
}

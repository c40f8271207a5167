//! Deduplicated collision shapes.
//!
//! Primitives with identical geometry share one kernel shape. The cache is keyed on the
//! exact bit pattern of every dimension that goes into the shape, so two requests hit the
//! same entry only when they would have built identical shapes.

use std::collections::HashMap;

use rapier3d::prelude::SharedShape;
use shared::KernelVec3;
use shared::constants::MAX_CONVEX_RADIUS;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum ShapeKey {
    Box {
        half_extent: [u32; 3],
        convex_radius: u32,
    },
    Capsule {
        half_height: u32,
        radius: u32,
    },
}

#[derive(Default)]
pub struct ShapeCache {
    shapes: HashMap<ShapeKey, SharedShape>,
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Box with the given kernel-space half extent and rounded edges.
    ///
    /// The convex radius is half of `edge_shrink`, capped at [`MAX_CONVEX_RADIUS`] and at
    /// the smallest half extent. Faces stay at the requested half extent; only edges and
    /// corners are rounded.
    pub fn get_or_create_box_shape(&mut self, half_extent: KernelVec3, edge_shrink: f32) -> SharedShape {
        let convex_radius = (edge_shrink * 0.5)
            .min(MAX_CONVEX_RADIUS)
            .min(half_extent.min_component())
            .max(0.0);
        let he = half_extent.to_array();
        let key = ShapeKey::Box {
            half_extent: he.map(f32::to_bits),
            convex_radius: convex_radius.to_bits(),
        };

        self.shapes
            .entry(key)
            .or_insert_with(|| {
                log::trace!("shape cache miss: box {he:?} r={convex_radius}");
                if convex_radius > 0.0 {
                    SharedShape::round_cuboid(
                        he[0] - convex_radius,
                        he[1] - convex_radius,
                        he[2] - convex_radius,
                        convex_radius,
                    )
                } else {
                    SharedShape::cuboid(he[0], he[1], he[2])
                }
            })
            .clone()
    }

    /// Kernel-up (Y) capsule.
    pub fn get_or_create_capsule_shape(&mut self, half_height: f32, radius: f32) -> SharedShape {
        let key = ShapeKey::Capsule {
            half_height: half_height.to_bits(),
            radius: radius.to_bits(),
        };
        self.shapes
            .entry(key)
            .or_insert_with(|| SharedShape::capsule_y(half_height, radius))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

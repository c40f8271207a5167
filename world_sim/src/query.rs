/*!
Scene queries: ray cast, sphere cast and sphere overlap search.

Queries are read-only against the broad phase as of the last `step()` or
`optimize_broad_phase()`. Inputs and outputs are caller space.

Every hit result starts out as [`HitResult::invalid`], so a miss is distinguishable from
a hit at distance zero by `blocking_hit` and `my_item`.
*/

use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::prelude::*;
use shared::{CallerVec3, LayerMask, from_kernel_coordinates, to_kernel_coordinates};

use crate::clock::PhysicsSystem;
use crate::kernel::{from_point, from_vector, query_groups, to_point, to_vector};
use crate::key::{BodyId, KeyRegistry, WorldKey};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitResult {
    pub blocking_hit: bool,
    /// Body id of the hit body as a signed item, `-1` when nothing was hit.
    pub my_item: i32,
    /// Point of contact. Same as `impact_point` for both rays and sphere casts.
    pub location: CallerVec3,
    pub impact_point: CallerVec3,
    pub impact_normal: CallerVec3,
    /// Distance from the query origin to the impact point.
    pub distance: f32,
}

impl HitResult {
    pub fn invalid() -> Self {
        Self {
            blocking_hit: false,
            my_item: BodyId::INVALID.as_item(),
            location: CallerVec3::zeros(),
            impact_point: CallerVec3::zeros(),
            impact_normal: CallerVec3::zeros(),
            distance: 0.0,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.blocking_hit && self.my_item != BodyId::INVALID.as_item()
    }

    pub fn body_id(&self) -> Option<BodyId> {
        self.is_hit().then_some(BodyId(self.my_item as u32))
    }
}

impl Default for HitResult {
    fn default() -> Self {
        Self::invalid()
    }
}

/// Which bodies a query may report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueryFilters {
    /// Layers the query sees.
    pub layers: LayerMask,
    /// Body to skip, typically the caster itself.
    pub ignore: Option<WorldKey>,
    pub include_sensors: bool,
}

impl Default for QueryFilters {
    fn default() -> Self {
        Self {
            layers: LayerMask::all(),
            ignore: None,
            include_sensors: false,
        }
    }
}

impl QueryFilters {
    pub fn layers(layers: LayerMask) -> Self {
        Self {
            layers,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn ignoring(mut self, key: WorldKey) -> Self {
        self.ignore = Some(key);
        self
    }

    fn to_kernel<'a>(&self, keys: &KeyRegistry) -> QueryFilter<'a> {
        let mut filter = QueryFilter::default().groups(query_groups(self.layers));
        if !self.include_sensors {
            filter = filter.exclude_sensors();
        }
        if let Some(handle) = self.ignore.and_then(|k| keys.resolve(k)) {
            filter = filter.exclude_rigid_body(handle);
        }
        filter
    }
}

fn body_of(physics: &PhysicsSystem, collider: ColliderHandle) -> Option<BodyId> {
    physics
        .colliders
        .get(collider)
        .and_then(|c| c.parent())
        .map(BodyId::from_handle)
}

/// Ray from `origin` along `direction`. The direction's length is the query distance.
pub fn cast_ray(
    physics: &PhysicsSystem,
    keys: &KeyRegistry,
    origin: CallerVec3,
    direction: CallerVec3,
    filters: &QueryFilters,
) -> HitResult {
    let mut result = HitResult::invalid();

    let ray = Ray::new(
        to_point(to_kernel_coordinates(origin)),
        to_vector(to_kernel_coordinates(direction)),
    );
    let query = physics.query_pipeline(filters.to_kernel(keys));
    let Some((collider, hit)) = query.cast_ray_and_get_normal(&ray, 1.0, true) else {
        return result;
    };
    let Some(body) = body_of(physics, collider) else {
        return result;
    };

    let point = from_kernel_coordinates(from_point(&ray.point_at(hit.time_of_impact)));
    result.blocking_hit = true;
    result.my_item = body.as_item();
    result.location = point;
    result.impact_point = point;
    result.impact_normal = from_kernel_coordinates(from_vector(&hit.normal));
    result.distance = (point - origin).length();
    result
}

/// Sweep a sphere of `radius` from `origin` along `direction` for `distance`.
///
/// A sphere that starts inside a body reports that body at the deepest point of
/// penetration. The reported distance runs from `origin` to the contact point, so it
/// includes the sphere's radius.
pub fn sphere_cast(
    physics: &PhysicsSystem,
    keys: &KeyRegistry,
    origin: CallerVec3,
    direction: CallerVec3,
    radius: f32,
    distance: f32,
    filters: &QueryFilters,
) -> HitResult {
    let mut result = HitResult::invalid();
    if !(radius.is_finite() && radius > 0.0 && distance.is_finite() && distance >= 0.0) {
        return result;
    }

    let start = to_kernel_coordinates(origin);
    let dir = to_kernel_coordinates(direction).0.try_normalize(f32::EPSILON);
    let Some(dir) = dir else {
        return result;
    };
    let velocity = vector![dir.x, dir.y, dir.z] * distance;
    let shape_pos = Isometry::translation(start.0.x, start.0.y, start.0.z);
    let ball = Ball::new(radius);

    let mut options = ShapeCastOptions::with_max_time_of_impact(1.0);
    options.stop_at_penetration = true;
    options.compute_impact_geometry_on_penetration = true;

    let query = physics.query_pipeline(filters.to_kernel(keys));
    let Some((collider, hit)) = query.cast_shape(&shape_pos, &velocity, &ball, options) else {
        return result;
    };
    let Some(body) = body_of(physics, collider) else {
        return result;
    };

    // The ball never rotates, so its local normal is also the world direction to the contact.
    let center = shape_pos.translation.vector + velocity * hit.time_of_impact;
    let normal = hit.normal2.into_inner();
    let contact = center + normal * radius;

    let contact = from_kernel_coordinates(from_vector(&contact));
    result.blocking_hit = true;
    result.my_item = body.as_item();
    result.location = contact;
    result.impact_point = contact;
    result.impact_normal = from_kernel_coordinates(from_vector(&(-normal)));
    result.distance = (contact - origin).length();
    result
}

/// Ids of every body overlapping a sphere, in ascending id order.
pub fn sphere_search(
    physics: &PhysicsSystem,
    keys: &KeyRegistry,
    origin: CallerVec3,
    radius: f32,
    filters: &QueryFilters,
) -> Vec<BodyId> {
    if !(radius.is_finite() && radius > 0.0) {
        return Vec::new();
    }
    let center = to_kernel_coordinates(origin);
    let shape_pos = Isometry::translation(center.0.x, center.0.y, center.0.z);
    let ball = Ball::new(radius);

    let query = physics.query_pipeline(filters.to_kernel(keys));
    let mut found: Vec<BodyId> = query
        .intersect_shape(shape_pos, &ball)
        .filter_map(|(_, collider)| collider.parent())
        .map(BodyId::from_handle)
        .collect();
    found.sort_unstable();
    found.dedup();
    found
}

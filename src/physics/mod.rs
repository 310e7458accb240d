//! Host-side physics seams and a minimal box-collider implementation.
//!
//! The locomotion controller and the screen raycasts only ever talk to the
//! [`Raycaster`] and [`PhysicsBody`] traits. The concrete types in this
//! module (axis-aligned [`Collider`] boxes, [`KinematicBody`] integration)
//! are just enough of a host for the demo scene to stand on.
//!
//! # Example
//!
//! ```
//! use bevy::prelude::{Entity, Vec3};
//! use stride::physics::{Collider, LayerMask, Raycaster, StaticColliders};
//!
//! let mut world = StaticColliders::default();
//! world.push(
//!     Entity::from_raw(1),
//!     Vec3::new(0.0, -0.5, 0.0),
//!     Collider::cuboid(Vec3::new(10.0, 1.0, 10.0), LayerMask::GROUND),
//! );
//! let hit = world
//!     .cast_ray(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y, 2.0, LayerMask::GROUND)
//!     .unwrap();
//! assert!(hit.is_some());
//! ```
pub mod scene;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;
use thiserror::Error;

pub use scene::*;

/// Bit set of collision layers used to filter queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const GROUND: Self = Self(1 << 0);
    pub const PLAYER: Self = Self(1 << 1);
    pub const TARGET: Self = Self(1 << 2);
    pub const OBSTACLE: Self = Self(1 << 3);
    pub const HAZARD: Self = Self(1 << 4);
    pub const ALL: Self = Self(u32::MAX);

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Failure of a physics query. These point at a misconfigured caller, not
/// at the scene, so they are reported instead of being read as "no hit".
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum QueryError {
    #[error("raycast issued with an empty layer mask")]
    EmptyLayerMask,

    #[error("raycast direction is zero or not finite")]
    InvalidDirection,

    #[error("raycast distance must be finite and non-negative (got {0})")]
    InvalidDistance(f32),
}

/// Closest intersection found by a raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    pub point: Vec3,
    pub distance: f32,
}

/// Scene query used for ground probes, screen-centre rays and camera
/// obstruction checks.
pub trait Raycaster {
    /// Cast a ray and return the closest hit within `max_distance` whose
    /// collider layers intersect `mask`.
    ///
    /// # Errors
    /// Returns a [`QueryError`] when the mask is empty, the direction is
    /// degenerate or the distance is not a finite non-negative number.
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Result<Option<RayHit>, QueryError>;
}

/// Velocity accessor of the body a controller drives.
pub trait PhysicsBody {
    /// Reference point of the body (its centre), used as the ground-probe origin.
    fn position(&self) -> Vec3;
    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);
}

/// Axis-aligned box collider centred on the entity's translation.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub half_extents: Vec3,
    pub layers: LayerMask,
}

impl Collider {
    #[must_use]
    pub fn cuboid(size: Vec3, layers: LayerMask) -> Self {
        Self { half_extents: size * 0.5, layers }
    }

    /// World-space `(min, max)` corners for a collider centred at `center`.
    #[must_use]
    pub fn bounds(&self, center: Vec3) -> (Vec3, Vec3) {
        (center - self.half_extents, center + self.half_extents)
    }
}

/// Body moved by [`integrate_bodies`]. Static colliders are entities with a
/// [`Collider`] and no `KinematicBody`.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct KinematicBody {
    /// World units per second.
    pub velocity: Vec3,
    /// Static layers this body is pushed out of.
    pub collision_mask: LayerMask,
}

/// Distance along a unit `direction` at which the ray enters the box, or
/// `None` if it misses. A ray starting inside the box reports `0.0`.
#[must_use]
pub fn ray_aabb(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_enter = 0.0_f32;
    let mut t_exit = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < f32::EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    Some(t_enter)
}

/// Raycast against any set of `(entity, centre, collider)` triples.
///
/// Shared by the ECS-backed [`SceneColliders`] and the plain
/// [`StaticColliders`] list so both report identical hits.
///
/// # Errors
/// See [`Raycaster::cast_ray`].
pub fn cast_ray_against<I>(
    colliders: I,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    mask: LayerMask,
) -> Result<Option<RayHit>, QueryError>
where
    I: IntoIterator<Item = (Entity, Vec3, Collider)>,
{
    if mask.is_empty() {
        return Err(QueryError::EmptyLayerMask);
    }
    if !max_distance.is_finite() || max_distance < 0.0 {
        return Err(QueryError::InvalidDistance(max_distance));
    }
    let dir = direction.normalize_or_zero();
    if dir == Vec3::ZERO || !dir.is_finite() {
        return Err(QueryError::InvalidDirection);
    }

    let mut closest: Option<RayHit> = None;
    for (entity, center, collider) in colliders {
        if !collider.layers.intersects(mask) {
            continue;
        }
        let (min, max) = collider.bounds(center);
        let Some(t) = ray_aabb(origin, dir, min, max) else { continue };
        if t > max_distance {
            continue;
        }
        if closest.is_none_or(|c| t < c.distance) {
            closest = Some(RayHit { entity, point: origin + dir * t, distance: t });
        }
    }
    Ok(closest)
}

/// Smallest translation that moves box `a` out of box `b`, or `None` if
/// they do not overlap. Touching faces do not count as overlap.
#[must_use]
pub fn penetration(a_center: Vec3, a_half: Vec3, b_center: Vec3, b_half: Vec3) -> Option<Vec3> {
    let delta = a_center - b_center;
    let overlap = (a_half + b_half) - delta.abs();
    if overlap.x <= 0.0 || overlap.y <= 0.0 || overlap.z <= 0.0 {
        return None;
    }

    let push = if overlap.x < overlap.y && overlap.x < overlap.z {
        Vec3::X * overlap.x * delta.x.signum()
    } else if overlap.y <= overlap.z {
        Vec3::Y * overlap.y * delta.y.signum()
    } else {
        Vec3::Z * overlap.z * delta.z.signum()
    };
    Some(push)
}

/// A plain list of colliders, for callers that have no ECS world at hand.
#[derive(Debug, Clone, Default)]
pub struct StaticColliders {
    entries: Vec<(Entity, Vec3, Collider)>,
}

impl StaticColliders {
    pub fn push(&mut self, entity: Entity, center: Vec3, collider: Collider) {
        self.entries.push((entity, center, collider));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Raycaster for StaticColliders {
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Result<Option<RayHit>, QueryError> {
        cast_ray_against(self.entries.iter().copied(), origin, direction, max_distance, mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_world() -> StaticColliders {
        let mut world = StaticColliders::default();
        world.push(
            Entity::from_raw(1),
            Vec3::new(0.0, -0.5, 0.0),
            Collider::cuboid(Vec3::new(20.0, 1.0, 20.0), LayerMask::GROUND),
        );
        world.push(
            Entity::from_raw(2),
            Vec3::new(0.0, 1.0, -5.0),
            Collider::cuboid(Vec3::splat(2.0), LayerMask::TARGET),
        );
        world
    }

    #[test]
    fn ray_hits_box_face_at_expected_distance() {
        let t = ray_aabb(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y, Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(t, Some(2.0));
    }

    #[test]
    fn ray_parallel_outside_slab_misses() {
        let t = ray_aabb(Vec3::new(0.0, 3.0, 0.0), Vec3::X, Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(t, None);
    }

    #[test]
    fn ray_starting_inside_reports_zero() {
        let t = ray_aabb(Vec3::ZERO, Vec3::Z, Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(t, Some(0.0));
    }

    #[test]
    fn cast_respects_layer_mask_and_distance() {
        let world = floor_world();
        let origin = Vec3::new(0.0, 1.0, 0.0);

        let ground = world.cast_ray(origin, Vec3::NEG_Y, 1.01, LayerMask::GROUND).unwrap();
        assert_eq!(ground.map(|h| h.entity), Some(Entity::from_raw(1)));

        let too_short = world.cast_ray(origin, Vec3::NEG_Y, 0.5, LayerMask::GROUND).unwrap();
        assert!(too_short.is_none());

        let filtered = world.cast_ray(origin, Vec3::NEG_Y, 5.0, LayerMask::TARGET).unwrap();
        assert!(filtered.is_none());

        let target = world.cast_ray(origin, Vec3::NEG_Z, 10.0, LayerMask::ALL).unwrap().unwrap();
        assert_eq!(target.entity, Entity::from_raw(2));
        assert!((target.distance - 4.0).abs() < 1e-5);
        assert!((target.point - Vec3::new(0.0, 1.0, -4.0)).length() < 1e-5);
    }

    #[test]
    fn cast_returns_closest_hit() {
        let mut world = floor_world();
        world.push(
            Entity::from_raw(3),
            Vec3::new(0.0, 1.0, -2.5),
            Collider::cuboid(Vec3::splat(1.0), LayerMask::OBSTACLE),
        );
        let hit = world
            .cast_ray(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z, 10.0, LayerMask::ALL)
            .unwrap()
            .unwrap();
        assert_eq!(hit.entity, Entity::from_raw(3));
    }

    #[test]
    fn invalid_queries_are_reported() {
        let world = floor_world();
        assert_eq!(
            world.cast_ray(Vec3::ZERO, Vec3::NEG_Y, 1.0, LayerMask::NONE),
            Err(QueryError::EmptyLayerMask)
        );
        assert_eq!(
            world.cast_ray(Vec3::ZERO, Vec3::ZERO, 1.0, LayerMask::GROUND),
            Err(QueryError::InvalidDirection)
        );
        assert!(matches!(
            world.cast_ray(Vec3::ZERO, Vec3::NEG_Y, -1.0, LayerMask::GROUND),
            Err(QueryError::InvalidDistance(_))
        ));
    }

    #[test]
    fn penetration_pushes_along_shallowest_axis() {
        // box sunk 0.1 into the top of a wide floor
        let push = penetration(
            Vec3::new(0.0, 0.8, 0.0),
            Vec3::new(0.4, 0.9, 0.4),
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(10.0, 0.5, 10.0),
        )
        .unwrap();
        assert!((push - Vec3::new(0.0, 0.1, 0.0)).length() < 1e-5);

        // resting exactly on the surface is not an overlap
        assert!(penetration(
            Vec3::new(0.0, 0.9, 0.0),
            Vec3::new(0.4, 0.9, 0.4),
            Vec3::new(0.0, -0.9, 0.0),
            Vec3::new(10.0, 0.9, 10.0),
        )
        .is_none());
    }

    #[test]
    fn layer_masks_combine() {
        let mask = LayerMask::GROUND | LayerMask::OBSTACLE;
        assert!(mask.intersects(LayerMask::GROUND));
        assert!(!mask.intersects(LayerMask::PLAYER));
        assert!(LayerMask::NONE.is_empty());
    }
}

//! Raycast from the centre of the active camera.
use bevy::prelude::*;

use crate::camera::CameraFacing;
use crate::error::{require_positive, ConfigError};
use crate::physics::{LayerMask, QueryError, RayHit, Raycaster};

/// Range and layers of a screen-centre ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRay {
    max_distance: f32,
    hit_mask: LayerMask,
}

/// Result of [`ScreenRay::try_to_hit`].
///
/// `point` is the hit point, or the far end of the ray on a miss, so
/// effects always have somewhere to go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenHit {
    pub origin: Vec3,
    pub hit: Option<RayHit>,
    pub point: Vec3,
}

impl ScreenRay {
    /// # Errors
    /// `max_distance` must be finite and positive.
    pub fn new(max_distance: f32, hit_mask: LayerMask) -> Result<Self, ConfigError> {
        Ok(Self { max_distance: require_positive("ray max distance", max_distance)?, hit_mask })
    }

    #[must_use]
    pub fn max_distance(&self) -> f32 { self.max_distance }
    #[must_use]
    pub fn hit_mask(&self) -> LayerMask { self.hit_mask }

    /// Cast along the facing's forward direction.
    ///
    /// # Errors
    /// Whatever the raycaster reports (e.g. an empty hit mask).
    pub fn try_to_hit<R: Raycaster + ?Sized>(&self, facing: &CameraFacing, world: &R) -> Result<ScreenHit, QueryError> {
        let origin = facing.position;
        let direction = facing.forward();
        let hit = world.cast_ray(origin, direction, self.max_distance, self.hit_mask)?;
        let point = hit.map_or(origin + direction * self.max_distance, |h| h.point);
        Ok(ScreenHit { origin, hit, point })
    }
}

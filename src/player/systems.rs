//! Bevy systems driving the locomotion controller.
//!
//! `player_locomotion` is a thin wrapper: it builds the collaborators from
//! ECS data and hands them to [`LocomotionController::update`], which holds
//! all of the movement rules.

use bevy::prelude::*;

use crate::camera::ActiveCamera;
use crate::physics::{Collider, KinematicBody, PhysicsBody, SceneColliders};
use crate::player::{FrameInput, LocomotionController, LocomotionError, Player};
use crate::settings::Settings;

/// Borrowed view of a kinematic body for one tick.
pub struct BodyHandle<'a> {
    position: Vec3,
    body: &'a mut KinematicBody,
}

impl<'a> BodyHandle<'a> {
    pub fn new(position: Vec3, body: &'a mut KinematicBody) -> Self {
        Self { position, body }
    }
}

impl PhysicsBody for BodyHandle<'_> {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.body.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.body.velocity = velocity;
    }
}

/// Run one locomotion tick for every player.
///
/// Must run after the camera facings are synced and before
/// `integrate_bodies` moves the bodies.
#[allow(clippy::needless_pass_by_value)]
pub fn player_locomotion(
    time: Res<Time>,
    input: Res<FrameInput>,
    camera: Res<ActiveCamera>,
    scene: SceneColliders,
    mut players: Query<(Entity, &Transform, &mut KinematicBody, &mut LocomotionController), With<Player>>,
) {
    let dt = time.delta_seconds();
    for (entity, tf, mut body, mut controller) in &mut players {
        if controller.is_halted() {
            continue;
        }
        let before = controller.state();
        let mut handle = BodyHandle::new(tf.translation, &mut body);
        match controller.update(dt, *input, &*camera, &mut handle, &scene) {
            Ok(after) if after != before => {
                debug!("player {entity:?}: {} -> {}", before.label(), after.label());
            }
            Ok(_) => {}
            Err(e @ LocomotionError::GroundQuery(_)) => {
                error!("player {entity:?} locomotion halted: {e}");
            }
            Err(e) => warn!("player {entity:?} skipped a locomotion tick: {e}"),
        }
    }
}

/// Push reloaded movement settings into every player.
///
/// The body collider is resized with the half height so the ground probe
/// always ends just below the collider's base. A reload that does not
/// validate leaves the old configuration in place.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_movement_settings(
    settings: Res<Settings>,
    mut players: Query<(&mut LocomotionController, Option<&mut Collider>), With<Player>>,
) {
    if !settings.is_changed() {
        return;
    }
    match settings.movement.to_config() {
        Ok(config) => {
            for (mut controller, collider) in &mut players {
                if *controller.config() != config {
                    controller.set_config(config);
                }
                if let Some(mut collider) = collider
                    && collider.half_extents.y != config.half_height()
                {
                    collider.half_extents.y = config.half_height();
                }
            }
        }
        Err(e) => error!("movement settings rejected, keeping previous values: {e}"),
    }
}

//! Hitscan gun fired from the screen centre, with a short-lived tracer line.
use bevy::prelude::*;

use crate::camera::{ActiveCamera, CameraDirectionProvider};
use crate::combat::{deal_damage, DamageSource, DeathEvent, Health};
use crate::input::PlayerAction;
use crate::interaction::ScreenRay;
use crate::physics::SceneColliders;
use crate::player::Player;

/// Muzzle position relative to the player, in the player's heading frame.
pub const MUZZLE_OFFSET: Vec3 = Vec3::new(0.3, 0.4, -0.5);

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Gun {
    pub ray: ScreenRay,
    pub damage: DamageSource,
    pub tracer_seconds: f32,
}

/// Line drawn from the muzzle to where the last shot landed.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Tracer {
    pub from: Vec3,
    pub to: Vec3,
    pub remaining: f32,
}

impl Tracer {
    /// Show the line for `seconds`, restarting any line still visible.
    pub fn play(&mut self, from: Vec3, to: Vec3, seconds: f32) {
        self.from = from;
        self.to = to;
        self.remaining = seconds;
    }

    pub fn tick(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.remaining > 0.0
    }
}

/// Fire every `Shoot` action this frame.
///
/// A shot that lands on an entity with `Health` damages it; the tracer
/// plays whether or not anything was hit.
#[allow(clippy::needless_pass_by_value)]
pub fn fire_weapon(
    time: Res<Time>,
    mut actions: EventReader<PlayerAction>,
    camera: Res<ActiveCamera>,
    scene: SceneColliders,
    mut shooters: Query<(&Transform, &Gun, &mut Tracer), With<Player>>,
    mut targets: Query<&mut Health>,
    mut deaths: EventWriter<DeathEvent>,
) {
    let shots = actions.read().filter(|a| **a == PlayerAction::Shoot).count();
    if shots == 0 {
        return;
    }
    let facing = camera.active_facing();
    let dt = time.delta_seconds();

    for (tf, gun, mut tracer) in &mut shooters {
        let muzzle = tf.translation + facing.heading() * MUZZLE_OFFSET;
        for _ in 0..shots {
            let shot = match gun.ray.try_to_hit(&facing, &scene) {
                Ok(shot) => shot,
                Err(e) => {
                    warn!("shot query failed: {e}");
                    continue;
                }
            };
            if let Some(hit) = shot.hit
                && let Ok(mut health) = targets.get_mut(hit.entity)
            {
                deal_damage(hit.entity, &mut health, gun.damage.amount(dt), &mut deaths);
            }
            tracer.play(muzzle, shot.point, gun.tracer_seconds);
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn tick_tracers(time: Res<Time>, mut tracers: Query<&mut Tracer>) {
    let dt = time.delta_seconds();
    for mut tracer in &mut tracers {
        if tracer.is_visible() {
            tracer.tick(dt);
        }
    }
}

pub fn draw_tracers(mut gizmos: Gizmos, tracers: Query<&Tracer>) {
    for tracer in &tracers {
        if tracer.is_visible() {
            gizmos.line(tracer.from, tracer.to, Color::srgb(1.0, 0.85, 0.3));
        }
    }
}

//! Camera systems: mouse look, rig follow, activation and cursor grab.
//!
//! Order within a frame: `camera_look` → `follow_first_person` /
//! `follow_third_person` → `sync_camera_facings`. Movement reads the
//! facing only after the sync, so it always sees this frame's camera.

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

use crate::camera::{ActiveCamera, CameraFacing, CameraMode, CameraRig, FirstPersonRig, LookAngles, ThirdPersonRig};
use crate::input::{InputBindings, PlayerAction};
use crate::physics::{Collider, Raycaster, SceneColliders};
use crate::player::Player;
use crate::settings::{ControlsSettings, Settings};

/// Apply the inversion flags to a raw mouse delta.
#[must_use]
pub fn look_delta(raw: Vec2, controls: &ControlsSettings) -> Vec2 {
    let mut axis = raw;
    if controls.invert_x {
        axis.x = -axis.x;
    }
    if controls.invert_y {
        axis.y = -axis.y;
    }
    axis
}

/// Feed this frame's mouse motion into both rigs.
///
/// Ignored while the cursor is visible (released with the pause key).
#[allow(clippy::needless_pass_by_value)]
pub fn camera_look(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut motion: EventReader<MouseMotion>,
    settings: Res<Settings>,
    mut first: Query<&mut FirstPersonRig>,
    mut third: Query<&mut ThirdPersonRig>,
) {
    let raw: Vec2 = motion.read().map(|ev| ev.delta).sum();
    if raw == Vec2::ZERO {
        return;
    }
    if windows.get_single().is_ok_and(|w| w.cursor.visible) {
        return;
    }

    let delta = look_delta(raw, &settings.controls);
    for mut rig in &mut first {
        rig.look.apply_delta(delta);
    }
    for mut rig in &mut third {
        rig.look.apply_delta(delta);
    }
}

/// Place the first-person camera at the player's eyes.
pub fn follow_first_person(
    players: Query<&Transform, (With<Player>, Without<FirstPersonRig>)>,
    mut rigs: Query<(&FirstPersonRig, &mut Transform), Without<Player>>,
) {
    let Ok(player) = players.get_single() else { return };
    for (rig, mut tf) in &mut rigs {
        *tf = rig.camera_transform(player.translation);
    }
}

/// Swing the third-person boom around the player and pull it in front of
/// anything on the rig's avoid mask.
#[allow(clippy::needless_pass_by_value)]
pub fn follow_third_person(
    time: Res<Time>,
    scene: SceneColliders,
    players: Query<&Transform, (With<Player>, Without<ThirdPersonRig>)>,
    mut rigs: Query<(&mut ThirdPersonRig, &mut Transform), (Without<Player>, Without<Collider>)>,
) {
    let Ok(player) = players.get_single() else { return };
    let anchor = player.translation;
    let dt = time.delta_seconds();

    for (mut rig, mut tf) in &mut rigs {
        let obstacle = match scene.cast_ray(anchor, rig.boom_direction(), rig.ideal_distance, rig.avoid_mask) {
            Ok(hit) => hit.map(|h| h.distance),
            Err(e) => {
                warn!("third person boom query failed: {e}");
                None
            }
        };
        rig.update_zoom(obstacle, dt);
        *tf = rig.camera_transform(anchor);
    }
}

/// Copy each rig's transform into the selector so movement sees this
/// frame's facing.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_camera_facings(mut active: ResMut<ActiveCamera>, cameras: Query<&Transform, With<Camera>>) {
    for mode in [CameraMode::FirstPerson, CameraMode::ThirdPerson] {
        let handle = active.0.rig_mut(mode);
        if let Ok(tf) = cameras.get(handle.entity) {
            handle.facing = CameraFacing::from_transform(tf);
        }
    }
}

/// Mirror the selector's enabled flags onto the Bevy cameras.
#[allow(clippy::needless_pass_by_value)]
pub fn apply_camera_activation(active: Res<ActiveCamera>, mut cameras: Query<&mut Camera>) {
    for mode in [CameraMode::FirstPerson, CameraMode::ThirdPerson] {
        let handle = active.0.rig(mode);
        if let Ok(mut camera) = cameras.get_mut(handle.entity) {
            let enabled = handle.is_enabled();
            if camera.is_active != enabled {
                camera.is_active = enabled;
            }
        }
    }
}

/// Camera switching actions.
pub fn handle_camera_actions(mut actions: EventReader<PlayerAction>, mut active: ResMut<ActiveCamera>) {
    for action in actions.read() {
        let next = match action {
            PlayerAction::FirstPersonCamera => CameraMode::FirstPerson,
            PlayerAction::ThirdPersonCamera => CameraMode::ThirdPerson,
            PlayerAction::ToggleCamera => active.0.mode().toggled(),
            _ => continue,
        };
        if active.0.mode() != next {
            info!("camera: {}", next.label());
        }
        active.0.select(next);
    }
}

/// Apply reloaded look and boom tuning. Current yaw, pitch (re-clamped)
/// and boom length carry over so the view does not jump.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_rig_settings(
    settings: Res<Settings>,
    mut first: Query<&mut FirstPersonRig>,
    mut third: Query<&mut ThirdPersonRig>,
) {
    if !settings.is_changed() {
        return;
    }
    let (fp, tp) = match (
        settings.camera.first_person_rig(&settings.controls),
        settings.camera.third_person_rig(&settings.controls),
    ) {
        (Ok(fp), Ok(tp)) => (fp, tp),
        (Err(e), _) | (_, Err(e)) => {
            error!("camera settings rejected, keeping previous values: {e}");
            return;
        }
    };
    for mut rig in &mut first {
        let look = carry_look(rig.look, fp.look);
        *rig = FirstPersonRig { look, ..fp };
    }
    for mut rig in &mut third {
        let look = carry_look(rig.look, tp.look);
        *rig = ThirdPersonRig { look, current_distance: rig.current_distance.min(tp.ideal_distance), ..tp };
    }
}

fn carry_look(old: LookAngles, mut new: LookAngles) -> LookAngles {
    new.yaw = old.yaw;
    new.pitch = old.pitch.clamp(new.pitch_min, new.pitch_max);
    new
}

/// Lock and hide the cursor for a window.
pub fn grab_cursor(window: &mut Window) {
    window.cursor.grab_mode = CursorGrabMode::Locked;
    window.cursor.visible = false;
}

/// Toggle cursor grab and visibility.
///
/// Left click grabs the cursor; the pause binding releases it.
#[allow(clippy::needless_pass_by_value)]
pub fn cursor_grab(
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mouse: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
) {
    let Ok(mut w) = windows.get_single_mut() else { return };
    if mouse.just_pressed(MouseButton::Left) {
        grab_cursor(&mut w);
    }
    if bindings.pause.just_pressed(&keys, &mouse) {
        w.cursor.grab_mode = CursorGrabMode::None;
        w.cursor.visible = true;
    }
}

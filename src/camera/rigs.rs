//! First- and third-person rig components.
//!
//! Both rigs keep their own yaw/pitch and are updated every frame, enabled
//! or not, so switching modes never snaps the view.
use bevy::math::EulerRot;
use bevy::prelude::*;
use std::f32::consts::FRAC_PI_2;

/// Slack on the vertical pitch limit so `90f32.to_radians()` is accepted.
const PITCH_LIMIT: f32 = FRAC_PI_2 + 1e-6;

use crate::error::{require_non_negative, require_positive, ConfigError};
use crate::physics::LayerMask;

/// Mouse-driven look orientation with a clamped pitch.
///
/// - `yaw`: rotation around world +Y, unbounded.
/// - `pitch`: rotation around the local X axis, kept in `[pitch_min, pitch_max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    pub yaw: f32,
    pub pitch: f32,
    /// Radians per pixel of mouse motion.
    pub sensitivity: f32,
    pub pitch_min: f32,
    pub pitch_max: f32,
}

impl LookAngles {
    /// # Errors
    /// Sensitivity must be positive, `pitch_min <= pitch_max`, and both
    /// limits within `[-pi/2, pi/2]`. Past vertical the view flips over and
    /// the heading read back from it points the other way.
    pub fn new(sensitivity: f32, pitch_min: f32, pitch_max: f32) -> Result<Self, ConfigError> {
        require_positive("camera sensitivity", sensitivity)?;
        if !(pitch_min.is_finite() && pitch_max.is_finite()) || pitch_min > pitch_max {
            return Err(ConfigError::InvertedPitchLimits { min: pitch_min, max: pitch_max });
        }
        if pitch_min < -PITCH_LIMIT || pitch_max > PITCH_LIMIT {
            return Err(ConfigError::PitchOutOfRange { min: pitch_min, max: pitch_max });
        }
        Ok(Self { yaw: 0.0, pitch: 0.0, sensitivity, pitch_min, pitch_max })
    }

    /// Apply a raw mouse delta. Moving the mouse right turns right, moving
    /// it up looks up.
    pub fn apply_delta(&mut self, delta: Vec2) {
        self.yaw -= delta.x * self.sensitivity;
        self.pitch -= delta.y * self.sensitivity;
        self.pitch = self.pitch.clamp(self.pitch_min, self.pitch_max);
    }

    #[must_use]
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }
}

/// Camera sitting inside the player's head.
#[derive(Component, Debug, Clone, Copy)]
pub struct FirstPersonRig {
    pub look: LookAngles,
    /// Height above the player's centre.
    pub eye_level: f32,
}

impl FirstPersonRig {
    #[must_use]
    pub fn camera_transform(&self, player_position: Vec3) -> Transform {
        Transform::from_translation(player_position + Vec3::Y * self.eye_level).with_rotation(self.look.rotation())
    }
}

/// Orbiting camera on a boom behind the player.
///
/// The boom pulls in to the first obstacle between the player and the
/// camera and eases back out to `ideal_distance` once the view is clear.
#[derive(Component, Debug, Clone, Copy)]
pub struct ThirdPersonRig {
    pub look: LookAngles,
    pub ideal_distance: f32,
    /// Units per second the boom extends when unobstructed.
    pub zoom_out_speed: f32,
    /// Layers that block the view.
    pub avoid_mask: LayerMask,
    pub current_distance: f32,
}

impl ThirdPersonRig {
    /// # Errors
    /// Distances and speeds must be finite; the ideal distance must be
    /// positive and the avoid mask non-empty.
    pub fn new(look: LookAngles, ideal_distance: f32, zoom_out_speed: f32, avoid_mask: LayerMask) -> Result<Self, ConfigError> {
        require_positive("third person ideal distance", ideal_distance)?;
        require_non_negative("third person zoom out speed", zoom_out_speed)?;
        if avoid_mask.is_empty() {
            return Err(ConfigError::EmptyLayerMask("third person avoid"));
        }
        Ok(Self { look, ideal_distance, zoom_out_speed, avoid_mask, current_distance: 0.0 })
    }

    /// Unit vector from the anchor toward the camera.
    #[must_use]
    pub fn boom_direction(&self) -> Vec3 {
        self.look.rotation() * Vec3::Z
    }

    /// Snap to an obstacle distance, or ease out toward the ideal distance.
    pub fn update_zoom(&mut self, obstacle_distance: Option<f32>, dt: f32) {
        self.current_distance = match obstacle_distance {
            Some(d) => d,
            None => move_towards(self.current_distance, self.ideal_distance, self.zoom_out_speed * dt),
        };
    }

    #[must_use]
    pub fn camera_transform(&self, anchor: Vec3) -> Transform {
        Transform::from_translation(anchor + self.boom_direction() * self.current_distance)
            .with_rotation(self.look.rotation())
    }
}

/// Step `current` toward `target` by at most `max_delta`.
#[must_use]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let diff = target - current;
    if diff.abs() <= max_delta {
        target
    } else {
        current + diff.signum() * max_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn look() -> LookAngles {
        LookAngles::new(0.01, -1.2, 1.2).unwrap()
    }

    #[test]
    fn pitch_is_clamped_in_both_directions() {
        let mut l = look();
        l.apply_delta(Vec2::new(0.0, -10_000.0));
        assert_eq!(l.pitch, 1.2);
        l.apply_delta(Vec2::new(0.0, 10_000.0));
        assert_eq!(l.pitch, -1.2);
    }

    #[test]
    fn mouse_right_turns_right() {
        let mut l = look();
        l.apply_delta(Vec2::new(50.0, 0.0));
        let forward = l.rotation() * Vec3::NEG_Z;
        assert!(forward.x > 0.0);
    }

    #[test]
    fn inverted_limits_are_rejected() {
        assert!(matches!(LookAngles::new(0.01, 1.0, -1.0), Err(ConfigError::InvertedPitchLimits { .. })));
        assert!(LookAngles::new(0.0, -1.0, 1.0).is_err());
    }

    #[test]
    fn pitch_limits_past_vertical_are_rejected() {
        let over = 95f32.to_radians();
        assert!(matches!(LookAngles::new(0.01, -1.0, over), Err(ConfigError::PitchOutOfRange { .. })));
        assert!(matches!(LookAngles::new(0.01, -over, 1.0), Err(ConfigError::PitchOutOfRange { .. })));
        assert!(LookAngles::new(0.01, -FRAC_PI_2, FRAC_PI_2).is_ok());
        assert!(LookAngles::new(0.01, -90f32.to_radians(), 90f32.to_radians()).is_ok());
    }

    #[test]
    fn heading_survives_the_steepest_allowed_pitch() {
        use crate::camera::CameraFacing;
        let mut l = LookAngles::new(0.01, -1.5, 1.5).unwrap();
        l.yaw = 1.0;
        l.apply_delta(Vec2::new(0.0, -10_000.0));
        let facing = CameraFacing { position: Vec3::ZERO, rotation: l.rotation() };
        assert!((facing.yaw() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn empty_avoid_mask_is_rejected() {
        assert_eq!(
            ThirdPersonRig::new(look(), 4.0, 2.0, LayerMask::NONE).err(),
            Some(ConfigError::EmptyLayerMask("third person avoid"))
        );
    }

    #[test]
    fn move_towards_never_overshoots() {
        assert_eq!(move_towards(0.0, 5.0, 2.0), 2.0);
        assert_eq!(move_towards(4.5, 5.0, 2.0), 5.0);
        assert_eq!(move_towards(5.0, 1.0, 1.5), 3.5);
    }

    #[test]
    fn boom_snaps_in_and_eases_out() {
        let mut rig = ThirdPersonRig::new(look(), 4.0, 2.0, LayerMask::OBSTACLE).unwrap();
        rig.update_zoom(None, 1.0);
        assert_eq!(rig.current_distance, 2.0);
        rig.update_zoom(Some(0.75), 1.0);
        assert_eq!(rig.current_distance, 0.75);
        rig.update_zoom(None, 0.5);
        assert_eq!(rig.current_distance, 1.75);
        rig.update_zoom(None, 10.0);
        assert_eq!(rig.current_distance, 4.0);
    }

    #[test]
    fn third_person_camera_sits_behind_anchor() {
        let mut rig = ThirdPersonRig::new(look(), 4.0, 2.0, LayerMask::OBSTACLE).unwrap();
        rig.current_distance = 3.0;
        let tf = rig.camera_transform(Vec3::new(1.0, 1.0, 1.0));
        // yaw 0: camera looks down -Z, so it sits on the +Z side of the anchor
        assert!((tf.translation - Vec3::new(1.0, 1.0, 4.0)).length() < 1e-5);
    }

    #[test]
    fn first_person_camera_sits_at_eye_level() {
        let rig = FirstPersonRig { look: look(), eye_level: 0.6 };
        let tf = rig.camera_transform(Vec3::new(2.0, 0.9, -1.0));
        assert!((tf.translation - Vec3::new(2.0, 1.5, -1.0)).length() < 1e-5);
    }
}

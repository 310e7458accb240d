//! Settings, types and defaults.
//!
//! Settings are stored as a RON file under `data/settings/` and are hot-reloadable
//! using the RON watcher utilities (see `ron::setup_ron_watcher`). Every field has
//! a serde default so a partial file only overrides what it names.
use bevy::prelude::{KeyCode, Resource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::camera::{CameraMode, FirstPersonRig, LookAngles, ThirdPersonRig};
use crate::combat::{DamageKind, DamageSource, Health};
use crate::error::{require_non_negative, ConfigError};
use crate::interaction::ScreenRay;
use crate::physics::LayerMask;
use crate::player::{LocomotionState, MovementConfig};

/// Controls / input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlsSettings {
    #[serde(default)]
    pub invert_y: bool, // Invert mouse Y axis
    #[serde(default)]
    pub invert_x: bool, // Invert mouse X axis
    #[serde(default = "ControlsSettings::default_sensitivity")]
    pub mouse_sensitivity: f32, // Multiplier applied on top of each rig's look sensitivity
    #[serde(default = "ControlsSettings::default_keybinds")]
    pub keybinds: HashMap<String, String>, // Map of action names to key identifiers (editable by user)
}

impl ControlsSettings {
    fn default_sensitivity() -> f32 { 1.0 }

    fn default_keybinds() -> HashMap<String, String> {
        [
            ("forward", "W"),
            ("back", "S"),
            ("left", "A"),
            ("right", "D"),
            ("jump", "Space"),
            ("shoot", "MouseLeft"),
            ("interact", "E"),
            ("first_person", "1"),
            ("third_person", "3"),
            ("toggle_camera", "V"),
            ("pause", "Escape"),
            ("toggle_debug", "F1"),
            ("dump_debug", "F3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            invert_y: false,
            invert_x: false,
            mouse_sensitivity: Self::default_sensitivity(),
            keybinds: Self::default_keybinds(),
        }
    }
}

/// Player locomotion constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementSettings {
    #[serde(default = "MovementSettings::default_walk_speed")]
    pub walk_speed: f32, // Horizontal speed in units per second
    #[serde(default = "MovementSettings::default_jump_power")]
    pub jump_power: f32, // Upward speed set at the start of a jump
    #[serde(default = "MovementSettings::default_gravity")]
    pub gravity: f32, // Vertical speed lost per second while airborne
    #[serde(default = "MovementSettings::default_ground_mask")]
    pub ground_mask: LayerMask, // Layers the ground probe treats as floor
    #[serde(default = "MovementSettings::default_half_height")]
    pub half_height: f32, // Half the height of the player's body
    #[serde(default = "MovementSettings::default_probe_epsilon")]
    pub probe_epsilon: f32, // Extra probe length below the feet
    #[serde(default)]
    pub initial_state: LocomotionState, // State the player spawns in
}

impl MovementSettings {
    fn default_walk_speed() -> f32 { 5.0 }
    fn default_jump_power() -> f32 { 6.0 }
    fn default_gravity() -> f32 { 15.0 }
    fn default_ground_mask() -> LayerMask { LayerMask::GROUND | LayerMask::OBSTACLE }
    fn default_half_height() -> f32 { 0.9 }
    fn default_probe_epsilon() -> f32 { crate::player::GROUND_PROBE_EPSILON }

    /// Validate into a [`MovementConfig`].
    ///
    /// # Errors
    /// See [`MovementConfig::new`].
    pub fn to_config(&self) -> Result<MovementConfig, ConfigError> {
        MovementConfig::new(self.walk_speed, self.jump_power, self.gravity, self.ground_mask, self.half_height)?
            .with_probe_epsilon(self.probe_epsilon)
    }
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            walk_speed: Self::default_walk_speed(),
            jump_power: Self::default_jump_power(),
            gravity: Self::default_gravity(),
            ground_mask: Self::default_ground_mask(),
            half_height: Self::default_half_height(),
            probe_epsilon: Self::default_probe_epsilon(),
            initial_state: LocomotionState::default(),
        }
    }
}

/// Look tuning shared by both rigs. Angles in degrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookSettings {
    #[serde(default = "LookSettings::default_sensitivity")]
    pub sensitivity: f32, // Radians of rotation per pixel of mouse motion
    #[serde(default = "LookSettings::default_pitch_min")]
    pub pitch_min_deg: f32, // Lowest allowed pitch (looking down)
    #[serde(default = "LookSettings::default_pitch_max")]
    pub pitch_max_deg: f32, // Highest allowed pitch (looking up)
}

impl LookSettings {
    fn default_sensitivity() -> f32 { 0.0025 }
    fn default_pitch_min() -> f32 { -85.0 }
    fn default_pitch_max() -> f32 { 85.0 }

    /// # Errors
    /// See [`LookAngles::new`].
    pub fn to_look(&self, mouse_multiplier: f32) -> Result<LookAngles, ConfigError> {
        LookAngles::new(
            self.sensitivity * mouse_multiplier,
            self.pitch_min_deg.to_radians(),
            self.pitch_max_deg.to_radians(),
        )
    }
}

impl Default for LookSettings {
    fn default() -> Self {
        Self {
            sensitivity: Self::default_sensitivity(),
            pitch_min_deg: Self::default_pitch_min(),
            pitch_max_deg: Self::default_pitch_max(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirstPersonSettings {
    #[serde(default)]
    pub look: LookSettings,
    #[serde(default = "FirstPersonSettings::default_eye_level")]
    pub eye_level: f32, // Camera height above the player's centre
}

impl FirstPersonSettings {
    fn default_eye_level() -> f32 { 0.6 }
}

impl Default for FirstPersonSettings {
    fn default() -> Self {
        Self { look: LookSettings::default(), eye_level: Self::default_eye_level() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThirdPersonSettings {
    #[serde(default = "ThirdPersonSettings::default_look")]
    pub look: LookSettings,
    #[serde(default = "ThirdPersonSettings::default_ideal_distance")]
    pub ideal_distance: f32, // Distance the boom rests at when nothing blocks it
    #[serde(default = "ThirdPersonSettings::default_zoom_out_speed")]
    pub zoom_out_speed: f32, // Units per second the boom extends back out
    #[serde(default = "ThirdPersonSettings::default_avoid_mask")]
    pub avoid_mask: LayerMask, // Layers that pull the camera in
}

impl ThirdPersonSettings {
    fn default_look() -> LookSettings {
        LookSettings { pitch_min_deg: -70.0, pitch_max_deg: 45.0, ..LookSettings::default() }
    }
    fn default_ideal_distance() -> f32 { 4.5 }
    fn default_zoom_out_speed() -> f32 { 3.0 }
    fn default_avoid_mask() -> LayerMask { LayerMask::GROUND | LayerMask::OBSTACLE | LayerMask::TARGET }
}

impl Default for ThirdPersonSettings {
    fn default() -> Self {
        Self {
            look: Self::default_look(),
            ideal_distance: Self::default_ideal_distance(),
            zoom_out_speed: Self::default_zoom_out_speed(),
            avoid_mask: Self::default_avoid_mask(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    #[serde(default)]
    pub initial_mode: CameraMode, // Which rig is active at startup
    #[serde(default)]
    pub first_person: FirstPersonSettings,
    #[serde(default)]
    pub third_person: ThirdPersonSettings,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            initial_mode: CameraMode::default(),
            first_person: FirstPersonSettings::default(),
            third_person: ThirdPersonSettings::default(),
        }
    }
}

impl CameraSettings {
    /// # Errors
    /// Invalid look or boom tuning.
    pub fn first_person_rig(&self, controls: &ControlsSettings) -> Result<FirstPersonRig, ConfigError> {
        Ok(FirstPersonRig {
            look: self.first_person.look.to_look(controls.mouse_sensitivity)?,
            eye_level: self.first_person.eye_level,
        })
    }

    /// # Errors
    /// Invalid look or boom tuning.
    pub fn third_person_rig(&self, controls: &ControlsSettings) -> Result<ThirdPersonRig, ConfigError> {
        let tp = &self.third_person;
        ThirdPersonRig::new(
            tp.look.to_look(controls.mouse_sensitivity)?,
            tp.ideal_distance,
            tp.zoom_out_speed,
            tp.avoid_mask,
        )
    }
}

/// Screen-centre hitscan weapon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponSettings {
    #[serde(default = "WeaponSettings::default_max_distance")]
    pub max_distance: f32, // Range of the shot
    #[serde(default = "WeaponSettings::default_hit_mask")]
    pub hit_mask: LayerMask, // Layers a shot can hit
    #[serde(default = "WeaponSettings::default_damage")]
    pub damage: f32, // Damage per shot (per second for over_time)
    #[serde(default)]
    pub damage_kind: DamageKind, // Instant or OverTime
    #[serde(default = "WeaponSettings::default_tracer_seconds")]
    pub tracer_seconds: f32, // How long the shot line stays visible
}

impl WeaponSettings {
    fn default_max_distance() -> f32 { 60.0 }
    fn default_hit_mask() -> LayerMask { LayerMask::GROUND | LayerMask::OBSTACLE | LayerMask::TARGET }
    fn default_damage() -> f32 { 25.0 }
    fn default_tracer_seconds() -> f32 { 0.25 }

    /// # Errors
    /// Range must be positive; damage and tracer time non-negative.
    pub fn to_parts(&self) -> Result<(ScreenRay, DamageSource, f32), ConfigError> {
        let ray = ScreenRay::new(self.max_distance, self.hit_mask)?;
        let damage = DamageSource::new(require_non_negative("weapon damage", self.damage)?, self.damage_kind);
        let tracer = require_non_negative("tracer seconds", self.tracer_seconds)?;
        Ok((ray, damage, tracer))
    }
}

impl Default for WeaponSettings {
    fn default() -> Self {
        Self {
            max_distance: Self::default_max_distance(),
            hit_mask: Self::default_hit_mask(),
            damage: Self::default_damage(),
            damage_kind: DamageKind::default(),
            tracer_seconds: Self::default_tracer_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractSettings {
    #[serde(default = "InteractSettings::default_max_distance")]
    pub max_distance: f32, // Reach of the interact ray
    #[serde(default = "InteractSettings::default_hit_mask")]
    pub hit_mask: LayerMask, // Layers the interact ray can touch
}

impl InteractSettings {
    fn default_max_distance() -> f32 { 3.0 }
    fn default_hit_mask() -> LayerMask { LayerMask::GROUND | LayerMask::OBSTACLE | LayerMask::TARGET }
}

impl Default for InteractSettings {
    fn default() -> Self {
        Self { max_distance: Self::default_max_distance(), hit_mask: Self::default_hit_mask() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSettings {
    #[serde(default = "PlayerSettings::default_max_health")]
    pub max_health: f32, // Health the player spawns with
}

impl PlayerSettings {
    fn default_max_health() -> f32 { 100.0 }

    /// # Errors
    /// See [`Health::new`].
    pub fn health(&self) -> Result<Health, ConfigError> {
        Health::new(self.max_health)
    }
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self { max_health: Self::default_max_health() }
    }
}

/// Top-level Settings
#[derive(Resource, Clone, Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub controls: ControlsSettings,
    #[serde(default)]
    pub movement: MovementSettings,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub weapon: WeaponSettings,
    #[serde(default)]
    pub interact: InteractSettings,
    #[serde(default)]
    pub player: PlayerSettings,
}

impl Settings {
    #[must_use]
    pub fn defaults() -> Self { Settings::default() }

    /// Check every section that feeds a validated component.
    ///
    /// # Errors
    /// The first configuration fault found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.movement.to_config()?;
        self.camera.first_person_rig(&self.controls)?;
        self.camera.third_person_rig(&self.controls)?;
        self.weapon.to_parts()?;
        ScreenRay::new(self.interact.max_distance, self.interact.hit_mask)?;
        self.player.health()?;
        Ok(())
    }

    /// Add descriptions to each setting field so users understand
    /// what each setting does and gets an idea of what to expect when changing the setting.
    ///
    /// # Return
    /// A nested `HashMap` where the first level keys are section names (e.g. "movement")
    /// and the second level maps setting field names to their descriptions.
    #[must_use]
    pub fn field_descriptions() -> HashMap<&'static str, HashMap<&'static str, &'static str>> {
        let section = |pairs: &[(&'static str, &'static str)]| pairs.iter().copied().collect::<HashMap<_, _>>();
        let mut out = HashMap::new();

        out.insert("controls", section(&[
            ("invert_y", "Invert the vertical look/mouse Y axis."),
            ("invert_x", "Invert the horizontal look/mouse X axis."),
            ("mouse_sensitivity", "Multiplier applied to both camera rigs' look sensitivity."),
            ("keybinds", "Map of action names to key or mouse button identifiers."),
        ]));
        out.insert("movement", section(&[
            ("walk_speed", "Horizontal speed in units per second."),
            ("jump_power", "Upward speed set when a jump starts."),
            ("gravity", "Vertical speed lost per second; must be positive."),
            ("ground_mask", "Bit mask of layers the ground probe treats as floor."),
            ("half_height", "Half the player's body height; sets the ground probe length."),
            ("probe_epsilon", "Extra ground probe length below the feet."),
            ("initial_state", "Locomotion state at spawn (Walk, Rise or Fall)."),
        ]));
        out.insert("camera", section(&[
            ("initial_mode", "Camera rig active at startup (FirstPerson or ThirdPerson)."),
            ("first_person", "Look limits and eye height of the first-person rig."),
            ("third_person", "Look limits, boom length and obstruction layers of the third-person rig."),
        ]));
        out.insert("weapon", section(&[
            ("max_distance", "Range of a shot; misses draw to this distance."),
            ("hit_mask", "Bit mask of layers a shot can hit."),
            ("damage", "Damage per shot, or per second for OverTime."),
            ("damage_kind", "Instant or OverTime."),
            ("tracer_seconds", "How long the shot line stays on screen."),
        ]));
        out.insert("interact", section(&[
            ("max_distance", "Reach of the interact ray."),
            ("hit_mask", "Bit mask of layers the interact ray can touch."),
        ]));
        out.insert("player", section(&[
            ("max_health", "Health the player spawns with."),
        ]));

        out
    }

    /// Convert a string key identifier (e.g., from `controls.keybinds`) into a `KeyCode` that
    /// can be used with Bevy's input system.
    ///
    /// # Arguments
    /// * `name` - The string key identifier to convert (e.g., "W", "Space", "F1").
    ///
    /// # Returns
    /// The matching `KeyCode`, or `None` if the string does not name a known key.
    #[must_use]
    pub fn keycode_from_str(name: &str) -> Option<KeyCode> {
        const LETTERS: [KeyCode; 26] = [
            KeyCode::KeyA, KeyCode::KeyB, KeyCode::KeyC, KeyCode::KeyD, KeyCode::KeyE, KeyCode::KeyF,
            KeyCode::KeyG, KeyCode::KeyH, KeyCode::KeyI, KeyCode::KeyJ, KeyCode::KeyK, KeyCode::KeyL,
            KeyCode::KeyM, KeyCode::KeyN, KeyCode::KeyO, KeyCode::KeyP, KeyCode::KeyQ, KeyCode::KeyR,
            KeyCode::KeyS, KeyCode::KeyT, KeyCode::KeyU, KeyCode::KeyV, KeyCode::KeyW, KeyCode::KeyX,
            KeyCode::KeyY, KeyCode::KeyZ,
        ];
        const DIGITS: [KeyCode; 10] = [
            KeyCode::Digit0, KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4,
            KeyCode::Digit5, KeyCode::Digit6, KeyCode::Digit7, KeyCode::Digit8, KeyCode::Digit9,
        ];
        const FUNCTION: [KeyCode; 12] = [
            KeyCode::F1, KeyCode::F2, KeyCode::F3, KeyCode::F4, KeyCode::F5, KeyCode::F6,
            KeyCode::F7, KeyCode::F8, KeyCode::F9, KeyCode::F10, KeyCode::F11, KeyCode::F12,
        ];

        let s = name.trim().to_ascii_uppercase();
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_uppercase() {
                return Some(LETTERS[(c as u8 - b'A') as usize]);
            }
            if c.is_ascii_digit() {
                return Some(DIGITS[(c as u8 - b'0') as usize]);
            }
        }
        if let Some(n) = s.strip_prefix('F').and_then(|n| n.parse::<usize>().ok()) {
            return FUNCTION.get(n.checked_sub(1)?).copied();
        }

        Some(match s.as_str() {
            // Arrows / navigation
            "LEFT" | "ARROWLEFT" => KeyCode::ArrowLeft,
            "RIGHT" | "ARROWRIGHT" => KeyCode::ArrowRight,
            "UP" | "ARROWUP" => KeyCode::ArrowUp,
            "DOWN" | "ARROWDOWN" => KeyCode::ArrowDown,

            // Whitespace / control
            "ESC" | "ESCAPE" => KeyCode::Escape,
            "SPACE" => KeyCode::Space,
            "TAB" => KeyCode::Tab,
            "ENTER" | "RETURN" => KeyCode::Enter,
            "BACKSPACE" | "BACK" => KeyCode::Backspace,

            // Modifiers
            "LSHIFT" | "SHIFT" => KeyCode::ShiftLeft,
            "RSHIFT" => KeyCode::ShiftRight,
            "LCTRL" | "CTRL" | "CONTROL" => KeyCode::ControlLeft,
            "RCTRL" => KeyCode::ControlRight,
            "LALT" | "ALT" => KeyCode::AltLeft,
            "RALT" => KeyCode::AltRight,

            _ => return None,
        })
    }
}

pub mod loader;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Settings::defaults().validate(), Ok(()));
    }

    #[test]
    fn partial_ron_keeps_defaults_for_missing_fields() {
        let s: Settings = ron::from_str("(movement: (walk_speed: 7.5, ground_mask: 9))").unwrap();
        assert_eq!(s.movement.walk_speed, 7.5);
        assert_eq!(s.movement.ground_mask, LayerMask(9));
        assert_eq!(s.movement.gravity, 15.0);
        assert_eq!(s.camera.initial_mode, CameraMode::FirstPerson);
        assert_eq!(s.controls.keybinds.get("jump").map(String::as_str), Some("Space"));
    }

    #[test]
    fn invalid_movement_fails_validation() {
        let s: Settings = ron::from_str("(movement: (gravity: 0.0))").unwrap();
        assert!(matches!(s.validate(), Err(ConfigError::NotPositive { field: "gravity", .. })));
    }

    #[test]
    fn invalid_camera_fails_validation() {
        let s: Settings = ron::from_str("(camera: (first_person: (look: (pitch_max_deg: 120.0))))").unwrap();
        assert!(matches!(s.validate(), Err(ConfigError::PitchOutOfRange { .. })));

        let s: Settings = ron::from_str("(camera: (third_person: (avoid_mask: 0)))").unwrap();
        assert_eq!(s.validate(), Err(ConfigError::EmptyLayerMask("third person avoid")));
    }

    #[test]
    fn keycodes_parse_case_insensitively() {
        assert_eq!(Settings::keycode_from_str("w"), Some(KeyCode::KeyW));
        assert_eq!(Settings::keycode_from_str("3"), Some(KeyCode::Digit3));
        assert_eq!(Settings::keycode_from_str("f12"), Some(KeyCode::F12));
        assert_eq!(Settings::keycode_from_str("Space"), Some(KeyCode::Space));
        assert_eq!(Settings::keycode_from_str("F0"), None);
        assert_eq!(Settings::keycode_from_str("F13"), None);
        assert_eq!(Settings::keycode_from_str("nope"), None);
    }

    #[test]
    fn every_section_is_described() {
        let d = Settings::field_descriptions();
        for section in ["controls", "movement", "camera", "weapon", "interact", "player"] {
            assert!(d.contains_key(section), "missing {section}");
        }
        assert!(d["movement"].contains_key("gravity"));
    }
}

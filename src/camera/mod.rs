//! Camera selection and the camera-direction contract used by movement.
//!
//! Two rigs exist at all times (first and third person). [`CameraSelector`]
//! owns an explicit [`CameraMode`] and enables exactly one rig; whatever is
//! rendered is derived from that field, never the other way round.
//! Movement code only needs [`CameraDirectionProvider::active_facing`].
//!
//! # Example
//!
//! ```
//! use bevy::prelude::*;
//! use stride::camera::{CameraDirectionProvider, CameraMode, CameraSelector, RigHandle};
//!
//! let mut selector = CameraSelector::new(
//!     Some(RigHandle::new(Entity::from_raw(1))),
//!     Some(RigHandle::new(Entity::from_raw(2))),
//!     CameraMode::FirstPerson,
//! )
//! .unwrap();
//! selector.select(CameraMode::ThirdPerson);
//! assert_eq!(selector.mode(), CameraMode::ThirdPerson);
//! assert_eq!(selector.active_rig().entity, Entity::from_raw(2));
//! ```
pub mod rigs;
pub mod systems;

use bevy::math::EulerRot;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub use rigs::*;
pub use systems::*;

/// Which camera rig drives the view and the movement frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraMode {
    #[default]
    FirstPerson,
    ThirdPerson,
}

impl CameraMode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            CameraMode::FirstPerson => CameraMode::ThirdPerson,
            CameraMode::ThirdPerson => CameraMode::FirstPerson,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            CameraMode::FirstPerson => "first person",
            CameraMode::ThirdPerson => "third person",
        }
    }
}

/// World position and orientation of a camera rig.
///
/// Follows Bevy's convention: with an identity rotation the camera looks
/// down -Z with +Y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFacing {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for CameraFacing {
    fn default() -> Self {
        Self { position: Vec3::ZERO, rotation: Quat::IDENTITY }
    }
}

impl CameraFacing {
    #[must_use]
    pub fn from_transform(tf: &Transform) -> Self {
        Self { position: tf.translation, rotation: tf.rotation }
    }

    /// Facing built from yaw (around +Y) then pitch (around local +X), radians.
    #[must_use]
    pub fn from_yaw_pitch(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self { position, rotation: Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0) }
    }

    /// Full look direction, pitch included.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Heading around the world up axis, radians.
    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.rotation.to_euler(EulerRot::YXZ).0
    }

    /// Rotation that keeps only the heading; used to map input axes onto
    /// the ground plane.
    #[must_use]
    pub fn heading(&self) -> Quat {
        Quat::from_rotation_y(self.yaw())
    }
}

/// Source of the facing that movement is expressed relative to.
pub trait CameraDirectionProvider {
    fn active_facing(&self) -> CameraFacing;
    fn mode(&self) -> CameraMode;
}

/// One switchable camera rig.
pub trait CameraRig {
    fn facing(&self) -> CameraFacing;
    fn set_enabled(&mut self, enabled: bool);
    fn is_enabled(&self) -> bool;
}

/// Holds both rigs and keeps exactly one of them enabled.
#[derive(Debug, Clone)]
pub struct CameraSelector<R> {
    mode: CameraMode,
    first_person: R,
    third_person: R,
}

impl<R: CameraRig> CameraSelector<R> {
    /// Build a selector and enable the rig for `initial`.
    ///
    /// # Errors
    /// [`ConfigError::MissingCameraRig`] if either rig is absent. This is a
    /// startup fault; a selector never exists without both rigs.
    pub fn new(first_person: Option<R>, third_person: Option<R>, initial: CameraMode) -> Result<Self, ConfigError> {
        let first_person = first_person.ok_or(ConfigError::MissingCameraRig("first person"))?;
        let third_person = third_person.ok_or(ConfigError::MissingCameraRig("third person"))?;
        let mut selector = Self { mode: initial, first_person, third_person };
        selector.select(initial);
        Ok(selector)
    }

    /// Switch modes: the chosen rig is enabled and the other disabled.
    pub fn select(&mut self, mode: CameraMode) {
        self.mode = mode;
        let first = mode == CameraMode::FirstPerson;
        self.first_person.set_enabled(first);
        self.third_person.set_enabled(!first);
    }

    #[must_use]
    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    #[must_use]
    pub fn rig(&self, mode: CameraMode) -> &R {
        match mode {
            CameraMode::FirstPerson => &self.first_person,
            CameraMode::ThirdPerson => &self.third_person,
        }
    }

    pub fn rig_mut(&mut self, mode: CameraMode) -> &mut R {
        match mode {
            CameraMode::FirstPerson => &mut self.first_person,
            CameraMode::ThirdPerson => &mut self.third_person,
        }
    }

    #[must_use]
    pub fn active_rig(&self) -> &R {
        self.rig(self.mode)
    }
}

impl<R: CameraRig> CameraDirectionProvider for CameraSelector<R> {
    fn active_facing(&self) -> CameraFacing {
        self.active_rig().facing()
    }

    fn mode(&self) -> CameraMode {
        self.mode
    }
}

/// Rig handle kept in the ECS: the camera entity plus the facing sampled
/// from its transform this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigHandle {
    pub entity: Entity,
    pub facing: CameraFacing,
    enabled: bool,
}

impl RigHandle {
    #[must_use]
    pub fn new(entity: Entity) -> Self {
        Self { entity, facing: CameraFacing::default(), enabled: false }
    }
}

impl CameraRig for RigHandle {
    fn facing(&self) -> CameraFacing {
        self.facing
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// The scene's camera selector.
#[derive(Resource, Debug, Clone)]
pub struct ActiveCamera(pub CameraSelector<RigHandle>);

impl CameraDirectionProvider for ActiveCamera {
    fn active_facing(&self) -> CameraFacing {
        self.0.active_facing()
    }

    fn mode(&self) -> CameraMode {
        self.0.mode()
    }
}

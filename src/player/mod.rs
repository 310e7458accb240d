//! Player components and systems (locomotion state machine and its ECS glue).
//!
//! # Example:
//!
//! ```ignore
//! // spawn the player body
//! commands.spawn((
//!     Player,
//!     Transform::from_xyz(0.0, 1.0, 0.0),
//!     KinematicBody { velocity: Vec3::ZERO, collision_mask: LayerMask::GROUND },
//!     Collider::cuboid(Vec3::new(0.8, 1.8, 0.8), LayerMask::PLAYER),
//!     LocomotionController::new(config, LocomotionState::Walk),
//! ));
//! // register systems
//! app.add_systems(Update, (player_locomotion, integrate_bodies).chain());
//! ```
pub mod locomotion;
pub mod systems;

use bevy::prelude::*;

pub use locomotion::*;
pub use systems::*;

/// Marks the entity the input and cameras follow.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct Player;

//! Walk / Rise / Fall locomotion state machine.
//!
//! Each tick the controller reads the input snapshot and the active camera
//! facing, writes a full velocity to the body and decides whether to change
//! state. All collaborators are passed in explicitly; the controller owns
//! nothing but its configuration and current state.
//!
//! Vertical handling per state:
//! - `Walk`: `vy = max(vy - g*dt, 0)`. A grounded body never builds up
//!   downward speed, while leftover upward speed still decays.
//! - `Rise` / `Fall`: `vy = vy - g*dt`, one continuous integration split
//!   only by the sign of `vy`.
//!
//! # Example
//!
//! ```
//! use bevy::prelude::*;
//! use stride::camera::{CameraFacing, CameraDirectionProvider, CameraMode};
//! use stride::physics::{Collider, LayerMask, PhysicsBody, StaticColliders};
//! use stride::player::{FrameInput, LocomotionController, LocomotionState, MovementConfig};
//!
//! struct Fixed(CameraFacing);
//! impl CameraDirectionProvider for Fixed {
//!     fn active_facing(&self) -> CameraFacing { self.0 }
//!     fn mode(&self) -> CameraMode { CameraMode::FirstPerson }
//! }
//!
//! struct Body { pos: Vec3, vel: Vec3 }
//! impl PhysicsBody for Body {
//!     fn position(&self) -> Vec3 { self.pos }
//!     fn velocity(&self) -> Vec3 { self.vel }
//!     fn set_velocity(&mut self, v: Vec3) { self.vel = v; }
//! }
//!
//! let mut floor = StaticColliders::default();
//! floor.push(Entity::from_raw(1), Vec3::new(0.0, -0.5, 0.0),
//!     Collider::cuboid(Vec3::new(50.0, 1.0, 50.0), LayerMask::GROUND));
//!
//! let config = MovementConfig::new(4.0, 5.0, 10.0, LayerMask::GROUND, 1.0).unwrap();
//! let mut controller = LocomotionController::new(config, LocomotionState::Walk);
//! let mut body = Body { pos: Vec3::new(0.0, 1.0, 0.0), vel: Vec3::ZERO };
//! let jump = FrameInput { horizontal: 0.0, vertical: 1.0, jump: true };
//!
//! let state = controller
//!     .update(0.1, jump, &Fixed(CameraFacing::default()), &mut body, &floor)
//!     .unwrap();
//! assert_eq!(state, LocomotionState::Rise);
//! assert_eq!(body.vel, Vec3::new(0.0, 5.0, -4.0));
//! ```
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::{CameraDirectionProvider, CameraFacing};
use crate::error::{require_non_negative, require_positive, ConfigError};
use crate::physics::{LayerMask, PhysicsBody, QueryError, Raycaster};

/// Default extra length of the ground probe past the body's half height.
pub const GROUND_PROBE_EPSILON: f32 = 0.01;

/// Current locomotion mode. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LocomotionState {
    #[default]
    Walk,
    Rise,
    Fall,
}

impl LocomotionState {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            LocomotionState::Walk => "walk",
            LocomotionState::Rise => "rise",
            LocomotionState::Fall => "fall",
        }
    }
}

/// Per-entity movement constants. Validated once; read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementConfig {
    walk_speed: f32,
    jump_impulse: f32,
    gravity: f32,
    ground_mask: LayerMask,
    half_height: f32,
    probe_epsilon: f32,
}

impl MovementConfig {
    /// # Errors
    /// Walk speed, gravity and half height must be finite and positive; the
    /// jump impulse must be finite and non-negative.
    pub fn new(
        walk_speed: f32,
        jump_impulse: f32,
        gravity: f32,
        ground_mask: LayerMask,
        half_height: f32,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            walk_speed: require_positive("walk speed", walk_speed)?,
            jump_impulse: require_non_negative("jump impulse", jump_impulse)?,
            gravity: require_positive("gravity", gravity)?,
            ground_mask,
            half_height: require_positive("half height", half_height)?,
            probe_epsilon: GROUND_PROBE_EPSILON,
        })
    }

    /// Override the probe slack below the body.
    ///
    /// # Errors
    /// The epsilon must be finite and non-negative.
    pub fn with_probe_epsilon(mut self, epsilon: f32) -> Result<Self, ConfigError> {
        self.probe_epsilon = require_non_negative("ground probe epsilon", epsilon)?;
        Ok(self)
    }

    #[must_use]
    pub fn walk_speed(&self) -> f32 { self.walk_speed }
    #[must_use]
    pub fn jump_impulse(&self) -> f32 { self.jump_impulse }
    #[must_use]
    pub fn gravity(&self) -> f32 { self.gravity }
    #[must_use]
    pub fn ground_mask(&self) -> LayerMask { self.ground_mask }
    #[must_use]
    pub fn half_height(&self) -> f32 { self.half_height }

    /// Length of the downward ground probe from the body centre.
    #[must_use]
    pub fn probe_length(&self) -> f32 {
        self.half_height + self.probe_epsilon
    }
}

/// Input snapshot for one tick.
///
/// Axes are nominally in `[-1, 1]`: `horizontal` is strafe (+ right),
/// `vertical` is forward (+ forward).
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub horizontal: f32,
    pub vertical: f32,
    pub jump: bool,
}

impl FrameInput {
    #[must_use]
    pub fn axes(&self) -> Vec2 {
        Vec2::new(self.horizontal, self.vertical)
    }
}

/// Per-tick failures.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum LocomotionError {
    #[error("ground query failed: {0}")]
    GroundQuery(#[from] QueryError),

    #[error("delta time must be finite and non-negative (got {0})")]
    InvalidDeltaTime(f32),

    #[error("controller halted after an earlier fault")]
    Halted,
}

/// The locomotion state machine for one entity.
#[derive(Component, Debug, Clone)]
pub struct LocomotionController {
    config: MovementConfig,
    state: LocomotionState,
    halted: bool,
}

impl LocomotionController {
    #[must_use]
    pub fn new(config: MovementConfig, initial: LocomotionState) -> Self {
        Self { config, state: initial, halted: false }
    }

    #[must_use]
    pub fn state(&self) -> LocomotionState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Swap in a new configuration (settings hot-reload). State is kept.
    pub fn set_config(&mut self, config: MovementConfig) {
        self.config = config;
    }

    /// True once a ground query has failed; no further ticks run.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Camera-relative horizontal velocity for the given input.
    ///
    /// Only the facing's yaw is used, so looking up or down never changes
    /// where the body walks.
    ///
    /// Axes follow Bevy's camera convention: at yaw 0, `vertical = +1` walks
    /// toward -Z and `horizontal = +1` toward +X. A forward jump therefore
    /// reads `(0, jump, -speed)`, not `(0, jump, +speed)`.
    #[must_use]
    pub fn horizontal_velocity(&self, input: FrameInput, facing: &CameraFacing) -> Vec3 {
        let axes = input.axes().normalize_or_zero();
        let local = Vec3::new(axes.x, 0.0, -axes.y);
        let world = facing.heading() * local;
        Vec3::new(world.x, 0.0, world.z) * self.config.walk_speed
    }

    fn is_grounded<B: PhysicsBody + ?Sized, G: Raycaster + ?Sized>(&self, body: &B, ground: &G) -> Result<bool, QueryError> {
        let hit = ground.cast_ray(body.position(), Vec3::NEG_Y, self.config.probe_length(), self.config.ground_mask)?;
        Ok(hit.is_some())
    }

    /// Advance one tick and return the state after it.
    ///
    /// The facing is read from `camera` now, so callers must have updated
    /// it for this tick. Either the whole tick applies or nothing does: the
    /// ground probe runs before any write.
    ///
    /// # Errors
    /// - [`LocomotionError::InvalidDeltaTime`] for a negative or non-finite
    ///   `dt`; nothing changes and later ticks still run.
    /// - [`LocomotionError::GroundQuery`] if the ground probe fails; the
    ///   controller keeps its last state and halts.
    /// - [`LocomotionError::Halted`] for every tick after that.
    pub fn update<C, B, G>(
        &mut self,
        dt: f32,
        input: FrameInput,
        camera: &C,
        body: &mut B,
        ground: &G,
    ) -> Result<LocomotionState, LocomotionError>
    where
        C: CameraDirectionProvider + ?Sized,
        B: PhysicsBody + ?Sized,
        G: Raycaster + ?Sized,
    {
        if self.halted {
            return Err(LocomotionError::Halted);
        }
        if !dt.is_finite() || dt < 0.0 {
            return Err(LocomotionError::InvalidDeltaTime(dt));
        }

        let facing = camera.active_facing();
        let horizontal = self.horizontal_velocity(input, &facing);
        let vy = body.velocity().y;
        let fallen = vy - self.config.gravity * dt;

        let grounded = match self.state {
            LocomotionState::Walk | LocomotionState::Fall => match self.is_grounded(&*body, ground) {
                Ok(g) => Some(g),
                Err(e) => {
                    self.halted = true;
                    return Err(e.into());
                }
            },
            LocomotionState::Rise => None,
        };

        match self.state {
            LocomotionState::Walk => {
                body.set_velocity(Vec3::new(horizontal.x, fallen.max(0.0), horizontal.z));
                if grounded != Some(true) {
                    self.state = LocomotionState::Fall;
                } else if input.jump {
                    body.set_velocity(Vec3::new(horizontal.x, self.config.jump_impulse, horizontal.z));
                    self.state = LocomotionState::Rise;
                }
            }
            LocomotionState::Rise => {
                body.set_velocity(Vec3::new(horizontal.x, fallen, horizontal.z));
                if fallen < 0.0 {
                    self.state = LocomotionState::Fall;
                }
            }
            LocomotionState::Fall => {
                body.set_velocity(Vec3::new(horizontal.x, fallen, horizontal.z));
                if grounded == Some(true) {
                    self.state = LocomotionState::Walk;
                }
            }
        }

        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraMode;
    use crate::physics::RayHit;
    use std::cell::Cell;

    struct Facing(CameraFacing);

    impl CameraDirectionProvider for Facing {
        fn active_facing(&self) -> CameraFacing {
            self.0
        }

        fn mode(&self) -> CameraMode {
            CameraMode::FirstPerson
        }
    }

    #[derive(Default)]
    struct TestBody {
        velocity: Vec3,
        writes: usize,
    }

    impl PhysicsBody for TestBody {
        fn position(&self) -> Vec3 {
            Vec3::new(0.0, 1.0, 0.0)
        }

        fn velocity(&self) -> Vec3 {
            self.velocity
        }

        fn set_velocity(&mut self, velocity: Vec3) {
            self.velocity = velocity;
            self.writes += 1;
        }
    }

    /// Ground probe with a scripted answer that records what it was asked.
    struct Ground {
        grounded: Cell<bool>,
        fail: Cell<bool>,
        last_length: Cell<f32>,
        last_mask: Cell<LayerMask>,
    }

    impl Ground {
        fn new(grounded: bool) -> Self {
            Self {
                grounded: Cell::new(grounded),
                fail: Cell::new(false),
                last_length: Cell::new(0.0),
                last_mask: Cell::new(LayerMask::NONE),
            }
        }
    }

    impl Raycaster for Ground {
        fn cast_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: LayerMask) -> Result<Option<RayHit>, QueryError> {
            assert_eq!(direction, Vec3::NEG_Y);
            self.last_length.set(max_distance);
            self.last_mask.set(mask);
            if self.fail.get() {
                return Err(QueryError::EmptyLayerMask);
            }
            Ok(self.grounded.get().then(|| RayHit {
                entity: Entity::from_raw(7),
                point: origin - Vec3::Y,
                distance: 1.0,
            }))
        }
    }

    fn config() -> MovementConfig {
        MovementConfig::new(4.0, 5.0, 10.0, LayerMask::GROUND, 1.0).unwrap()
    }

    fn level() -> Facing {
        Facing(CameraFacing::default())
    }

    fn input(h: f32, v: f32, jump: bool) -> FrameInput {
        FrameInput { horizontal: h, vertical: v, jump }
    }

    #[test]
    fn worked_jump_example() {
        let mut c = LocomotionController::new(config(), LocomotionState::Walk);
        let mut body = TestBody::default();
        let ground = Ground::new(true);
        let cam = level();

        assert_eq!(c.update(0.1, input(0.0, 1.0, true), &cam, &mut body, &ground), Ok(LocomotionState::Rise));
        // forward is -Z
        assert_eq!(body.velocity, Vec3::new(0.0, 5.0, -4.0));

        ground.grounded.set(false);
        let expected = [4.0, 3.0, 2.0, 1.0, 0.0];
        for vy in expected {
            assert_eq!(c.update(0.1, input(0.0, 1.0, false), &cam, &mut body, &ground), Ok(LocomotionState::Rise));
            assert!((body.velocity.y - vy).abs() < 1e-5, "expected {vy}, got {}", body.velocity.y);
            assert!((body.velocity.z + 4.0).abs() < 1e-6);
        }

        assert_eq!(c.update(0.1, input(0.0, 1.0, false), &cam, &mut body, &ground), Ok(LocomotionState::Fall));
        assert!((body.velocity.y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn walk_without_ground_falls_and_ignores_jump() {
        let mut c = LocomotionController::new(config(), LocomotionState::Walk);
        let mut body = TestBody::default();
        let ground = Ground::new(false);

        let state = c.update(0.1, input(0.0, 0.0, true), &level(), &mut body, &ground).unwrap();
        assert_eq!(state, LocomotionState::Fall);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn grounded_jump_sets_exact_impulse() {
        let mut c = LocomotionController::new(config(), LocomotionState::Walk);
        let mut body = TestBody { velocity: Vec3::new(0.0, 0.3, 0.0), writes: 0 };
        let ground = Ground::new(true);

        let state = c.update(0.016, input(1.0, 0.0, true), &level(), &mut body, &ground).unwrap();
        assert_eq!(state, LocomotionState::Rise);
        assert_eq!(body.velocity.y, 5.0);
    }

    #[test]
    fn rise_turns_to_fall_after_expected_ticks() {
        let mut c = LocomotionController::new(config(), LocomotionState::Rise);
        let v0 = 4.5_f32;
        let dt = 0.1_f32;
        let mut body = TestBody { velocity: Vec3::new(0.0, v0, 0.0), writes: 0 };
        let ground = Ground::new(false);
        let ticks = (v0 / (10.0 * dt)).ceil() as usize;

        for _ in 0..ticks - 1 {
            assert_eq!(c.update(dt, input(0.0, 0.0, false), &level(), &mut body, &ground), Ok(LocomotionState::Rise));
        }
        assert_eq!(c.update(dt, input(0.0, 0.0, false), &level(), &mut body, &ground), Ok(LocomotionState::Fall));

        // jump input has no effect and the state holds while airborne
        for _ in 0..20 {
            assert_eq!(c.update(dt, input(0.0, 0.0, true), &level(), &mut body, &ground), Ok(LocomotionState::Fall));
        }

        ground.grounded.set(true);
        assert_eq!(c.update(dt, input(0.0, 0.0, false), &level(), &mut body, &ground), Ok(LocomotionState::Walk));
    }

    #[test]
    fn fall_lands_on_ground_contact() {
        let mut c = LocomotionController::new(config(), LocomotionState::Fall);
        let mut body = TestBody { velocity: Vec3::new(0.0, -3.0, 0.0), writes: 0 };
        let ground = Ground::new(true);

        assert_eq!(c.update(0.1, FrameInput::default(), &level(), &mut body, &ground), Ok(LocomotionState::Walk));
        assert!((body.velocity.y + 4.0).abs() < 1e-5);
    }

    #[test]
    fn walk_clamps_negative_vertical_velocity_to_zero() {
        let mut c = LocomotionController::new(config(), LocomotionState::Walk);
        let mut body = TestBody { velocity: Vec3::new(0.0, -2.5, 0.0), writes: 0 };
        let ground = Ground::new(true);

        c.update(0.1, FrameInput::default(), &level(), &mut body, &ground).unwrap();
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn walk_decays_residual_upward_velocity() {
        let mut c = LocomotionController::new(config(), LocomotionState::Walk);
        let mut body = TestBody { velocity: Vec3::new(0.0, 1.5, 0.0), writes: 0 };
        let ground = Ground::new(true);

        c.update(0.1, FrameInput::default(), &level(), &mut body, &ground).unwrap();
        assert!((body.velocity.y - 0.5).abs() < 1e-5);
        c.update(0.1, FrameInput::default(), &level(), &mut body, &ground).unwrap();
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn movement_direction_ignores_camera_pitch() {
        let c = LocomotionController::new(config(), LocomotionState::Walk);
        let flat = CameraFacing::from_yaw_pitch(Vec3::ZERO, 0.6, 0.0);
        let pitched = CameraFacing::from_yaw_pitch(Vec3::ZERO, 0.6, -1.1);
        let steep = CameraFacing::from_yaw_pitch(Vec3::ZERO, 0.6, 1.5);

        for (h, v) in [(0.0, 1.0), (1.0, 0.0), (-0.7, 0.7), (0.3, -1.0)] {
            let a = c.horizontal_velocity(input(h, v, false), &flat);
            let b = c.horizontal_velocity(input(h, v, false), &pitched);
            let d = c.horizontal_velocity(input(h, v, false), &steep);
            assert!(a.abs_diff_eq(b, 1e-5), "{a} vs {b}");
            assert!(a.abs_diff_eq(d, 1e-3), "{a} vs {d}");
            assert_eq!(a.y, 0.0);
            assert!((a.length() - 4.0).abs() < 1e-4);
        }
    }

    #[test]
    fn input_axes_follow_camera_yaw() {
        let c = LocomotionController::new(config(), LocomotionState::Walk);
        let facing_east = CameraFacing::from_yaw_pitch(Vec3::ZERO, -std::f32::consts::FRAC_PI_2, 0.0);

        let forward = c.horizontal_velocity(input(0.0, 1.0, false), &facing_east);
        assert!(forward.abs_diff_eq(Vec3::new(4.0, 0.0, 0.0), 1e-5), "{forward}");

        let strafe = c.horizontal_velocity(input(1.0, 0.0, false), &CameraFacing::default());
        assert!(strafe.abs_diff_eq(Vec3::new(4.0, 0.0, 0.0), 1e-5));

        let ahead = c.horizontal_velocity(input(0.0, 1.0, false), &CameraFacing::default());
        assert!(ahead.abs_diff_eq(Vec3::new(0.0, 0.0, -4.0), 1e-5), "{ahead}");
    }

    #[test]
    fn zero_input_gives_zero_horizontal_velocity_in_every_state() {
        for (state, grounded) in [
            (LocomotionState::Walk, true),
            (LocomotionState::Walk, false),
            (LocomotionState::Rise, false),
            (LocomotionState::Fall, false),
            (LocomotionState::Fall, true),
        ] {
            let mut c = LocomotionController::new(config(), state);
            let mut body = TestBody { velocity: Vec3::new(3.0, 1.0, -2.0), writes: 0 };
            let ground = Ground::new(grounded);
            let facing = Facing(CameraFacing::from_yaw_pitch(Vec3::ZERO, 2.0, 0.4));

            c.update(0.05, input(0.0, 0.0, state == LocomotionState::Walk), &facing, &mut body, &ground).unwrap();
            assert_eq!(body.velocity.x, 0.0);
            assert_eq!(body.velocity.z, 0.0);
        }
    }

    #[test]
    fn exactly_one_state_after_every_tick() {
        let states = [LocomotionState::Walk, LocomotionState::Rise, LocomotionState::Fall];
        for start in states {
            for grounded in [false, true] {
                for jump in [false, true] {
                    for vy in [-3.0, 0.0, 0.05, 6.0] {
                        let mut c = LocomotionController::new(config(), start);
                        let mut body = TestBody { velocity: Vec3::new(0.0, vy, 0.0), writes: 0 };
                        let ground = Ground::new(grounded);
                        let state = c.update(0.1, input(0.2, 0.9, jump), &level(), &mut body, &ground).unwrap();
                        assert_eq!(state, c.state());
                        assert_eq!(states.iter().filter(|s| **s == state).count(), 1);
                    }
                }
            }
        }
    }

    #[test]
    fn ground_probe_uses_half_height_plus_epsilon_and_mask() {
        let mut c = LocomotionController::new(config(), LocomotionState::Walk);
        let mut body = TestBody::default();
        let ground = Ground::new(true);

        c.update(0.1, FrameInput::default(), &level(), &mut body, &ground).unwrap();
        assert!((ground.last_length.get() - 1.01).abs() < 1e-6);
        assert_eq!(ground.last_mask.get(), LayerMask::GROUND);
    }

    #[test]
    fn failed_ground_query_halts_without_mutation() {
        let mut c = LocomotionController::new(config(), LocomotionState::Fall);
        let mut body = TestBody { velocity: Vec3::new(0.0, -1.0, 0.0), writes: 0 };
        let ground = Ground::new(true);
        ground.fail.set(true);

        let err = c.update(0.1, input(0.0, 1.0, false), &level(), &mut body, &ground).unwrap_err();
        assert_eq!(err, LocomotionError::GroundQuery(QueryError::EmptyLayerMask));
        assert_eq!(c.state(), LocomotionState::Fall);
        assert_eq!(body.writes, 0);
        assert!(c.is_halted());

        ground.fail.set(false);
        assert_eq!(c.update(0.1, FrameInput::default(), &level(), &mut body, &ground), Err(LocomotionError::Halted));
        assert_eq!(body.writes, 0);
    }

    #[test]
    fn invalid_delta_time_is_rejected_but_not_fatal() {
        let mut c = LocomotionController::new(config(), LocomotionState::Walk);
        let mut body = TestBody::default();
        let ground = Ground::new(true);

        assert!(matches!(
            c.update(f32::NAN, FrameInput::default(), &level(), &mut body, &ground),
            Err(LocomotionError::InvalidDeltaTime(_))
        ));
        assert_eq!(body.writes, 0);
        assert!(!c.is_halted());
        assert_eq!(c.update(0.1, FrameInput::default(), &level(), &mut body, &ground), Ok(LocomotionState::Walk));
    }

    #[test]
    fn rise_does_not_probe_the_ground() {
        let mut c = LocomotionController::new(config(), LocomotionState::Rise);
        let mut body = TestBody { velocity: Vec3::new(0.0, 3.0, 0.0), writes: 0 };
        let ground = Ground::new(true);
        ground.fail.set(true);

        assert_eq!(c.update(0.1, FrameInput::default(), &level(), &mut body, &ground), Ok(LocomotionState::Rise));
    }

    #[test]
    fn invalid_constants_are_rejected() {
        assert!(MovementConfig::new(0.0, 5.0, 10.0, LayerMask::GROUND, 1.0).is_err());
        assert!(MovementConfig::new(4.0, 5.0, -1.0, LayerMask::GROUND, 1.0).is_err());
        assert!(MovementConfig::new(4.0, -5.0, 10.0, LayerMask::GROUND, 1.0).is_err());
        assert!(MovementConfig::new(4.0, 5.0, 10.0, LayerMask::GROUND, 0.0).is_err());
        assert!(MovementConfig::new(f32::NAN, 5.0, 10.0, LayerMask::GROUND, 1.0).is_err());
        assert!(config().with_probe_epsilon(-0.1).is_err());
    }
}

//! Startup: validated player components and the demo scene.
//!
//! Everything built from settings goes through [`PlayerKit::from_settings`]
//! before the app starts, so a bad configuration stops the game at launch
//! rather than in the middle of a frame.
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use stride::camera::{grab_cursor, ActiveCamera, CameraMode, CameraSelector, FirstPersonRig, RigHandle, ThirdPersonRig};
use stride::combat::{DamageKind, DamageSource, DespawnOnDeath, Health, Team};
use stride::error::ConfigError;
use stride::interaction::{Gun, Interactable, Interactor, ScreenRay, Tracer};
use stride::physics::{Collider, KinematicBody, LayerMask};
use stride::player::{LocomotionController, LocomotionState, MovementConfig, Player};
use stride::settings::Settings;

const PLAYER_TEAM: Team = Team(0);
const PLAYER_WIDTH: f32 = 0.8;

/// Player components, validated from settings.
#[derive(Resource, Debug, Clone)]
pub struct PlayerKit {
    pub movement: MovementConfig,
    pub initial_state: LocomotionState,
    pub first_person: FirstPersonRig,
    pub third_person: ThirdPersonRig,
    pub camera_mode: CameraMode,
    pub gun: Gun,
    pub interactor: Interactor,
    pub health: Health,
}

impl PlayerKit {
    /// # Errors
    /// The first invalid value found in `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let (ray, damage, tracer_seconds) = settings.weapon.to_parts()?;
        Ok(Self {
            movement: settings.movement.to_config()?,
            initial_state: settings.movement.initial_state,
            first_person: settings.camera.first_person_rig(&settings.controls)?,
            third_person: settings.camera.third_person_rig(&settings.controls)?,
            camera_mode: settings.camera.initial_mode,
            gun: Gun { ray, damage, tracer_seconds },
            interactor: Interactor {
                ray: ScreenRay::new(settings.interact.max_distance, settings.interact.hit_mask)?,
            },
            health: settings.player.health()?,
        })
    }

    /// Body collider matching the configured half height, so the ground
    /// probe ends just below the collider's base.
    #[must_use]
    pub fn body_collider(&self) -> Collider {
        let height = self.movement.half_height() * 2.0;
        Collider::cuboid(Vec3::new(PLAYER_WIDTH, height, PLAYER_WIDTH), LayerMask::PLAYER)
    }
}

struct Block {
    size: Vec3,
    at: Vec3,
    layers: LayerMask,
    color: Color,
}

fn spawn_block(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    block: &Block,
) -> Entity {
    commands
        .spawn((
            PbrBundle {
                mesh: meshes.add(Cuboid::new(block.size.x, block.size.y, block.size.z)),
                material: materials.add(block.color),
                transform: Transform::from_translation(block.at),
                ..default()
            },
            Collider::cuboid(block.size, block.layers),
        ))
        .id()
}

/// Spawn lights, level geometry, targets, the player and both camera rigs.
#[allow(clippy::needless_pass_by_value, clippy::too_many_lines)]
pub fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    kit: Res<PlayerKit>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight { shadows_enabled: true, illuminance: 8000.0, ..default() },
        transform: Transform::from_xyz(4.0, 10.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });
    commands.insert_resource(AmbientLight { color: Color::WHITE, brightness: 300.0 });

    // level
    let grey = Color::srgb(0.55, 0.55, 0.6);
    let level = [
        Block { size: Vec3::new(60.0, 1.0, 60.0), at: Vec3::new(0.0, -0.5, 0.0), layers: LayerMask::GROUND, color: Color::srgb(0.3, 0.5, 0.3) },
        Block { size: Vec3::new(4.0, 1.0, 4.0), at: Vec3::new(4.0, 0.5, -6.0), layers: LayerMask::OBSTACLE, color: grey },
        Block { size: Vec3::new(3.0, 2.5, 3.0), at: Vec3::new(8.0, 1.25, -10.0), layers: LayerMask::OBSTACLE, color: grey },
        Block { size: Vec3::new(1.0, 3.0, 8.0), at: Vec3::new(-6.0, 1.5, -4.0), layers: LayerMask::OBSTACLE, color: grey },
    ];
    for block in &level {
        spawn_block(&mut commands, &mut meshes, &mut materials, block);
    }

    // shootable targets
    for x in [-3.0, 0.0, 3.0] {
        let target = Block { size: Vec3::new(1.0, 2.0, 1.0), at: Vec3::new(x, 1.0, -14.0), layers: LayerMask::TARGET, color: Color::srgb(0.8, 0.2, 0.2) };
        let id = spawn_block(&mut commands, &mut meshes, &mut materials, &target);
        match Health::new(50.0) {
            Ok(health) => {
                commands.entity(id).insert((health, DespawnOnDeath));
            }
            Err(e) => error!("target health: {e}"),
        }
    }

    // hazard pad: flat slab the player walks through, hurts while standing in it
    let pad = Block { size: Vec3::new(3.0, 0.1, 3.0), at: Vec3::new(-4.0, 0.05, 4.0), layers: LayerMask::HAZARD, color: Color::srgb(0.9, 0.45, 0.1) };
    let pad = spawn_block(&mut commands, &mut meshes, &mut materials, &pad);
    commands.entity(pad).insert(DamageSource::new(15.0, DamageKind::OverTime));

    let station = Block { size: Vec3::new(1.0, 1.2, 1.0), at: Vec3::new(4.0, 0.6, 4.0), layers: LayerMask::OBSTACLE, color: Color::srgb(0.2, 0.8, 0.9) };
    let station = spawn_block(&mut commands, &mut meshes, &mut materials, &station);
    commands.entity(station).insert(Interactable { label: "healing station".to_string(), restore_health: 40.0 });

    // player
    let half_height = kit.movement.half_height();
    let radius = PLAYER_WIDTH * 0.5;
    let start = Vec3::new(0.0, half_height + 0.5, 6.0);
    commands.spawn((
        PbrBundle {
            mesh: meshes.add(Capsule3d::new(radius, (half_height - radius).max(0.0) * 2.0)),
            material: materials.add(Color::srgb(0.9, 0.85, 0.7)),
            transform: Transform::from_translation(start),
            ..default()
        },
        Player,
        kit.body_collider(),
        KinematicBody { velocity: Vec3::ZERO, collision_mask: LayerMask::GROUND | LayerMask::OBSTACLE },
        LocomotionController::new(kit.movement, kit.initial_state),
        kit.health,
        PLAYER_TEAM,
        kit.gun,
        Tracer::default(),
        kit.interactor,
    ));

    // cameras: both exist, the selector decides which one renders
    let first = commands
        .spawn((
            Camera3dBundle {
                camera: Camera { order: 0, is_active: kit.camera_mode == CameraMode::FirstPerson, ..default() },
                transform: kit.first_person.camera_transform(start),
                ..default()
            },
            kit.first_person,
        ))
        .id();
    let third = commands
        .spawn((
            Camera3dBundle {
                camera: Camera { order: 1, is_active: kit.camera_mode == CameraMode::ThirdPerson, ..default() },
                transform: kit.third_person.camera_transform(start),
                ..default()
            },
            kit.third_person,
        ))
        .id();

    match CameraSelector::new(Some(RigHandle::new(first)), Some(RigHandle::new(third)), kit.camera_mode) {
        Ok(selector) => {
            info!("camera: {}", selector.mode().label());
            commands.insert_resource(ActiveCamera(selector));
        }
        Err(e) => error!("camera setup failed: {e}"),
    }

    if let Ok(mut window) = windows.get_single_mut() {
        grab_cursor(&mut window);
    }
}

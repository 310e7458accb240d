use bevy::diagnostic::{FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin};
use bevy::prelude::*;
use bevy::window::{PresentMode, Window, WindowPlugin};
use std::path::Path;
use std::process::ExitCode;

use stride::camera::{
    apply_camera_activation, camera_look, cursor_grab, follow_first_person, follow_third_person,
    handle_camera_actions, sync_camera_facings, sync_rig_settings,
};
use stride::combat::{apply_contact_damage, despawn_dead, ContactLedger, DeathEvent};
use stride::debug::DebugDumpPlugin;
use stride::input::{emit_player_actions, sample_frame_input, sync_input_bindings, InputBindings, PlayerAction};
use stride::interaction::{apply_interactions, draw_tracers, fire_weapon, tick_tracers, try_interact, InteractEvent};
use stride::physics::integrate_bodies;
use stride::player::{player_locomotion, sync_movement_settings, FrameInput};
use stride::settings::loader as settings_loader;
use stride::ui::{setup_debug_overlay, spawn_hud, toggle_debug_overlay, update_debug_overlay, update_health_text};

mod app;
use app::{setup, PlayerKit};

const SETTINGS_DIR: &str = "data/settings";

fn main() -> ExitCode {
    let dir = Path::new(SETTINGS_DIR);
    let settings = match settings_loader::load_settings_from_dir(dir) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let kit = match PlayerKit::from_settings(&settings) {
        Ok(kit) => kit,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let settings_watcher = settings_loader::setup_settings_watcher(dir).unwrap_or_else(|e| {
        eprintln!("warning: settings hot-reload disabled: {e}");
        settings_loader::SettingsWatcher::stub(dir)
    });

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "stride".into(),
            position: WindowPosition::Centered(MonitorSelection::Primary),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }),
        ..default()
    }))
    .add_plugins(FrameTimeDiagnosticsPlugin)
    .add_plugins(LogDiagnosticsPlugin::default())
    .add_plugins(DebugDumpPlugin);

    app.add_event::<PlayerAction>();
    app.add_event::<InteractEvent>();
    app.add_event::<DeathEvent>();

    app.insert_resource(InputBindings::from_controls(&settings.controls));
    app.insert_resource(FrameInput::default());
    app.insert_resource(ContactLedger::default());
    app.insert_resource(kit);
    app.insert_resource(settings);
    app.insert_resource(settings_watcher);

    app.add_systems(Startup, (setup_debug_overlay, spawn_hud, setup));

    // input -> camera -> locomotion -> integration, in that order every frame
    app.add_systems(
        Update,
        (
            settings_loader::check_settings_changes,
            sync_input_bindings,
            sync_movement_settings,
            sync_rig_settings,
            sample_frame_input,
            emit_player_actions,
            cursor_grab,
            handle_camera_actions,
            camera_look,
            follow_first_person,
            follow_third_person,
            sync_camera_facings,
            apply_camera_activation,
            player_locomotion,
            integrate_bodies,
        )
            .chain(),
    );
    app.add_systems(
        Update,
        (
            fire_weapon,
            try_interact,
            apply_interactions,
            apply_contact_damage,
            despawn_dead,
            tick_tracers,
            draw_tracers,
        )
            .chain()
            .after(integrate_bodies),
    );
    app.add_systems(Update, (toggle_debug_overlay, update_debug_overlay, update_health_text));

    app.run();
    ExitCode::SUCCESS
}

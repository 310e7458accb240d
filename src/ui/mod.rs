//! User interface helpers: HUD, debug overlay and crosshair.
//!
//! The debug overlay (F1 by default) refreshes twice a second with FPS,
//! frame time and the player snapshot. The health readout and crosshair
//! are always on.

use bevy::diagnostic::DiagnosticsStore;
use bevy::prelude::*;

use crate::combat::Health;
use crate::debug::{frame_stats, PlayerProbe, PlayerSnapshot};
use crate::input::InputBindings;
use crate::player::Player;

/// State for the debug overlay visibility.
#[derive(Resource, Default)]
pub struct DebugOverlayState {
    /// Whether the overlay is currently visible.
    pub visible: bool,
}

#[derive(Resource, Default)]
pub struct DebugOverlayTimer(pub Timer);

#[derive(Component)]
pub struct DebugOverlayText;

#[derive(Component)]
pub struct HealthText;

/// Insert debug overlay resources.
pub fn setup_debug_overlay(mut commands: Commands) {
    commands.insert_resource(DebugOverlayTimer(Timer::from_seconds(0.5, TimerMode::Repeating)));
    commands.insert_resource(DebugOverlayState::default());
}

/// Toggle the debug overlay when its binding is pressed.
#[allow(clippy::needless_pass_by_value)]
pub fn toggle_debug_overlay(
    mut state: ResMut<DebugOverlayState>,
    bindings: Res<InputBindings>,
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
) {
    if bindings.toggle_debug.just_pressed(&keys, &mouse) {
        state.visible = !state.visible;
    }
}

/// Overlay body for one refresh.
#[must_use]
pub fn overlay_text((fps, frame_time_ms): (f64, f64), player: Option<&PlayerSnapshot>) -> String {
    let mut lines = vec![format!("FPS: {fps:.1}"), format!("Frame Time: {frame_time_ms:.2} ms")];
    match player {
        Some(p) => lines.extend(p.lines()),
        None => lines.push("Player: N/A".to_string()),
    }
    lines.join("\n")
}

#[derive(bevy::ecs::system::SystemParam)]
pub struct DebugOverlayCtx<'w, 's> {
    pub diagnostics: Option<Res<'w, DiagnosticsStore>>,
    pub state: Res<'w, DebugOverlayState>,
    pub time: Res<'w, Time>,
    pub timer: ResMut<'w, DebugOverlayTimer>,
    pub query: Query<'w, 's, &'static mut Text, With<DebugOverlayText>>,
    pub probe: PlayerProbe<'w, 's>,
}

/// Refresh the debug overlay text at a fixed interval.
pub fn update_debug_overlay(mut ctx: DebugOverlayCtx<'_, '_>) {
    if !ctx.timer.0.tick(ctx.time.delta()).just_finished() {
        return;
    }

    let Ok(mut text) = ctx.query.get_single_mut() else { return };

    if !ctx.state.visible {
        text.sections[0].value = String::new();
        return;
    }

    let stats = frame_stats(ctx.diagnostics.as_deref());
    text.sections[0].value = overlay_text(stats, ctx.probe.snapshot().as_ref());
}

/// Keep the health readout in step with the player's `Health`.
pub fn update_health_text(
    players: Query<&Health, (With<Player>, Changed<Health>)>,
    mut texts: Query<&mut Text, With<HealthText>>,
) {
    let Ok(health) = players.get_single() else { return };
    let Ok(mut text) = texts.get_single_mut() else { return };
    text.sections[0].value = if health.is_dead() {
        "DEAD".to_string()
    } else {
        format!("HP {:.0} / {:.0}", health.current(), health.max())
    };
}

/// Spawn the overlay and health text nodes. Uses Bevy's built-in font.
pub fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        TextBundle {
            text: Text::from_section(
                "",
                TextStyle { font_size: 18.0, color: Color::srgb(1.0, 1.0, 0.0), ..default() },
            ),
            style: Style {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                ..default()
            },
            ..default()
        },
        DebugOverlayText,
    ));

    commands.spawn((
        TextBundle {
            text: Text::from_section("", TextStyle { font_size: 24.0, color: Color::WHITE, ..default() }),
            style: Style {
                position_type: PositionType::Absolute,
                left: Val::Px(16.0),
                bottom: Val::Px(16.0),
                ..default()
            },
            ..default()
        },
        HealthText,
    ));

    spawn_crosshair(&mut commands);
}

/// Spawn a crosshair UI element centered on the screen.
pub fn spawn_crosshair(commands: &mut Commands) {
    commands
        .spawn(NodeBundle {
            style: Style {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            ..default()
        })
        .with_children(|p| {
            for (w, h) in [(16.0, 2.0), (2.0, 16.0)] {
                p.spawn(NodeBundle {
                    style: Style {
                        position_type: PositionType::Absolute,
                        width: Val::Px(w),
                        height: Val::Px(h),
                        ..default()
                    },
                    background_color: Color::WHITE.into(),
                    ..default()
                });
            }
        });
}

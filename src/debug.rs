//! Debug utilities, including a system (F3 default) that dumps diagnostics
//! and the player's movement state to a timestamped text file in './debug-dumps/'.
//!
//! The same [`PlayerSnapshot`] feeds the F1 overlay, so what is on screen
//! and what lands in the file always agree.
use bevy::diagnostic::{Diagnostic, DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use chrono::{DateTime, Local};
use std::fmt::Write;
use std::fs;
use std::path::PathBuf;
use sysinfo::{Pid, PidExt, ProcessExt, System, SystemExt};

use crate::camera::{ActiveCamera, CameraDirectionProvider, CameraMode};
use crate::combat::Health;
use crate::input::InputBindings;
use crate::physics::KinematicBody;
use crate::player::{LocomotionController, LocomotionState, Player};

/// Everything worth knowing about the player at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub position: Vec3,
    pub velocity: Vec3,
    pub state: LocomotionState,
    pub halted: bool,
    /// `(current, max)`, if the player can be damaged.
    pub health: Option<(f32, f32)>,
    pub camera: CameraMode,
    /// Heading of the active camera, degrees.
    pub heading_deg: f32,
}

impl PlayerSnapshot {
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let p = self.position;
        let v = self.velocity;
        let mut lines = vec![
            format!("Pos: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z),
            format!("Vel: ({:.2}, {:.2}, {:.2}) | speed {:.2}", v.x, v.y, v.z, v.length()),
            format!(
                "State: {}{}",
                self.state.label(),
                if self.halted { " (halted)" } else { "" }
            ),
            format!("Camera: {} | heading {:.0} deg", self.camera.label(), self.heading_deg),
        ];
        if let Some((current, max)) = self.health {
            lines.push(format!("Health: {current:.0} / {max:.0}"));
        }
        lines
    }
}

/// Read access to the player for diagnostics.
#[derive(SystemParam)]
pub struct PlayerProbe<'w, 's> {
    camera: Option<Res<'w, ActiveCamera>>,
    players: Query<
        'w,
        's,
        (&'static Transform, &'static KinematicBody, &'static LocomotionController, Option<&'static Health>),
        With<Player>,
    >,
}

impl PlayerProbe<'_, '_> {
    #[must_use]
    pub fn snapshot(&self) -> Option<PlayerSnapshot> {
        let (tf, body, controller, health) = self.players.get_single().ok()?;
        let (camera, heading_deg) = self
            .camera
            .as_ref()
            .map_or((CameraMode::default(), 0.0), |c| (c.mode(), c.active_facing().yaw().to_degrees()));
        Some(PlayerSnapshot {
            position: tf.translation,
            velocity: body.velocity,
            state: controller.state(),
            halted: controller.is_halted(),
            health: health.map(|h| (h.current(), h.max())),
            camera,
            heading_deg,
        })
    }
}

/// Smoothed `(fps, frame_time_ms)`, zero when unavailable.
#[must_use]
pub fn frame_stats(diagnostics: Option<&DiagnosticsStore>) -> (f64, f64) {
    let Some(d) = diagnostics else { return (0.0, 0.0) };
    let fps = d.get(&FrameTimeDiagnosticsPlugin::FPS).and_then(Diagnostic::smoothed).unwrap_or(0.0);
    let frame_time = d
        .get(&FrameTimeDiagnosticsPlugin::FRAME_TIME)
        .and_then(Diagnostic::smoothed)
        .unwrap_or(0.0);
    (fps, frame_time)
}

/// Host and process figures, all memory in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemStats {
    pub cores: usize,
    pub process_memory: u64,
    pub process_virtual_memory: u64,
    pub total_memory: u64,
    pub used_memory: u64,
}

impl SystemStats {
    /// Sample the current process and host. Slow; only for dumps.
    #[must_use]
    pub fn sample() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        let pid = Pid::from_u32(std::process::id());
        sys.refresh_process(pid);
        let process = sys.process(pid);
        Self {
            cores: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            process_memory: process.map_or(0, ProcessExt::memory),
            process_virtual_memory: process.map_or(0, ProcessExt::virtual_memory),
            total_memory: sys.total_memory(),
            used_memory: sys.used_memory(),
        }
    }
}

fn bytes_to_mb(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Body of a debug dump.
#[must_use]
pub fn dump_text(
    taken_at: DateTime<Local>,
    (fps, frame_time_ms): (f64, f64),
    entity_count: usize,
    system: &SystemStats,
    player: Option<&PlayerSnapshot>,
) -> String {
    let mut out = String::new();
    writeln!(out, "Debug dump: {}", taken_at.timestamp()).ok();
    writeln!(out, "Timestamp: {}", taken_at.format("%Y-%m-%d %H:%M:%S")).ok();
    writeln!(out, "FPS: {fps:.1}, frame_time: {frame_time_ms:.2} ms").ok();
    writeln!(out, "Entities: {entity_count}").ok();
    writeln!(out, "CPU cores (available): {}", system.cores).ok();
    writeln!(
        out,
        "Process memory: {} (virtual {})",
        bytes_to_mb(system.process_memory),
        bytes_to_mb(system.process_virtual_memory)
    )
    .ok();
    writeln!(
        out,
        "System memory: {} used / {} total",
        bytes_to_mb(system.used_memory),
        bytes_to_mb(system.total_memory)
    )
    .ok();
    writeln!(out, "\nPlayer:").ok();
    match player {
        Some(snapshot) => {
            for line in snapshot.lines() {
                writeln!(out, "  {line}").ok();
            }
        }
        None => {
            writeln!(out, "  (no player in the world)").ok();
        }
    }
    out
}

/// Where dumps are written.
#[derive(Resource, Debug, Clone)]
pub struct DebugDumpDir(pub PathBuf);

impl Default for DebugDumpDir {
    fn default() -> Self {
        Self(PathBuf::from("debug-dumps"))
    }
}

pub struct DebugDumpPlugin;

impl Plugin for DebugDumpPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DebugDumpDir>().add_systems(Update, debug_input_system);
    }
}

/// Write a dump when the dump binding (F3 by default) is pressed.
#[allow(clippy::needless_pass_by_value)]
fn debug_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    bindings: Res<InputBindings>,
    dir: Res<DebugDumpDir>,
    diagnostics: Option<Res<DiagnosticsStore>>,
    entities: Query<Entity>,
    probe: PlayerProbe,
) {
    if !bindings.dump_debug.just_pressed(&keys, &mouse) {
        return;
    }

    let now = Local::now();
    let text = dump_text(
        now,
        frame_stats(diagnostics.as_deref()),
        entities.iter().count(),
        &SystemStats::sample(),
        probe.snapshot().as_ref(),
    );
    let path = dir.0.join(format!("debug-{}.txt", now.format("%Y%m%d-%H%M%S")));

    if let Err(e) = fs::create_dir_all(&dir.0) {
        error!("debug dump: failed to create dir '{}': {e}", dir.0.display());
        return;
    }
    match fs::write(&path, text) {
        Ok(()) => info!("wrote debug dump: {}", path.display()),
        Err(e) => error!("debug dump: failed to write {}: {e}", path.display()),
    }
}

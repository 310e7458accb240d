//! Settings loading and hot-reloading.
//!
//! Settings are loaded from RON files in the `data/settings` directory. If
//! several files are present they are read in file-name order and the first
//! one that parses wins. With no files at all the defaults are used; a file
//! that exists but is broken is an error, so a typo never silently falls back.
use bevy::prelude::{info, warn, Res, ResMut, Resource};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::ron::{load_ron_files, setup_ron_watcher, RonWatcher};
use crate::settings::Settings;

/// Hot-reload handle plus the directory it reloads from.
#[derive(Resource)]
pub struct SettingsWatcher {
    pub watcher: RonWatcher,
    pub dir: PathBuf,
}

impl SettingsWatcher {
    #[must_use]
    pub fn stub(dir: impl Into<PathBuf>) -> Self {
        SettingsWatcher { watcher: RonWatcher::stub(), dir: dir.into() }
    }
}

/// Load and validate settings from `dir`.
///
/// # Errors
/// Every file failed to parse (the first error is returned), or the chosen
/// settings do not validate.
///
/// # Example
/// ```no_run
/// use stride::settings::loader::load_settings_from_dir;
/// let settings = load_settings_from_dir(std::path::Path::new("data/settings")).unwrap();
/// ```
pub fn load_settings_from_dir(dir: &Path) -> Result<Settings, ConfigError> {
    let mut first_error = None;
    for item in load_ron_files::<Settings>(dir) {
        match item {
            Ok(settings) => {
                settings.validate()?;
                return Ok(settings);
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(Settings::defaults()),
    }
}

/// Create a watcher for the settings directory (hot-reload).
///
/// # Errors
/// The directory could not be watched.
pub fn setup_settings_watcher(dir: &Path) -> Result<SettingsWatcher, notify::Error> {
    setup_ron_watcher(dir).map(|watcher| SettingsWatcher { watcher, dir: dir.to_path_buf() })
}

/// Reload the `Settings` resource when the watched files change.
///
/// A reload that fails keeps the current settings and logs why.
#[allow(clippy::needless_pass_by_value)]
pub fn check_settings_changes(watcher: Res<SettingsWatcher>, mut settings: ResMut<Settings>) {
    if !watcher.watcher.take_changed() {
        return;
    }
    match load_settings_from_dir(&watcher.dir) {
        Ok(new_settings) => {
            info!("Settings changed, reloaded from {}", watcher.dir.display());
            *settings = new_settings;
        }
        Err(e) => warn!("Settings reload rejected, keeping previous values: {e}"),
    }
}

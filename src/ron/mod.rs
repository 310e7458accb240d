//! Utilities for loading RON files and watching directories for changes.
//!
//! Reading is strict: a file that fails to parse is an error the caller
//! decides about, never silently replaced. The watcher only raises a flag;
//! the owning system reloads on its own schedule.

use bevy::prelude::Resource;
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::ConfigError;

/// File-watcher resource for RON hot-reload.
#[derive(Resource)]
pub struct RonWatcher {
    changed: Arc<AtomicBool>,              // Set when a watched file changes.
    _watcher: Option<RecommendedWatcher>, // Kept alive for as long as the resource.
}

impl RonWatcher {
    /// A watcher with no OS handle behind it. Used when the directory cannot
    /// be watched; it never reports a change on its own.
    #[must_use]
    pub fn stub() -> Self {
        RonWatcher { changed: Arc::new(AtomicBool::new(false)), _watcher: None }
    }

    /// Return whether anything changed since the last call and clear the flag.
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }

    /// Raise the flag by hand, as a file event would.
    pub fn mark_changed(&self) {
        self.changed.store(true, Ordering::Release);
    }
}

/// Deserialize `content`, tagging errors with `path`.
///
/// # Errors
/// [`ConfigError::Parse`] if the text is not valid RON for `T`.
pub fn parse_ron<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T, ConfigError> {
    ron::from_str::<T>(content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Read and deserialize a single RON file.
///
/// # Errors
/// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`] if
/// it does not deserialize.
pub fn load_ron_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_ron(path, &content)
}

/// Every `.ron` file directly inside `dir`, sorted by file name.
///
/// A missing directory yields an empty list.
#[must_use]
pub fn ron_files_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    files.sort();
    files
}

/// Load all `.ron` files from a directory, in file-name order.
///
/// Each entry carries its own result so the caller can report bad files
/// and still use the good ones.
#[must_use]
pub fn load_ron_files<T: DeserializeOwned>(dir: &Path) -> Vec<Result<T, ConfigError>> {
    ron_files_in(dir).iter().map(|p| load_ron_file(p)).collect()
}

/// Create a `RonWatcher` that watches a directory for modifications.
///
/// Only create/modify events under the watched directory raise the flag.
///
/// # Errors
/// Returns a `notify::Error` if the underlying file-watcher cannot be
/// created or the watcher cannot be registered for the provided path.
pub fn setup_ron_watcher(path: &Path) -> Result<RonWatcher, notify::Error> {
    let changed = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&changed);
    let watched: PathBuf = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

    let mut watcher: RecommendedWatcher = Watcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(event.kind, notify::EventKind::Modify(_) | notify::EventKind::Create(_)) {
                    return;
                }
                let relevant = event.paths.iter().any(|p| {
                    std::fs::canonicalize(p).unwrap_or_else(|_| p.clone()).starts_with(&watched)
                });
                if relevant {
                    flag.store(true, Ordering::Release);
                }
            }
            Err(e) => eprintln!("Watch error: {e:?}"),
        },
        Config::default(),
    )?;

    watcher.watch(path, RecursiveMode::NonRecursive)?;
    Ok(RonWatcher { changed, _watcher: Some(watcher) })
}

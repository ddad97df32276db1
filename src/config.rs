use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{NoteColor, NotesError, Result, SettingsUpdate, SortOption, ThemeMode, ViewMode};

/// User-facing settings persisted alongside the notes.
///
/// Every field falls back to its default when missing, so settings written by
/// an older version (e.g. without `theme`) keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub view_mode: ViewMode,
    pub sort_option: SortOption,
    pub default_note_color: NoteColor,
    pub haptics_enabled: bool,
    pub theme: ThemeMode,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Grid,
            sort_option: SortOption::Date,
            default_note_color: NoteColor::Default,
            haptics_enabled: true,
            theme: ThemeMode::Auto,
        }
    }
}

impl AppSettings {
    /// Merges the present fields of `update` into these settings.
    pub fn merge(&mut self, update: SettingsUpdate) {
        if let Some(view_mode) = update.view_mode {
            self.view_mode = view_mode;
        }
        if let Some(sort_option) = update.sort_option {
            self.sort_option = sort_option;
        }
        if let Some(color) = update.default_note_color {
            self.default_note_color = color;
        }
        if let Some(haptics) = update.haptics_enabled {
            self.haptics_enabled = haptics;
        }
        if let Some(theme) = update.theme {
            self.theme = theme;
        }
    }
}

/// Process configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted key-value files
    pub data_dir: PathBuf,

    /// How many times a failed storage write is retried before it is dropped
    pub write_retries: u32,

    /// Delay before the first retry, doubled on each following attempt (ms)
    pub retry_backoff_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            write_retries: 2,
            retry_backoff_ms: 100,
        }
    }
}

impl Config {
    /// Loads configuration from a JSON file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No configuration file given, using defaults");
            return Ok(Self::default());
        };

        info!("Loading configuration from {}", path.display());
        let raw = fs::read_to_string(path).map_err(|e| NotesError::ConfigError {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;

        serde_json::from_str(&raw).map_err(|e| NotesError::ConfigError {
            message: format!("Invalid configuration in {}: {}", path.display(), e),
        })
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

// Platform data directory, or the working directory if none can be resolved
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("dev", "pocketnotes", "pocketnotes")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".pocketnotes"))
}

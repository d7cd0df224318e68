//! Persisted preferences.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use home::home_dir;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Probe System Events before toggling, for a friendlier permission error.
    pub preflight_permission_check: bool,
    pub toggle_timeout_secs: u64,
    /// How often the appearance watcher polls.
    pub watch_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preflight_permission_check: true,
            toggle_timeout_secs: 10,
            watch_interval_ms: 1500,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        home_dir().map(|h| {
            h.join("Library")
                .join("Application Support")
                .join("ThemeSwitcher")
                .join("settings.json")
        })
    }

    /// Load from the default location; anything unreadable falls back to defaults.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("ignoring invalid settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("home directory not found")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("Create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("Serialize settings")?;
        fs::write(path, json).with_context(|| format!("Write {:?}", path))?;
        Ok(())
    }

    pub fn toggle_timeout(&self) -> Duration {
        Duration::from_secs(self.toggle_timeout_secs.max(1))
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms.max(100))
    }
}

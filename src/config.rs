//! Application configuration module
//!
//! Start-up configuration (which settings node to open, timings, logging)
//! stored with `confy` in the OS-specific config directory. Per-view
//! preferences such as window geometry live in the settings store instead.

use crate::constant::{
    APP_NAME, APP_ORGANIZATION, APP_QUALIFIER, BACKGROUND_DIR, DEFAULT_SETTINGS_NODE,
    DEFAULT_SETTLE_DELAY_MS, DEFAULT_UNLOCK_DELAY_MS, DEFAULT_VIEW_NAME, DEFAULT_WINDOW_HEIGHT,
    DEFAULT_WINDOW_WIDTH,
};
use crate::resize::ResizeDelays;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Confy(#[from] confy::ConfyError),
}

pub struct Config {
    pub settings: AppSettings,
}

impl Config {
    /// Load configuration from disk, creating default if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        let settings: AppSettings = confy::load(APP_NAME, None)?;
        info!("Load config from {:?}", Self::config_path()?);
        Ok(Self { settings })
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(confy::get_configuration_file_path(APP_NAME, None)?)
    }

    /// Get the application data directory
    /// Falls back to a local "data" directory if platform dirs are unavailable
    pub fn data_dir(&self) -> PathBuf {
        if let Some(proj_dirs) = ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME) {
            proj_dirs.data_dir().to_path_buf()
        } else {
            PathBuf::from("data")
        }
    }

    /// Folder scanned for background images when none was chosen yet
    pub fn default_background_dir(&self) -> PathBuf {
        self.data_dir().join(BACKGROUND_DIR)
    }

    pub fn resize_delays(&self) -> ResizeDelays {
        ResizeDelays {
            settle: Duration::from_millis(self.settings.settle_delay_ms),
            unlock: Duration::from_millis(self.settings.unlock_delay_ms),
        }
    }

    /// Level for the tracing subscriber; unknown names fall back to INFO
    pub fn log_level(&self) -> tracing::Level {
        self.settings
            .log_level
            .parse()
            .unwrap_or(tracing::Level::INFO)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::load().unwrap_or_else(|_| Self {
            settings: AppSettings::default(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Name of the preference node holding per-view settings
    #[serde(default = "default_settings_node")]
    pub settings_node: String,

    /// View identifier of the main window; its geometry keys derive from it
    #[serde(default = "default_view_name")]
    pub view_name: String,

    /// Quiet time before the other side of the window is corrected
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Time the resize locks are held after a correction
    #[serde(default = "default_unlock_delay_ms")]
    pub unlock_delay_ms: u64,

    /// Window size used when no geometry was stored
    #[serde(default = "default_window_size")]
    pub default_window_size: [f32; 2],

    /// tracing level: error, warn, info, debug or trace
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_settings_node() -> String {
    DEFAULT_SETTINGS_NODE.to_string()
}

fn default_view_name() -> String {
    DEFAULT_VIEW_NAME.to_string()
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

fn default_unlock_delay_ms() -> u64 {
    DEFAULT_UNLOCK_DELAY_MS
}

fn default_window_size() -> [f32; 2] {
    [DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            settings_node: default_settings_node(),
            view_name: default_view_name(),
            settle_delay_ms: default_settle_delay_ms(),
            unlock_delay_ms: default_unlock_delay_ms(),
            default_window_size: default_window_size(),
            log_level: default_log_level(),
        }
    }
}

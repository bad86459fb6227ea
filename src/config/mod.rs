//! Configuration module for faderlink
//!
//! This module handles the user-edited configuration file and the values
//! derived from it:
//! - [`Config`] - one immutable snapshot of the TOML file
//! - [`ConnectionParameters`] - what the serial link is opened with
//! - [`ConfigWatcher`] - pushes a fresh snapshot whenever the file changes
//!
//! # File Format
//!
//! ```toml
//! invert_sliders = false
//! noise_reduction = "default"   # low | default | high
//!
//! [connection]
//! port = "/dev/ttyUSB0"
//! baud_rate = 9600
//!
//! [button_mapping]
//! 0 = ["VK_MEDIA_PLAY_PAUSE"]
//! 1 = ["CTRL", "VK_BROWSER_REFRESH"]
//! 2 = ["toggle-mic-mute"]
//! ```
//!
//! # App Data Location
//!
//! Log files are written under the platform data directory:
//! - **Linux**: `~/.local/share/dev.faderlink/`
//! - **macOS**: `~/Library/Application Support/dev.faderlink/`
//! - **Windows**: `%APPDATA%\dev.faderlink\`

pub mod watcher;

pub use watcher::ConfigWatcher;

use crate::actions::ButtonMapping;
use crate::error::{BridgeError, Result};
use crate::types::NoiseReductionLevel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.faderlink";

/// Default configuration filename, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Default serial baud rate
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Read timeout when the platform returns reads immediately (min read size 0)
const IMMEDIATE_READ_TIMEOUT: Duration = Duration::from_millis(5);

/// Read timeout when reads wait for at least one byte
const BLOCKING_READ_TIMEOUT: Duration = Duration::from_millis(25);

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Get the directory log files are written to
pub fn log_dir() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join("logs"))
}

// ==================== Connection Parameters ====================

/// Parameters the serial link is opened with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    /// Port identifier, e.g. `COM4` or `/dev/ttyUSB0`
    pub port: String,
    pub baud_rate: u32,
    /// Always 8
    pub data_bits: u8,
    /// Always 1
    pub stop_bits: u8,
    /// 0 on Windows, where buffering otherwise adds lag; 1 elsewhere to
    /// keep reads from congesting
    pub min_read_size: usize,
}

impl ConnectionParameters {
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            data_bits: 8,
            stop_bits: 1,
            min_read_size: if cfg!(windows) { 0 } else { 1 },
        }
    }

    /// True if both parameter sets address the same link at the same speed.
    ///
    /// Only port and baud rate count; anything else can change without a
    /// reconnect.
    pub fn same_link(&self, other: &ConnectionParameters) -> bool {
        self.port == other.port && self.baud_rate == other.baud_rate
    }

    /// How long a single read may wait before returning empty-handed
    pub fn read_timeout(&self) -> Duration {
        if self.min_read_size == 0 {
            IMMEDIATE_READ_TIMEOUT
        } else {
            BLOCKING_READ_TIMEOUT
        }
    }
}

// ==================== Config Snapshot ====================

/// `[connection]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

/// One snapshot of the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub connection: ConnectionInfo,

    /// Report slider positions as `1.0 - value`
    #[serde(default)]
    pub invert_sliders: bool,

    #[serde(default)]
    pub noise_reduction: NoiseReductionLevel,

    /// Button index (as a string key) -> action tokens
    #[serde(default)]
    pub button_mapping: HashMap<String, Vec<String>>,
}

impl Config {
    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| BridgeError::Config(format!("Failed to parse config: {}", e)))?;

        if config.connection.port.trim().is_empty() {
            return Err(BridgeError::Config("connection.port must not be empty".to_string()));
        }

        Ok(config)
    }

    /// Parameters for opening the serial link
    pub fn connection_parameters(&self) -> ConnectionParameters {
        ConnectionParameters::new(self.connection.port.trim(), self.connection.baud_rate)
    }

    /// Button mapping keyed by channel index.
    ///
    /// Keys that are not a channel index are skipped with a warning, and
    /// empty tokens are dropped.
    pub fn button_mapping(&self) -> ButtonMapping {
        let mut mapping = ButtonMapping::new();
        for (key, tokens) in &self.button_mapping {
            let Ok(button_id) = key.trim().parse::<usize>() else {
                tracing::warn!("Ignoring button mapping with non-numeric key {:?}", key);
                continue;
            };
            let tokens: Vec<String> = tokens
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            mapping.insert(button_id, tokens);
        }
        mapping
    }
}

//! Race configuration and track loading.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use shared::{GridTrack, VehicleConfig};
use std::fs;
use std::path::Path;

pub const DEFAULT_PORT: u16 = 1234;
pub const DEFAULT_COUNTDOWN_SECS: u64 = 3;

/// Everything needed to host one race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Connections required before the race starts.
    pub vehicles: usize,
    /// Seconds between the roster filling up and the `go` signal.
    pub countdown_secs: u64,
    /// Ticks between summary lines from the log renderer.
    pub summary_every: u64,
    pub vehicle: VehicleConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            vehicles: 1,
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            summary_every: 100,
            vehicle: VehicleConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Loads a JSON config; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Loads an ASCII track map, or builds the default ring sized to the playfield.
pub fn load_track(
    path: Option<&Path>,
    scale: u32,
    vehicle: &VehicleConfig,
) -> Result<GridTrack, ConfigError> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(GridTrack::from_ascii(&text, scale)?)
        }
        None => Ok(GridTrack::ring(
            vehicle.playfield_width as u32,
            vehicle.playfield_height as u32,
        )),
    }
}

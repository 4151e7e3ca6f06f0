use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::core::{ConnectionType, VehicleStatus, Waypoint};
use crate::input::load_routes;
use crate::map::{SegmentStyle, TileLayer};
use crate::playback::{PauseMode, Speed, BASE_INTERVAL};
use crate::routes::{RouteKey, RouteTable};
use crate::storage::JsonFileStore;

/// Scripted positions fed to the controller in place of a device fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    pub enabled: bool,
    pub samples: Vec<Waypoint>,
    pub poll_interval_ms: u64,
    pub repeat_last: bool,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            samples: vec![Waypoint::new(51.5, -0.1)],
            poll_interval_ms: 5000,
            repeat_last: false,
        }
    }
}

impl GeolocationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Persistent application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Tick period at speed 1
    pub base_interval_ms: u64,
    pub default_route: RouteKey,
    pub default_speed: Speed,
    pub pause_mode: PauseMode,
    pub zoom: u8,
    pub tile_layer: TileLayer,
    pub trail_style: SegmentStyle,
    pub status: VehicleStatus,
    pub connection: ConnectionType,
    /// Position store location, defaults to the platform data directory
    pub storage_path: Option<PathBuf>,
    /// Route table file (JSON or CSV) replacing the built-in routes
    pub routes_path: Option<PathBuf>,
    pub geolocation: GeolocationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: BASE_INTERVAL.as_millis() as u64,
            default_route: RouteKey::Today,
            default_speed: Speed::default(),
            pause_mode: PauseMode::default(),
            zoom: 13,
            tile_layer: TileLayer::default(),
            trail_style: SegmentStyle::default(),
            status: VehicleStatus::default(),
            connection: ConnectionType::default(),
            storage_path: None,
            routes_path: None,
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vehicle-tracker").join("config.json"))
    }

    /// Load from the platform config directory, falling back to defaults
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                warn!("Using default configuration: {:#}", e);
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    /// Routes from `routes_path`, or the built-in demo table
    pub fn route_table(&self) -> Result<RouteTable> {
        match &self.routes_path {
            Some(path) => load_routes(path, self.default_route),
            None => Ok(RouteTable::builtin()),
        }
    }

    /// Where the position store lives, if anywhere
    pub fn storage_path(&self) -> Option<PathBuf> {
        self.storage_path.clone().or_else(JsonFileStore::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.base_interval(), BASE_INTERVAL);
        assert_eq!(config.base_interval_ms, 2000);
        assert_eq!(config.default_route, RouteKey::Today);
        assert_eq!(config.default_speed.get(), 1);
        assert_eq!(config.pause_mode, PauseMode::SkipTicks);
        assert_eq!(config.zoom, 13);
        assert_eq!(config.tile_layer.max_zoom, 19);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"default_route": "lastWeek", "default_speed": 3, "pause_mode": "stop_timer", "status": {"battery_percent": 40}}"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_route, RouteKey::LastWeek);
        assert_eq!(config.default_speed.get(), 3);
        assert_eq!(config.pause_mode, PauseMode::StopTimer);
        assert_eq!(config.status.battery_percent, 40);
        assert_eq!(config.status.label, "Moving");
        assert_eq!(config.base_interval_ms, 2000);
    }

    #[test]
    fn test_invalid_speed_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"default_speed": 7}"#).unwrap();

        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.json");

        let mut config = AppConfig::default();
        config.connection = ConnectionType::Wifi;
        config.save_to(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_route_table_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let routes = dir.path().join("routes.csv");
        fs::write(&routes, "route,lat,lon\ncustom,1.0,2.0\ncustom,1.5,2.5\n").unwrap();

        let config = AppConfig {
            default_route: RouteKey::Custom,
            routes_path: Some(routes),
            ..AppConfig::default()
        };
        let table = config.route_table().unwrap();
        assert_eq!(table.get(RouteKey::Today).name(), "custom");
        assert_eq!(table.get(RouteKey::Custom).len(), 2);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::Waypoint;

/// Cosmetic status fields shown next to the vehicle.
///
/// These are configured demo values and are never derived from movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleStatus {
    pub label: String,
    pub battery_percent: u8,
    pub distance_km: f64,
}

impl Default for VehicleStatus {
    fn default() -> Self {
        Self {
            label: "Moving".to_string(),
            battery_percent: 78,
            distance_km: 12.5,
        }
    }
}

/// Live state of the simulated vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    /// Last position emitted by playback (or seeded from geolocation)
    pub position: Option<Waypoint>,
    /// Index of the waypoint at `position` within the active route
    pub route_index: usize,
    pub status: VehicleStatus,
    pub updated_at: Option<DateTime<Utc>>,
}

impl VehicleState {
    pub fn new(status: VehicleStatus) -> Self {
        Self {
            position: None,
            route_index: 0,
            status,
            updated_at: None,
        }
    }

    pub fn apply_position(&mut self, index: usize, position: Waypoint) {
        self.position = Some(position);
        self.route_index = index;
        self.updated_at = Some(Utc::now());
    }
}

/// Connection type selector. Display only, has no effect on playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    #[default]
    Gps,
    Gsm,
    Wifi,
}

impl FromStr for ConnectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gps" => Ok(ConnectionType::Gps),
            "gsm" => Ok(ConnectionType::Gsm),
            "wifi" => Ok(ConnectionType::Wifi),
            other => Err(format!("unknown connection type: {}", other)),
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionType::Gps => "GPS",
            ConnectionType::Gsm => "GSM",
            ConnectionType::Wifi => "WiFi",
        };
        f.write_str(name)
    }
}

/// Snapshot for the status panel
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReadout {
    pub route: String,
    pub speed: u8,
    pub playing: bool,
    pub paused: bool,
    pub connection: ConnectionType,
    pub position: Option<Waypoint>,
    pub updated_at: Option<DateTime<Utc>>,
    pub status: VehicleStatus,
}

impl fmt::Display for StatusReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let playback = match (self.playing, self.paused) {
            (false, _) => "stopped",
            (true, true) => "paused",
            (true, false) => "playing",
        };
        write!(
            f,
            "{} | battery {}% | distance {:.1} km | {} | route {} x{} {}",
            self.status.label,
            self.status.battery_percent,
            self.status.distance_km,
            self.connection,
            self.route,
            self.speed,
            playback,
        )?;
        if let Some(position) = self.position {
            write!(f, " at {}", position)?;
        }
        if let Some(updated_at) = self.updated_at {
            write!(f, " (updated {})", updated_at.format("%H:%M:%S"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_type_parse() {
        assert_eq!("GPS".parse::<ConnectionType>(), Ok(ConnectionType::Gps));
        assert_eq!("wifi".parse::<ConnectionType>(), Ok(ConnectionType::Wifi));
        assert!("lora".parse::<ConnectionType>().is_err());
    }

    #[test]
    fn test_apply_position_updates_index() {
        let mut state = VehicleState::new(VehicleStatus::default());
        state.apply_position(3, Waypoint::new(51.52, -0.14));
        assert_eq!(state.route_index, 3);
        assert_eq!(state.position, Some(Waypoint::new(51.52, -0.14)));
        assert!(state.updated_at.is_some());
    }

    #[test]
    fn test_readout_display() {
        let readout = StatusReadout {
            route: "today".to_string(),
            speed: 2,
            playing: true,
            paused: true,
            connection: ConnectionType::Gsm,
            position: None,
            updated_at: None,
            status: VehicleStatus::default(),
        };
        let text = readout.to_string();
        assert!(text.contains("battery 78%"));
        assert!(text.contains("GSM"));
        assert!(text.contains("x2 paused"));
        assert!(!text.contains("updated"));
    }

    #[test]
    fn test_readout_display_with_position() {
        let updated_at = DateTime::parse_from_rfc3339("2024-05-01T09:15:30Z")
            .unwrap()
            .with_timezone(&Utc);
        let readout = StatusReadout {
            route: "lastWeek".to_string(),
            speed: 1,
            playing: true,
            paused: false,
            connection: ConnectionType::Gps,
            position: Some(Waypoint::new(51.495, -0.1)),
            updated_at: Some(updated_at),
            status: VehicleStatus::default(),
        };
        let text = readout.to_string();
        assert!(text.ends_with("route lastWeek x1 playing at (51.49500, -0.10000) (updated 09:15:30)"));
    }
}

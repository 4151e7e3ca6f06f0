use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{TrackerError, TrackerResult};

/// A latitude/longitude pair in decimal degrees
///
/// Serialized as a two-field record, which is also the persisted form of
/// the user's last known position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl Waypoint {
    pub const ORIGIN: Waypoint = Waypoint { latitude: 0.0, longitude: 0.0 };

    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Create a waypoint, rejecting non-finite or out-of-range values
    pub fn try_new(latitude: f64, longitude: f64) -> TrackerResult<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if valid {
            Ok(Self { latitude, longitude })
        } else {
            Err(TrackerError::InvalidCoordinate { latitude, longitude })
        }
    }

    /// Whether this looks like a real position fix.
    ///
    /// A zero latitude or longitude is what an idle geolocation source
    /// reports before it has a fix, so both must be non-zero.
    pub fn is_fix(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude != 0.0
            && self.longitude != 0.0
    }
}

impl From<[f64; 2]> for Waypoint {
    fn from([latitude, longitude]: [f64; 2]) -> Self {
        Self { latitude, longitude }
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// An ordered, fixed sequence of waypoints replayed by the playback engine
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    name: String,
    waypoints: Vec<Waypoint>,
}

impl Route {
    pub fn new(name: impl Into<String>, waypoints: Vec<Waypoint>) -> Self {
        Self {
            name: name.into(),
            waypoints,
        }
    }

    /// Build a route from `[latitude, longitude]` pairs
    pub fn from_pairs(name: impl Into<String>, pairs: &[[f64; 2]]) -> Self {
        Self::new(name, pairs.iter().copied().map(Waypoint::from).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

pub mod engine;
pub mod session;

pub use engine::{PlaybackEngine, TickOutcome};
pub use session::{PlaybackSession, SessionHandle, SessionTick};

use crate::core::Waypoint;
use crate::error::TrackerError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tick cadence at speed 1
pub const BASE_INTERVAL: Duration = Duration::from_millis(2000);

/// Playback state of a running engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    Playing,
    Paused,
}

/// What happens to the timer while playback is paused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseMode {
    /// Timer keeps firing; ticks are skipped until resumed
    #[default]
    SkipTicks,
    /// Timer is cancelled on pause and rescheduled one period after resume
    StopTimer,
}

/// Playback speed multiplier, bounded to 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Speed(u8);

impl Speed {
    pub const MIN: Speed = Speed(1);
    pub const MAX: Speed = Speed(5);

    pub fn new(multiplier: u8) -> Result<Self, TrackerError> {
        if (Self::MIN.0..=Self::MAX.0).contains(&multiplier) {
            Ok(Speed(multiplier))
        } else {
            Err(TrackerError::InvalidSpeed(multiplier))
        }
    }

    /// Bound raw numeric input from the speed control into range
    pub fn clamped(value: i64) -> Self {
        Speed(value.clamp(Self::MIN.0 as i64, Self::MAX.0 as i64) as u8)
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Tick period for this multiplier, never shorter than 1ms
    pub fn interval(&self, base: Duration) -> Duration {
        (base / self.0 as u32).max(Duration::from_millis(1))
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::MIN
    }
}

impl TryFrom<u8> for Speed {
    type Error = TrackerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Speed::new(value)
    }
}

impl From<Speed> for u8 {
    fn from(speed: Speed) -> Self {
        speed.0
    }
}

/// Output of a playback tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    /// The vehicle moved to `position`, which is `route[index]`
    Position { index: usize, position: Waypoint },
    /// Trail segment from the previous waypoint to the current one
    Segment { from: Waypoint, to: Waypoint },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_bounds() {
        assert!(Speed::new(0).is_err());
        assert!(Speed::new(6).is_err());
        assert_eq!(Speed::new(3).unwrap().get(), 3);
        assert_eq!(Speed::clamped(-4), Speed::MIN);
        assert_eq!(Speed::clamped(12), Speed::MAX);
    }

    #[test]
    fn test_speed_interval() {
        assert_eq!(Speed::MIN.interval(BASE_INTERVAL), Duration::from_millis(2000));
        assert_eq!(Speed::new(2).unwrap().interval(BASE_INTERVAL), Duration::from_millis(1000));
        assert_eq!(Speed::new(4).unwrap().interval(BASE_INTERVAL), Duration::from_millis(500));
        assert_eq!(Speed::MAX.interval(BASE_INTERVAL), Duration::from_millis(400));
        assert_eq!(Speed::MAX.interval(Duration::ZERO), Duration::from_millis(1));
    }

    #[test]
    fn test_speed_deserialize_rejects_out_of_range() {
        assert_eq!(serde_json::from_str::<Speed>("2").unwrap(), Speed::new(2).unwrap());
        assert!(serde_json::from_str::<Speed>("9").is_err());
    }

    #[test]
    fn test_pause_mode_serde_names() {
        assert_eq!(serde_json::to_string(&PauseMode::StopTimer).unwrap(), "\"stop_timer\"");
        assert_eq!(
            serde_json::from_str::<PauseMode>("\"skip_ticks\"").unwrap(),
            PauseMode::SkipTicks
        );
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::Waypoint;

/// One position report for the user's own device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoSample {
    pub position: Waypoint,
    /// When the fix was taken
    pub timestamp: DateTime<Utc>,
}

impl GeoSample {
    pub fn new(position: Waypoint) -> Self {
        Self {
            position,
            timestamp: Utc::now(),
        }
    }
}

/// Trait for device position providers
///
/// A source is a lazy, non-restartable sequence: once `next_sample`
/// returns `None` the caller must not poll it again.
#[async_trait]
pub trait GeolocationSource: Send {
    /// Get the name/identifier of this source
    fn name(&self) -> &str;

    /// Wait for the next position sample
    async fn next_sample(&mut self) -> Option<GeoSample>;
}

/// Source for hosts without positioning. Never produces a sample.
#[derive(Debug, Default)]
pub struct UnavailableGeolocation;

#[async_trait]
impl GeolocationSource for UnavailableGeolocation {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn next_sample(&mut self) -> Option<GeoSample> {
        info!("Geolocation unavailable");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_source_yields_nothing() {
        let mut source = UnavailableGeolocation;
        assert_eq!(source.name(), "unavailable");
        assert!(source.next_sample().await.is_none());
    }
}

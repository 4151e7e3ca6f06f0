use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

use crate::core::Waypoint;
use crate::sources::{GeoSample, GeolocationSource};

/// Geolocation source replaying a fixed list of positions
///
/// The first sample is delivered immediately and the rest one poll
/// interval apart. With `repeat_last` enabled the final position keeps
/// being reported, the way a stationary device does under a position
/// watch; otherwise the source ends after the last sample.
///
/// `next_sample` is cancel-safe: the pacing deadline is stored, and a
/// sample is only taken off the script once that deadline has passed.
pub struct ScriptedGeolocation {
    name: String,
    samples: VecDeque<Waypoint>,
    poll_interval: Duration,
    repeat_last: bool,
    last: Option<Waypoint>,
    next_due: Option<Instant>,
}

impl ScriptedGeolocation {
    pub fn new(name: &str, samples: Vec<Waypoint>, poll_interval: Duration) -> Self {
        Self {
            name: name.to_string(),
            samples: samples.into(),
            poll_interval,
            repeat_last: false,
            last: None,
            next_due: None,
        }
    }

    /// Keep reporting the final position after the script runs out
    pub fn set_repeat_last(&mut self, enabled: bool) {
        self.repeat_last = enabled;
    }

    /// Number of scripted samples not yet delivered
    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

#[async_trait]
impl GeolocationSource for ScriptedGeolocation {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_sample(&mut self) -> Option<GeoSample> {
        if self.samples.is_empty() && !(self.repeat_last && self.last.is_some()) {
            debug!("Geolocation script '{}' exhausted", self.name);
            return None;
        }

        if let Some(due) = self.next_due {
            time::sleep_until(due).await;
        }

        let position = self.samples.pop_front().or(self.last)?;
        self.last = Some(position);
        self.next_due = Some(Instant::now() + self.poll_interval);
        trace!("Scripted fix {} ({} left)", position, self.remaining());

        Some(GeoSample::new(position))
    }
}

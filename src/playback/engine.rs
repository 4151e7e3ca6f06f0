use crate::core::{Route, Waypoint};
use crate::error::{TrackerError, TrackerResult};
use crate::playback::{PlaybackEvent, PlaybackState};
use std::sync::Arc;

/// Result of a single timer tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Paused; nothing advanced
    Skipped,
    Advanced {
        index: usize,
        position: Waypoint,
        /// `(route[index - 1], route[index])`, absent on index 0
        segment: Option<(Waypoint, Waypoint)>,
    },
}

impl TickOutcome {
    /// Events for this tick, position update first
    pub fn events(&self) -> Vec<PlaybackEvent> {
        match *self {
            TickOutcome::Skipped => Vec::new(),
            TickOutcome::Advanced { index, position, segment } => {
                let mut events = vec![PlaybackEvent::Position { index, position }];
                if let Some((from, to)) = segment {
                    events.push(PlaybackEvent::Segment { from, to });
                }
                events
            }
        }
    }
}

/// Cyclic route playback state machine.
///
/// Holds no timer; each call to [`PlaybackEngine::tick`] is one timer firing.
#[derive(Debug)]
pub struct PlaybackEngine {
    route: Arc<Route>,
    state: PlaybackState,
    current_position: usize,
}

impl PlaybackEngine {
    /// Create an engine positioned at index 0. Empty routes are rejected.
    pub fn new(route: Arc<Route>) -> TrackerResult<Self> {
        if route.is_empty() {
            return Err(TrackerError::EmptyRoute(route.name().to_string()));
        }

        Ok(Self {
            route,
            state: PlaybackState::Playing,
            current_position: 0,
        })
    }

    /// Index of the waypoint the next tick will emit
    pub fn position(&self) -> usize {
        self.current_position
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    /// Advance one waypoint, wrapping to the start after the last
    pub fn tick(&mut self) -> TickOutcome {
        if self.state == PlaybackState::Paused {
            return TickOutcome::Skipped;
        }

        let index = self.current_position;
        let waypoints = self.route.waypoints();
        let position = waypoints[index];
        let segment = index
            .checked_sub(1)
            .map(|previous| (waypoints[previous], position));

        self.current_position = (index + 1) % waypoints.len();

        TickOutcome::Advanced { index, position, segment }
    }
}

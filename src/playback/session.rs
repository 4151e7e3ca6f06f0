use crate::core::Route;
use crate::error::TrackerResult;
use crate::playback::{PauseMode, PlaybackEngine, PlaybackEvent, Speed, TickOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

/// Identifies one started playback run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHandle(u64);

impl SessionHandle {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// One timer firing, tagged with the run whose timer produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTick {
    pub generation: u64,
}

/// The engine of the current run and the timer driving it
struct ActivePlayback {
    engine: PlaybackEngine,
    timer: Option<JoinHandle<()>>,
}

/// Timer-driven playback of a route.
///
/// The session owns the engine. Its timer task only sends
/// [`SessionTick`]s on the channel returned by [`PlaybackSession::new`];
/// the owner hands each one back to [`PlaybackSession::advance`].
/// At most one timer task exists at any time: every start, speed change
/// and route change aborts the previous timer before spawning the next.
pub struct PlaybackSession {
    ticks: mpsc::UnboundedSender<SessionTick>,
    base_interval: Duration,
    pause_mode: PauseMode,
    speed: Speed,
    route: Option<Arc<Route>>,
    generation: u64,
    active: Option<ActivePlayback>,
}

impl PlaybackSession {
    pub fn new(
        base_interval: Duration,
        pause_mode: PauseMode,
    ) -> (Self, mpsc::UnboundedReceiver<SessionTick>) {
        let (ticks, receiver) = mpsc::unbounded_channel();
        let session = Self {
            ticks,
            base_interval,
            pause_mode,
            speed: Speed::default(),
            route: None,
            generation: 0,
            active: None,
        };
        (session, receiver)
    }

    /// Start playing `route` from index 0, replacing any current run.
    ///
    /// The first tick fires immediately. An empty route leaves playback
    /// stopped and returns an error.
    pub fn start(&mut self, route: Arc<Route>, speed: Speed) -> TrackerResult<SessionHandle> {
        self.cancel();
        self.route = Some(Arc::clone(&route));
        self.speed = speed;

        let engine = match PlaybackEngine::new(Arc::clone(&route)) {
            Ok(engine) => engine,
            Err(e) => {
                warn!("Not starting playback: {}", e);
                return Err(e);
            }
        };

        self.generation += 1;
        let period = self.interval();
        info!(
            "Starting playback of '{}' ({} waypoints) at x{} every {:?}",
            route.name(),
            route.len(),
            speed.get(),
            period
        );

        let timer = self.spawn_timer(Instant::now());
        self.active = Some(ActivePlayback {
            engine,
            timer: Some(timer),
        });

        Ok(SessionHandle(self.generation))
    }

    /// Apply one timer firing to the engine.
    ///
    /// Returns `None` for a tick from a cancelled run, otherwise the events
    /// of this tick (empty while paused), position update first.
    pub fn advance(&mut self, tick: SessionTick) -> Option<Vec<PlaybackEvent>> {
        if tick.generation != self.generation {
            return None;
        }
        let active = self.active.as_mut()?;

        let outcome = active.engine.tick();
        match outcome {
            TickOutcome::Skipped => trace!(generation = tick.generation, "Tick skipped"),
            TickOutcome::Advanced { index, position, .. } => {
                trace!(generation = tick.generation, index, "Tick advanced to {}", position)
            }
        }
        Some(outcome.events())
    }

    /// Change the speed multiplier, restarting the current route from index 0
    pub fn set_speed(&mut self, speed: Speed) -> TrackerResult<Option<SessionHandle>> {
        self.speed = speed;
        match self.route.clone() {
            Some(route) if self.active.is_some() => self.start(route, speed).map(Some),
            _ => Ok(None),
        }
    }

    /// Switch to another route, restarting from its index 0
    pub fn set_route(&mut self, route: Arc<Route>) -> TrackerResult<Option<SessionHandle>> {
        if self.active.is_some() {
            self.start(route, self.speed).map(Some)
        } else {
            self.route = Some(route);
            Ok(None)
        }
    }

    pub fn pause(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        active.engine.pause();
        if self.pause_mode == PauseMode::StopTimer {
            if let Some(timer) = active.timer.take() {
                timer.abort();
            }
        }
        info!("Playback paused at index {}", active.engine.position());
    }

    pub fn resume(&mut self) {
        let first_tick = Instant::now() + self.interval();
        let needs_timer = match self.active.as_mut() {
            Some(active) => {
                active.engine.resume();
                active.timer.is_none()
            }
            None => return,
        };

        if needs_timer {
            let timer = self.spawn_timer(first_tick);
            if let Some(active) = self.active.as_mut() {
                active.timer = Some(timer);
            }
        }
        info!("Playback resumed");
    }

    /// Flip between paused and playing. Returns true if now paused.
    pub fn toggle_pause(&mut self) -> bool {
        if self.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
        self.is_paused()
    }

    /// Cancel the timer and end the current run
    pub fn stop(&mut self) {
        if self.active.is_some() {
            info!("Playback stopped");
        }
        self.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.engine.is_paused())
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn interval(&self) -> Duration {
        self.speed.interval(self.base_interval)
    }

    fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            if let Some(timer) = active.timer {
                timer.abort();
                debug!("Cancelled playback timer (generation {})", self.generation);
            }
        }
    }

    fn spawn_timer(&self, first_tick: Instant) -> JoinHandle<()> {
        tokio::spawn(run_timer(
            self.ticks.clone(),
            self.generation,
            self.interval(),
            first_tick,
        ))
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_timer(
    ticks: mpsc::UnboundedSender<SessionTick>,
    generation: u64,
    period: Duration,
    first_tick: Instant,
) {
    let mut ticker = time::interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if ticks.send(SessionTick { generation }).is_err() {
            debug!("Playback tick receiver dropped, stopping timer");
            return;
        }
    }
}

#[cfg(test)]
impl PlaybackSession {
    /// Whether a timer task is currently scheduled
    pub fn has_timer(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.timer.is_some())
    }

    /// Index the next tick will emit, if playing
    pub fn position(&self) -> Option<usize> {
        self.active.as_ref().map(|active| active.engine.position())
    }

    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }
}

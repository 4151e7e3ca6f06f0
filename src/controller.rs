use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::core::{ConnectionType, Route, StatusReadout, VehicleState, Waypoint};
use crate::error::TrackerResult;
use crate::map::{LayerHandle, MapSurface, MarkerHandle, MarkerIcon};
use crate::playback::{PlaybackEvent, PlaybackSession, SessionHandle, SessionTick, Speed};
use crate::routes::{RouteKey, RouteTable};
use crate::sources::GeoSample;
use crate::storage::{PositionStore, USER_MARKER_KEY};

/// User actions from the control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Start playback; unset fields keep the current selection
    Show {
        route: Option<String>,
        speed: Option<Speed>,
    },
    TogglePause,
    SetSpeed(Speed),
    SelectRoute(String),
    SelectConnection(ConnectionType),
    Status,
    Quit,
}

/// Owns the map surface and everything placed on it.
///
/// Created by [`MapController::mount`] and torn down by
/// [`MapController::unmount`]; dropping the controller also cancels the
/// playback timer.
pub struct MapController<M: MapSurface, S: PositionStore> {
    map: M,
    store: S,
    routes: RouteTable,
    config: AppConfig,
    session: PlaybackSession,
    route_key: RouteKey,
    connection: ConnectionType,
    vehicle: VehicleState,
    user_position: Waypoint,
    tiles: Option<LayerHandle>,
    user_marker: Option<MarkerHandle>,
    vehicle_marker: Option<MarkerHandle>,
    trail: Vec<LayerHandle>,
}

impl<M: MapSurface, S: PositionStore> MapController<M, S> {
    /// Initialise the map at the last persisted user position.
    ///
    /// Returns the controller together with the channel on which its
    /// playback timer delivers ticks.
    pub fn mount(
        mut map: M,
        store: S,
        routes: RouteTable,
        config: AppConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SessionTick>) {
        let user_position = store.get_or(USER_MARKER_KEY, Waypoint::ORIGIN);
        map.set_view(user_position, config.zoom);
        let tiles = map.add_tile_layer(&config.tile_layer);

        let (mut session, ticks) = PlaybackSession::new(config.base_interval(), config.pause_mode);
        // no route yet, so this only records the speed
        let _ = session.set_speed(config.default_speed);

        info!("Map mounted at {} with {} routes", user_position, routes.len());

        let controller = Self {
            map,
            store,
            route_key: config.default_route,
            connection: config.connection,
            vehicle: VehicleState::new(config.status.clone()),
            routes,
            config,
            session,
            user_position,
            tiles: Some(tiles),
            user_marker: None,
            vehicle_marker: None,
            trail: Vec::new(),
        };

        (controller, ticks)
    }

    /// Cancel playback, remove every layer the controller added and hand
    /// back the collaborators
    pub fn unmount(mut self) -> (M, S) {
        self.session.stop();
        self.clear_trail();

        let layers = [
            self.vehicle_marker.take(),
            self.user_marker.take(),
            self.tiles.take(),
        ];
        for layer in layers.into_iter().flatten() {
            self.map.remove_layer(layer);
        }

        info!("Map unmounted");
        (self.map, self.store)
    }

    pub fn handle_command(&mut self, command: ControlCommand) -> TrackerResult<()> {
        match command {
            ControlCommand::Show { route, speed } => {
                let selector = route.unwrap_or_else(|| self.route_key.to_string());
                let speed = speed.unwrap_or(self.session.speed());
                self.show(&selector, speed).map(|_| ())
            }
            ControlCommand::TogglePause => {
                self.toggle_pause();
                Ok(())
            }
            ControlCommand::SetSpeed(speed) => self.set_speed(speed),
            ControlCommand::SelectRoute(selector) => self.select_route(&selector),
            ControlCommand::SelectConnection(connection) => {
                self.connection = connection;
                Ok(())
            }
            ControlCommand::Status => {
                info!("{}", self.readout());
                Ok(())
            }
            ControlCommand::Quit => Ok(()),
        }
    }

    /// Start playback of the selected route from its first waypoint
    pub fn show(&mut self, selector: &str, speed: Speed) -> TrackerResult<SessionHandle> {
        let route = self.select(selector);
        self.clear_trail();
        self.session.start(route, speed)
    }

    /// Returns true if playback is now paused
    pub fn toggle_pause(&mut self) -> bool {
        self.session.toggle_pause()
    }

    pub fn set_speed(&mut self, speed: Speed) -> TrackerResult<()> {
        let restarted = self.session.set_speed(speed);
        self.after_restart(restarted)
    }

    pub fn select_route(&mut self, selector: &str) -> TrackerResult<()> {
        let route = self.select(selector);
        let restarted = self.session.set_route(route);
        self.after_restart(restarted)
    }

    /// Advance playback on a timer tick and apply its events in order.
    ///
    /// Ticks from a cancelled run are dropped. Returns whether the tick
    /// belonged to the current run.
    pub fn handle_playback(&mut self, tick: SessionTick) -> bool {
        let Some(events) = self.session.advance(tick) else {
            debug!("Dropping stale playback tick from generation {}", tick.generation);
            return false;
        };

        for event in events {
            self.apply_playback(event);
        }
        true
    }

    /// Apply a position report for the user's own device.
    ///
    /// Samples without a fix are ignored. The first valid sample also seeds
    /// the vehicle marker.
    pub fn handle_geolocation(&mut self, sample: GeoSample) {
        let position = sample.position;
        if !position.is_fix() {
            debug!("Ignoring geolocation sample without a fix: {}", position);
            return;
        }
        debug!("Geolocation fix {} taken at {}", position, sample.timestamp);

        if let Err(e) = self.store.set(USER_MARKER_KEY, position) {
            warn!("Failed to persist user position: {}", e);
        }
        self.user_position = position;

        if let Some(marker) = self.user_marker.take() {
            self.map.remove_layer(marker);
        }
        self.user_marker = Some(self.map.add_marker(position, MarkerIcon::User));
        self.map.set_view(position, self.config.zoom);

        if self.vehicle_marker.is_none() {
            info!("Seeding vehicle marker at {}", position);
            self.vehicle_marker = Some(self.map.add_marker(position, MarkerIcon::Vehicle));
            self.vehicle.position = Some(position);
            self.vehicle.updated_at = Some(sample.timestamp);
        }
    }

    pub fn readout(&self) -> StatusReadout {
        StatusReadout {
            route: self.route_key.to_string(),
            speed: self.session.speed().get(),
            playing: self.session.is_active(),
            paused: self.session.is_paused(),
            connection: self.connection,
            position: self.vehicle.position,
            updated_at: self.vehicle.updated_at,
            status: self.vehicle.status.clone(),
        }
    }

    fn apply_playback(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Position { index, position } => {
                self.vehicle.apply_position(index, position);
                debug!("Vehicle at waypoint {} {}", self.vehicle.route_index, position);
                match self.vehicle_marker {
                    Some(marker) => self.map.move_marker(marker, position),
                    None => {
                        self.vehicle_marker = Some(self.map.add_marker(position, MarkerIcon::Vehicle));
                    }
                }
            }
            PlaybackEvent::Segment { from, to } => {
                let segment = self.map.draw_segment(from, to, &self.config.trail_style);
                self.trail.push(segment);
            }
        }
    }

    fn select(&mut self, selector: &str) -> Arc<Route> {
        let (key, route) = self.routes.resolve(selector);
        self.route_key = key;
        route
    }

    /// A restarted or failed run starts without a trail
    fn after_restart(&mut self, restarted: TrackerResult<Option<SessionHandle>>) -> TrackerResult<()> {
        match restarted {
            Ok(None) => Ok(()),
            Ok(Some(_)) => {
                self.clear_trail();
                Ok(())
            }
            Err(e) => {
                self.clear_trail();
                Err(e)
            }
        }
    }

    fn clear_trail(&mut self) {
        for segment in self.trail.drain(..) {
            self.map.remove_layer(segment);
        }
    }
}

#[cfg(test)]
impl<M: MapSurface, S: PositionStore> MapController<M, S> {
    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn vehicle(&self) -> &VehicleState {
        &self.vehicle
    }

    pub fn route_key(&self) -> RouteKey {
        self.route_key
    }

    pub fn connection(&self) -> ConnectionType {
        self.connection
    }

    pub fn user_position(&self) -> Waypoint {
        self.user_position
    }

    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }
}

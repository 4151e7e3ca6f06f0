use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::controller::{ControlCommand, MapController};
use crate::map::MapSurface;
use crate::playback::{SessionTick, Speed};
use crate::sources::GeolocationSource;
use crate::storage::PositionStore;

pub const HELP: &str = "commands: show [route] [speed] | pause | speed N | route KEY | connection gps|gsm|wifi | status | quit";

/// Parse one line of control input
///
/// Speed values are bounded into 1..=5 the way the speed control is.
pub fn parse_command(line: &str) -> Result<ControlCommand, String> {
    let mut parts = line.split_whitespace();
    let verb = parts.next().ok_or_else(|| "empty command".to_string())?;

    let parse_speed = |raw: &str| {
        raw.parse::<i64>()
            .map(Speed::clamped)
            .map_err(|_| format!("invalid speed: {}", raw))
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "show" | "start" => ControlCommand::Show {
            route: parts.next().map(str::to_string),
            speed: parts.next().map(parse_speed).transpose()?,
        },
        "pause" | "resume" => ControlCommand::TogglePause,
        "speed" => {
            let raw = parts.next().ok_or_else(|| "speed needs a value".to_string())?;
            ControlCommand::SetSpeed(parse_speed(raw)?)
        }
        "route" => {
            let key = parts.next().ok_or_else(|| "route needs a key".to_string())?;
            ControlCommand::SelectRoute(key.to_string())
        }
        "connection" => {
            let kind = parts.next().ok_or_else(|| "connection needs a type".to_string())?;
            ControlCommand::SelectConnection(kind.parse()?)
        }
        "status" => ControlCommand::Status,
        "quit" | "exit" => ControlCommand::Quit,
        other => return Err(format!("unknown command: {}", other)),
    };

    Ok(command)
}

/// Drive the controller until a quit command arrives or the command
/// channel closes, then unmount it.
///
/// Playback ticks, geolocation samples and commands are handled one at a
/// time on the calling task.
pub async fn run<M, S>(
    mut controller: MapController<M, S>,
    mut ticks: mpsc::UnboundedReceiver<SessionTick>,
    mut geolocation: Box<dyn GeolocationSource>,
    mut commands: mpsc::Receiver<ControlCommand>,
) -> (M, S)
where
    M: MapSurface,
    S: PositionStore,
{
    let source_name = geolocation.name().to_string();
    let mut geolocation_live = true;

    loop {
        tokio::select! {
            Some(tick) = ticks.recv() => {
                controller.handle_playback(tick);
            }
            sample = geolocation.next_sample(), if geolocation_live => match sample {
                Some(sample) => controller.handle_geolocation(sample),
                None => {
                    info!("Geolocation source '{}' finished", source_name);
                    geolocation_live = false;
                }
            },
            command = commands.recv() => match command {
                Some(ControlCommand::Quit) | None => break,
                Some(command) => {
                    if let Err(e) = controller.handle_command(command) {
                        warn!("Command failed: {}", e);
                    }
                }
            },
        }
    }

    controller.unmount()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::core::{ConnectionType, Waypoint};
    use crate::map::{MarkerIcon, RecordingMap};
    use crate::routes::RouteTable;
    use crate::sources::{ScriptedGeolocation, UnavailableGeolocation};
    use crate::storage::{MemoryStore, USER_MARKER_KEY};
    use std::time::Duration;

    #[test]
    fn test_parse_show() {
        assert_eq!(
            parse_command("show lastWeek 3").unwrap(),
            ControlCommand::Show {
                route: Some("lastWeek".to_string()),
                speed: Some(Speed::new(3).unwrap()),
            }
        );
        assert_eq!(
            parse_command("show").unwrap(),
            ControlCommand::Show { route: None, speed: None }
        );
    }

    #[test]
    fn test_parse_speed_is_bounded() {
        assert_eq!(parse_command("speed 9").unwrap(), ControlCommand::SetSpeed(Speed::MAX));
        assert_eq!(parse_command("speed 0").unwrap(), ControlCommand::SetSpeed(Speed::MIN));
        assert!(parse_command("speed fast").is_err());
        assert!(parse_command("speed").is_err());
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(parse_command("PAUSE").unwrap(), ControlCommand::TogglePause);
        assert_eq!(
            parse_command("connection gsm").unwrap(),
            ControlCommand::SelectConnection(ConnectionType::Gsm)
        );
        assert_eq!(
            parse_command("route today").unwrap(),
            ControlCommand::SelectRoute("today".to_string())
        );
        assert_eq!(parse_command("quit").unwrap(), ControlCommand::Quit);
        assert!(parse_command("").is_err());
        assert!(parse_command("fly").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_applies_geolocation_and_playback() {
        let (controller, ticks) = MapController::mount(
            RecordingMap::new(),
            MemoryStore::new(),
            RouteTable::builtin(),
            AppConfig::default(),
        );
        let geolocation = ScriptedGeolocation::new(
            "test",
            vec![Waypoint::new(51.5, -0.1)],
            Duration::from_secs(1),
        );
        let (tx, rx) = mpsc::channel(8);

        let handle = tokio::spawn(run(controller, ticks, Box::new(geolocation), rx));

        tx.send(ControlCommand::Show { route: None, speed: None }).await.unwrap();
        tokio::time::sleep(Duration::from_millis(4500)).await;
        tx.send(ControlCommand::Quit).await.unwrap();

        let (map, store) = handle.await.unwrap();
        assert_eq!(store.get(USER_MARKER_KEY), Some(Waypoint::new(51.5, -0.1)));
        // everything is removed on unmount
        assert_eq!(map.layer_count(), 0);
        assert!(map.markers(MarkerIcon::Vehicle).is_empty());
        // ticks at 0s, 2s and 4s drew two trail segments
        let drawn = map
            .ops()
            .iter()
            .filter(|op| matches!(op, crate::map::MapOp::DrawSegment { .. }))
            .count();
        assert_eq!(drawn, 2);
    }

    #[tokio::test]
    async fn test_run_stops_when_commands_close() {
        let (controller, ticks) = MapController::mount(
            RecordingMap::new(),
            MemoryStore::new(),
            RouteTable::builtin(),
            AppConfig::default(),
        );
        let (tx, rx) = mpsc::channel(1);
        drop(tx);

        let (map, _store) = run(controller, ticks, Box::new(UnavailableGeolocation), rx).await;
        assert_eq!(map.layer_count(), 0);
    }
}

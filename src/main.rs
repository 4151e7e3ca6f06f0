mod app;
mod config;
mod controller;
mod core;
mod error;
mod input;
mod map;
mod playback;
mod routes;
mod sources;
mod storage;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use controller::{ControlCommand, MapController};
use map::RecordingMap;
use sources::{GeolocationSource, ScriptedGeolocation, UnavailableGeolocation};
use storage::{JsonFileStore, MemoryStore, PositionStore};

fn open_store(config: &AppConfig) -> Box<dyn PositionStore> {
    match config.storage_path() {
        Some(path) => {
            info!("Using position store at {:?}", path);
            Box::new(JsonFileStore::open(path))
        }
        None => {
            warn!("No data directory available, user position will not persist");
            Box::new(MemoryStore::new())
        }
    }
}

fn open_geolocation(config: &AppConfig) -> Box<dyn GeolocationSource> {
    let settings = &config.geolocation;
    if !settings.enabled {
        return Box::new(UnavailableGeolocation);
    }

    let mut source = ScriptedGeolocation::new(
        "scripted",
        settings.samples.clone(),
        settings.poll_interval(),
    );
    source.set_repeat_last(settings.repeat_last);
    Box::new(source)
}

/// Load the configuration named on the command line, or the one in the
/// config directory. A default file is written there on first run.
fn load_config() -> Result<AppConfig> {
    if let Some(path) = std::env::args().nth(1) {
        return AppConfig::load_from(path);
    }

    if let Some(path) = AppConfig::config_path() {
        if !path.exists() {
            match AppConfig::default().save_to(&path) {
                Ok(()) => info!("Wrote default configuration to {:?}", path),
                Err(e) => warn!("Could not write default configuration: {:#}", e),
            }
        }
    }
    Ok(AppConfig::load())
}

/// Forward stdin lines to the controller as commands
async fn read_commands(commands: mpsc::Sender<ControlCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read command: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match app::parse_command(&line) {
            Ok(command) => {
                if commands.send(command).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("{} ({})", e, app::HELP),
        }
    }

    let _ = commands.send(ControlCommand::Quit).await;
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let routes = config.route_table().context("Failed to load route table")?;

    let store = open_store(&config);
    let geolocation = open_geolocation(&config);
    let (controller, ticks) = MapController::mount(RecordingMap::new(), store, routes, config);

    let (command_tx, command_rx) = mpsc::channel::<ControlCommand>(32);

    let ctrl_c_tx = command_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_c_tx.send(ControlCommand::Quit).await;
        }
    });
    tokio::spawn(read_commands(command_tx));

    info!("{}", app::HELP);
    let (map, _store) = app::run(controller, ticks, geolocation, command_rx).await;
    info!(
        "Shut down after {} map operations, {} layers left",
        map.ops().len(),
        map.layer_count()
    );

    Ok(())
}

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::Waypoint;
use crate::error::TrackerResult;
use crate::storage::PositionStore;

/// Position store backed by a JSON object on disk
///
/// The whole file is rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: HashMap<String, Waypoint>,
}

impl JsonFileStore {
    /// Platform default location of the store
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|p| p.join("vehicle-tracker").join("storage.json"))
    }

    /// Open the store at `path`. A missing file starts empty; an unreadable
    /// or malformed one is logged and also starts empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!("Ignoring malformed position store {:?}: {}", path, e);
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!("Could not read position store {:?}: {}", path, e);
                HashMap::new()
            }
        };

        Self { path, entries }
    }

    fn save(&self) -> TrackerResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)?;
        debug!("Saved position store to {:?}", self.path);
        Ok(())
    }
}

impl PositionStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Waypoint> {
        self.entries.get(key).copied()
    }

    fn set(&mut self, key: &str, position: Waypoint) -> TrackerResult<()> {
        self.entries.insert(key.to_string(), position);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::USER_MARKER_KEY;

    #[test]
    fn test_position_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut store = JsonFileStore::open(&path);
        assert_eq!(store.get(USER_MARKER_KEY), None);
        store.set(USER_MARKER_KEY, Waypoint::new(51.5, -0.1)).unwrap();

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get(USER_MARKER_KEY), Some(Waypoint::new(51.5, -0.1)));

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"USER_MARKER\""));
        assert!(contents.contains("\"latitude\": 51.5"));
    }

    #[test]
    fn test_malformed_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::open(&path);
        assert_eq!(store.get_or(USER_MARKER_KEY, Waypoint::ORIGIN), Waypoint::ORIGIN);
    }
}

use std::collections::HashMap;

use crate::core::Waypoint;
use crate::error::TrackerResult;
use crate::storage::PositionStore;

/// Non-persistent store, used when no storage location is available
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, Waypoint>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PositionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Waypoint> {
        self.entries.get(key).copied()
    }

    fn set(&mut self, key: &str, position: Waypoint) -> TrackerResult<()> {
        self.entries.insert(key.to_string(), position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::USER_MARKER_KEY;

    #[test]
    fn test_memory_store_get_or_default() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get_or(USER_MARKER_KEY, Waypoint::ORIGIN), Waypoint::ORIGIN);

        store.set(USER_MARKER_KEY, Waypoint::new(51.5, -0.1)).unwrap();
        assert_eq!(store.get(USER_MARKER_KEY), Some(Waypoint::new(51.5, -0.1)));
    }
}

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::core::Waypoint;
use crate::error::TrackerResult;

/// Key under which the user's last known position is kept
pub const USER_MARKER_KEY: &str = "USER_MARKER";

/// Key-value storage for positions that survives restarts
pub trait PositionStore: Send {
    fn get(&self, key: &str) -> Option<Waypoint>;

    fn set(&mut self, key: &str, position: Waypoint) -> TrackerResult<()>;

    fn get_or(&self, key: &str, default: Waypoint) -> Waypoint {
        self.get(key).unwrap_or(default)
    }
}

impl<T: PositionStore + ?Sized> PositionStore for Box<T> {
    fn get(&self, key: &str) -> Option<Waypoint> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, position: Waypoint) -> TrackerResult<()> {
        (**self).set(key, position)
    }
}

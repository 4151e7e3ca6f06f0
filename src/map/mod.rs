pub mod surface;
pub mod recording;

pub use surface::{LayerHandle, MapSurface, MarkerHandle, MarkerIcon, SegmentStyle, TileLayer};
pub use recording::{Layer, MapOp, RecordingMap};

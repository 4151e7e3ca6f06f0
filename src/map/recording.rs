use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::core::Waypoint;
use crate::map::{LayerHandle, MapSurface, MarkerHandle, MarkerIcon, SegmentStyle, TileLayer};

/// A layer currently on a [`RecordingMap`]
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Tiles(TileLayer),
    Marker { position: Waypoint, icon: MarkerIcon },
    Segment { from: Waypoint, to: Waypoint },
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Tiles(tiles) => write!(f, "tiles from {}", tiles.url_template),
            Layer::Marker { position, icon } => write!(f, "{:?} marker at {}", icon, position),
            Layer::Segment { from, to } => write!(f, "segment {} -> {}", from, to),
        }
    }
}

/// Operation applied to a [`RecordingMap`]
#[derive(Debug, Clone, PartialEq)]
pub enum MapOp {
    SetView { center: Waypoint, zoom: u8 },
    AddTiles(LayerHandle),
    AddMarker { handle: MarkerHandle, at: Waypoint, icon: MarkerIcon },
    MoveMarker { handle: MarkerHandle, to: Waypoint },
    DrawSegment { handle: LayerHandle, from: Waypoint, to: Waypoint },
    RemoveLayer(LayerHandle),
}

/// Headless map surface that keeps its layers in memory and records every
/// operation applied to it
#[derive(Debug, Default)]
pub struct RecordingMap {
    layers: BTreeMap<LayerHandle, Layer>,
    ops: Vec<MapOp>,
    next_id: u64,
}

impl RecordingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[MapOp] {
        &self.ops
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn insert(&mut self, layer: Layer) -> LayerHandle {
        self.next_id += 1;
        let handle = LayerHandle(self.next_id);
        debug!("Added layer {:?}: {}", handle, layer);
        self.layers.insert(handle, layer);
        handle
    }
}

#[cfg(test)]
impl RecordingMap {
    /// Center and zoom of the last view change
    pub fn view(&self) -> Option<(Waypoint, u8)> {
        self.ops.iter().rev().find_map(|op| match op {
            MapOp::SetView { center, zoom } => Some((*center, *zoom)),
            _ => None,
        })
    }

    /// Positions of all markers with the given icon
    pub fn markers(&self, icon: MarkerIcon) -> Vec<Waypoint> {
        self.layers
            .values()
            .filter_map(|layer| match layer {
                Layer::Marker { position, icon: i } if *i == icon => Some(*position),
                _ => None,
            })
            .collect()
    }

    /// Trail segments in drawing order
    pub fn segments(&self) -> Vec<(Waypoint, Waypoint)> {
        self.layers
            .values()
            .filter_map(|layer| match layer {
                Layer::Segment { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }
}

impl MapSurface for RecordingMap {
    fn set_view(&mut self, center: Waypoint, zoom: u8) {
        debug!("Map view set to {} at zoom {}", center, zoom);
        self.ops.push(MapOp::SetView { center, zoom });
    }

    fn add_tile_layer(&mut self, tiles: &TileLayer) -> LayerHandle {
        let handle = self.insert(Layer::Tiles(tiles.clone()));
        self.ops.push(MapOp::AddTiles(handle));
        handle
    }

    fn add_marker(&mut self, at: Waypoint, icon: MarkerIcon) -> MarkerHandle {
        let handle = self.insert(Layer::Marker { position: at, icon });
        self.ops.push(MapOp::AddMarker { handle, at, icon });
        handle
    }

    fn move_marker(&mut self, marker: MarkerHandle, to: Waypoint) {
        if let Some(Layer::Marker { position, .. }) = self.layers.get_mut(&marker) {
            *position = to;
            debug!("Moved marker {:?} to {}", marker, to);
            self.ops.push(MapOp::MoveMarker { handle: marker, to });
        }
    }

    fn draw_segment(&mut self, from: Waypoint, to: Waypoint, style: &SegmentStyle) -> LayerHandle {
        let handle = self.insert(Layer::Segment { from, to });
        debug!("Segment {:?} styled {} weight {}", handle, style.color, style.weight);
        self.ops.push(MapOp::DrawSegment { handle, from, to });
        handle
    }

    fn remove_layer(&mut self, layer: LayerHandle) {
        if let Some(removed) = self.layers.remove(&layer) {
            debug!("Removed layer {:?}: {}", layer, removed);
            self.ops.push(MapOp::RemoveLayer(layer));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_lifecycle() {
        let mut map = RecordingMap::new();
        let marker = map.add_marker(Waypoint::new(1.0, 2.0), MarkerIcon::Vehicle);
        map.move_marker(marker, Waypoint::new(3.0, 4.0));

        assert_eq!(map.markers(MarkerIcon::Vehicle), vec![Waypoint::new(3.0, 4.0)]);
        assert!(map.markers(MarkerIcon::User).is_empty());

        map.remove_layer(marker);
        assert_eq!(map.layer_count(), 0);
        assert_eq!(map.ops().len(), 3);
    }

    #[test]
    fn test_unknown_handles_are_ignored() {
        let mut map = RecordingMap::new();
        map.move_marker(LayerHandle(42), Waypoint::new(1.0, 1.0));
        map.remove_layer(LayerHandle(42));
        assert!(map.ops().is_empty());
    }

    #[test]
    fn test_moving_a_segment_is_ignored() {
        let mut map = RecordingMap::new();
        let seg = map.draw_segment(Waypoint::new(1.0, 1.0), Waypoint::new(2.0, 2.0), &SegmentStyle::default());
        map.move_marker(seg, Waypoint::new(5.0, 5.0));
        assert_eq!(map.segments(), vec![(Waypoint::new(1.0, 1.0), Waypoint::new(2.0, 2.0))]);
        assert_eq!(map.ops().len(), 1);
    }

    #[test]
    fn test_view_follows_last_set_view() {
        let mut map = RecordingMap::new();
        assert_eq!(map.view(), None);
        map.set_view(Waypoint::new(1.0, 2.0), 13);
        map.set_view(Waypoint::new(3.0, 4.0), 15);
        assert_eq!(map.view(), Some((Waypoint::new(3.0, 4.0), 15)));
    }

    #[test]
    fn test_layer_display() {
        let marker = Layer::Marker { position: Waypoint::new(1.0, 2.0), icon: MarkerIcon::User };
        assert_eq!(marker.to_string(), "User marker at (1.00000, 2.00000)");
        let segment = Layer::Segment { from: Waypoint::new(1.0, 2.0), to: Waypoint::new(3.0, 4.0) };
        assert_eq!(segment.to_string(), "segment (1.00000, 2.00000) -> (3.00000, 4.00000)");
    }
}

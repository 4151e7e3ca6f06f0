use serde::{Deserialize, Serialize};

use crate::core::Waypoint;

/// Identifies a layer (tiles, marker or trail segment) on a map surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerHandle(pub u64);

/// Markers are layers that can also be moved
pub type MarkerHandle = LayerHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerIcon {
    /// The user's own device
    User,
    /// The simulated vehicle
    Vehicle,
}

/// Stroke style for trail segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentStyle {
    pub color: String,
    pub weight: f32,
    pub opacity: f32,
}

impl Default for SegmentStyle {
    fn default() -> Self {
        Self {
            color: "#3388ff".to_string(),
            weight: 4.0,
            opacity: 0.8,
        }
    }
}

/// Raster tile source for the base map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLayer {
    /// URL template with `{z}`, `{x}` and `{y}` placeholders
    pub url_template: String,
    pub max_zoom: u8,
    pub attribution: String,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            max_zoom: 19,
            attribution: "&copy; OpenStreetMap contributors".to_string(),
        }
    }
}

/// Trait for tile map widgets
///
/// Implementations only render; all bookkeeping of which layers exist is
/// owned by the controller.
pub trait MapSurface: Send {
    /// Center the map on `center` at `zoom`
    fn set_view(&mut self, center: Waypoint, zoom: u8);

    fn add_tile_layer(&mut self, tiles: &TileLayer) -> LayerHandle;

    fn add_marker(&mut self, at: Waypoint, icon: MarkerIcon) -> MarkerHandle;

    fn move_marker(&mut self, marker: MarkerHandle, to: Waypoint);

    fn draw_segment(&mut self, from: Waypoint, to: Waypoint, style: &SegmentStyle) -> LayerHandle;

    /// Remove a layer. Unknown handles are ignored.
    fn remove_layer(&mut self, layer: LayerHandle);
}

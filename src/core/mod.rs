pub mod waypoint;
pub mod vehicle;

pub use waypoint::{Route, Waypoint};
pub use vehicle::{ConnectionType, StatusReadout, VehicleState, VehicleStatus};

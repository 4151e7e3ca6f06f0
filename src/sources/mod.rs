pub mod geolocation;
pub mod scripted;

pub use geolocation::{GeoSample, GeolocationSource, UnavailableGeolocation};
pub use scripted::ScriptedGeolocation;

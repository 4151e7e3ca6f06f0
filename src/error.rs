use thiserror::Error;

/// Errors raised by the tracker core
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A playback session was requested for a route with no waypoints
    #[error("route '{0}' has no waypoints")]
    EmptyRoute(String),

    /// Speed multiplier outside the supported 1..=5 range
    #[error("speed multiplier {0} is outside 1..=5")]
    InvalidSpeed(u8),

    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// The route table has no entry for its own default key
    #[error("route table has no route for default key '{0}'")]
    MissingDefaultRoute(String),

    #[error("unrecognised route file format")]
    UnknownFormat,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

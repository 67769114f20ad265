use thiserror::Error;

use crate::marker::MarkerIdx;

/// Failure modes of the geo engine.
///
/// Only [`GeoError::UpstreamFetchFailure`] and the geolocation errors are
/// meant to reach the caller. The other kinds are recovered inside a
/// [`crate::MapSession`] by placing fewer markers or drawing no line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    #[error("Invalid coordinate: latitude={latitude}, longitude={longitude}")]
    InvalidCoordinate { latitude: String, longitude: String },

    #[error("No valid points to place")]
    NoValidPoints,

    #[error("No other marker to link to")]
    NoNearestCandidate,

    #[error("Unknown marker {0}")]
    UnknownMarker(MarkerIdx),

    #[error("Upstream fetch failed: {0}")]
    UpstreamFetchFailure(String),

    #[error("Device location unavailable: {0}")]
    GeolocationUnavailable(String),

    #[error("Device location timed out")]
    GeolocationTimeout,
}

impl GeoError {
    pub fn invalid_coordinate(latitude: impl ToString, longitude: impl ToString) -> Self {
        GeoError::InvalidCoordinate {
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
        }
    }

    /// Whether the session recovers from this error locally.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GeoError::InvalidCoordinate { .. }
                | GeoError::NoValidPoints
                | GeoError::NoNearestCandidate
        )
    }
}

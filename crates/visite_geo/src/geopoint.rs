use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::distance::{Distance, Meters, haversine_km, meters};

/// A WGS84 coordinate in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Exactly `(0, 0)`, which upstream data uses for "no position".
    pub fn is_zero(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    pub fn is_in_range(&self) -> bool {
        self.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Arithmetic midpoint in degree space, where distance labels are anchored.
    pub fn midpoint(&self, other: &GeoPoint) -> GeoPoint {
        GeoPoint {
            latitude: (self.latitude + other.latitude) / 2.0,
            longitude: (self.longitude + other.longitude) / 2.0,
        }
    }

    pub fn haversine_km(&self, other: &GeoPoint) -> f64 {
        haversine_km(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }

    pub fn haversine_distance(&self, other: &GeoPoint) -> Distance<Meters> {
        meters!(self.haversine_km(other) * 1000.0)
    }
}

impl From<&GeoPoint> for geo::Point<f64> {
    fn from(point: &GeoPoint) -> Self {
        geo::Point::new(point.longitude, point.latitude)
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(point: geo::Point<f64>) -> Self {
        GeoPoint::new(point.y(), point.x())
    }
}

impl From<geo::Coord<f64>> for GeoPoint {
    fn from(coord: geo::Coord<f64>) -> Self {
        GeoPoint::new(coord.y, coord.x)
    }
}

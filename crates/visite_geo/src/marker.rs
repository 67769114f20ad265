use std::fmt::Display;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    define_index_newtype, error::GeoError, geopoint::GeoPoint, map_provider::MarkerHandle,
};

define_index_newtype!(MarkerIdx, PlacedMarker);

/// Payload carried by records coming from the upstream service.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// A latitude or longitude as sent by the upstream service: a number, a
/// numeric string, `null`, or not present at all.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CoordinateValue {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl CoordinateValue {
    /// Parsed degrees, or `None` when the value is absent, not numeric or
    /// not finite.
    pub fn parse(&self) -> Option<f64> {
        let value = match self {
            CoordinateValue::Number(value) => *value,
            CoordinateValue::Text(text) => text.trim().parse::<f64>().ok()?,
            CoordinateValue::Missing => return None,
        };

        value.is_finite().then_some(value)
    }
}

impl Display for CoordinateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinateValue::Number(value) => write!(f, "{}", value),
            CoordinateValue::Text(text) => write!(f, "{:?}", text),
            CoordinateValue::Missing => write!(f, "null"),
        }
    }
}

impl From<f64> for CoordinateValue {
    fn from(value: f64) -> Self {
        CoordinateValue::Number(value)
    }
}

impl From<&str> for CoordinateValue {
    fn from(value: &str) -> Self {
        CoordinateValue::Text(value.to_owned())
    }
}

impl<T: Into<CoordinateValue>> From<Option<T>> for CoordinateValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CoordinateValue::Missing, Into::into)
    }
}

/// One upstream record: a position that may or may not be usable, plus
/// whatever display fields the caller wants to keep along.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename = "Record")]
pub struct MarkerRecord<P = Payload> {
    #[serde(default, alias = "lat")]
    pub latitude: CoordinateValue,

    #[serde(default, alias = "lng", alias = "lon")]
    pub longitude: CoordinateValue,

    #[serde(flatten)]
    pub payload: P,
}

impl<P> MarkerRecord<P> {
    pub fn new(
        latitude: impl Into<CoordinateValue>,
        longitude: impl Into<CoordinateValue>,
        payload: P,
    ) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
            payload,
        }
    }

    /// The record's position, if it can be placed on a map.
    pub fn position(&self, exclude_zero_coordinate: bool) -> Result<GeoPoint, GeoError> {
        let invalid = || GeoError::invalid_coordinate(&self.latitude, &self.longitude);

        let latitude = self.latitude.parse().ok_or_else(invalid)?;
        let longitude = self.longitude.parse().ok_or_else(invalid)?;
        let point = GeoPoint::new(latitude, longitude);

        if exclude_zero_coordinate && point.is_zero() {
            return Err(invalid());
        }

        Ok(point)
    }
}

/// A record that made it onto the map.
#[derive(Debug)]
pub struct PlacedMarker<P> {
    pub(crate) handle: MarkerHandle,
    pub(crate) position: GeoPoint,
    pub(crate) record: MarkerRecord<P>,
}

impl<P> PlacedMarker<P> {
    pub fn handle(&self) -> MarkerHandle {
        self.handle
    }

    pub fn position(&self) -> GeoPoint {
        self.position
    }

    pub fn record(&self) -> &MarkerRecord<P> {
        &self.record
    }

    pub fn payload(&self) -> &P {
        &self.record.payload
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_numbers_and_strings() {
        assert_eq!(CoordinateValue::Number(36.7).parse(), Some(36.7));
        assert_eq!(CoordinateValue::from(" 3.05 ").parse(), Some(3.05));
        assert_eq!(CoordinateValue::from("abc").parse(), None);
        assert_eq!(CoordinateValue::from("NaN").parse(), None);
        assert_eq!(CoordinateValue::Missing.parse(), None);
    }

    #[test]
    fn test_deserialize_record_variants() {
        let records: Vec<MarkerRecord> = serde_json::from_value(json!([
            { "id": 1, "latitude": 36.7, "longitude": "3.05", "name": "Alger" },
            { "id": 2, "lat": null, "lng": 3.0 },
            { "id": 3, "name": "no position" },
        ]))
        .unwrap();

        assert_eq!(records[0].latitude, CoordinateValue::Number(36.7));
        assert_eq!(records[0].longitude, CoordinateValue::Text("3.05".into()));
        assert_eq!(records[0].payload["name"], json!("Alger"));
        assert_eq!(records[1].latitude, CoordinateValue::Missing);
        assert_eq!(records[1].longitude, CoordinateValue::Number(3.0));
        assert_eq!(records[2].longitude, CoordinateValue::Missing);
        assert_eq!(records[2].payload["id"], json!(3));
    }

    #[test]
    fn test_position_rejects_invalid_values() {
        let record = MarkerRecord::new("abc", 3.0, ());
        assert!(matches!(
            record.position(false),
            Err(GeoError::InvalidCoordinate { .. })
        ));

        let record = MarkerRecord::new(None::<f64>, 3.0, ());
        assert!(record.position(false).is_err());
    }

    #[test]
    fn test_position_zero_pair_depends_on_flag() {
        let record = MarkerRecord::new(0.0, 0.0, ());

        assert!(record.position(true).is_err());
        assert_eq!(record.position(false).unwrap(), GeoPoint::new(0.0, 0.0));
    }
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    bounds::BoundsRegion,
    error::GeoError,
    info::MarkerPayload,
    map_provider::MapProvider,
    marker::{MarkerRecord, PlacedMarker},
};

/// Zoom the viewport is reset to after fitting the markers.
pub const DEFAULT_MAX_ZOOM: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlacementOptions {
    /// Treat `(0, 0)` as a missing position.
    pub exclude_zero_coordinate: bool,
    pub max_zoom: f64,
}

impl PlacementOptions {
    /// Options for map views, where `(0, 0)` means "never located".
    pub fn map_view() -> Self {
        Self {
            exclude_zero_coordinate: true,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }

    /// Options for generic record listings, which keep `(0, 0)`.
    pub fn listing() -> Self {
        Self {
            exclude_zero_coordinate: false,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

impl Default for PlacementOptions {
    fn default() -> Self {
        PlacementOptions::map_view()
    }
}

#[derive(Debug)]
pub struct Placement<P> {
    pub markers: Vec<PlacedMarker<P>>,
    /// `None` when no record could be placed, in which case the viewport
    /// was left alone.
    pub bounds: Option<BoundsRegion>,
    /// Records dropped because of an unusable position.
    pub excluded: usize,
}

impl<P> Placement<P> {
    /// The region the viewport was fitted to, or [`GeoError::NoValidPoints`]
    /// when nothing was placed.
    pub fn fitted_bounds(&self) -> Result<&BoundsRegion, GeoError> {
        self.bounds.as_ref().ok_or(GeoError::NoValidPoints)
    }
}

/// Places one marker per usable record and fits the viewport around them.
///
/// Records are kept in input order so that marker indices follow the data
/// set. The zoom cap is not applied here: providers only settle their zoom
/// once the camera move is done, see [`crate::MapSession::handle_event`].
pub fn place_markers<M, P, I>(map: &mut M, records: I, options: &PlacementOptions) -> Placement<P>
where
    M: MapProvider,
    P: MarkerPayload,
    I: IntoIterator<Item = MarkerRecord<P>>,
{
    let mut markers = Vec::new();
    let mut bounds: Option<BoundsRegion> = None;
    let mut excluded = 0;

    for record in records {
        let position = match record.position(options.exclude_zero_coordinate) {
            Ok(position) => position,
            Err(err) => {
                debug!("Skipping record: {}", err);
                excluded += 1;
                continue;
            }
        };

        let title = record.payload.title();
        let handle = map.create_marker(position, title.as_deref());

        match bounds.as_mut() {
            Some(bounds) => bounds.extend(&position),
            None => bounds = Some(BoundsRegion::from_point(&position)),
        }

        markers.push(PlacedMarker {
            handle,
            position,
            record,
        });
    }

    if let Some(bounds) = &bounds {
        map.fit_bounds(bounds);
    }

    debug!(
        "Placed {} markers, excluded {} records",
        markers.len(),
        excluded
    );

    Placement {
        markers,
        bounds,
        excluded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geopoint::GeoPoint, headless_map::HeadlessMap, map_provider::MapEvent, test_utils,
    };

    #[test]
    fn test_invalid_records_are_excluded() {
        let mut map = HeadlessMap::default();
        let records = vec![
            test_utils::record(1, 36.7, 3.05),
            test_utils::raw_record(2, serde_json::json!("abc"), serde_json::json!(3.0)),
            test_utils::raw_record(3, serde_json::Value::Null, serde_json::json!(3.0)),
            test_utils::record(4, 0.0, 0.0),
            test_utils::raw_record(5, serde_json::json!("35.69"), serde_json::json!("-0.63")),
        ];

        let placement = place_markers(&mut map, records, &PlacementOptions::map_view());

        assert_eq!(placement.markers.len(), 2);
        assert_eq!(placement.excluded, 3);
        assert_eq!(map.marker_count(), 2);
        assert_eq!(
            placement.markers[1].position(),
            GeoPoint::new(35.69, -0.63)
        );
        assert_eq!(
            map.marker(placement.markers[0].handle()).unwrap().title.as_deref(),
            Some("Record 1")
        );
    }

    #[test]
    fn test_listing_keeps_zero_pair() {
        let mut map = HeadlessMap::default();
        let placement = place_markers(
            &mut map,
            vec![test_utils::record(1, 0.0, 0.0)],
            &PlacementOptions::listing(),
        );

        assert_eq!(placement.markers.len(), 1);
        assert_eq!(placement.excluded, 0);
    }

    #[test]
    fn test_bounds_fitted_when_points_exist() {
        let mut map = HeadlessMap::default();
        let placement = place_markers(
            &mut map,
            vec![
                test_utils::record(1, 36.0, 3.0),
                test_utils::record(2, 35.0, 1.0),
            ],
            &PlacementOptions::map_view(),
        );

        let bounds = placement.fitted_bounds().unwrap();
        assert_eq!(map.center(), bounds.center());
        assert_eq!(map.drain_events(), vec![MapEvent::BoundsChanged]);
    }

    #[test]
    fn test_no_valid_points_leaves_viewport() {
        let mut map = HeadlessMap::default();
        let center = map.center();
        let zoom = map.zoom();

        let placement = place_markers(
            &mut map,
            vec![test_utils::record(1, f64::NAN, 3.0)],
            &PlacementOptions::map_view(),
        );

        assert!(placement.bounds.is_none());
        assert_eq!(
            placement.fitted_bounds().unwrap_err(),
            GeoError::NoValidPoints
        );
        assert!(placement.fitted_bounds().unwrap_err().is_recoverable());
        assert_eq!(placement.excluded, 1);
        assert_eq!(map.center(), center);
        assert_eq!(map.zoom(), zoom);
        assert!(map.drain_events().is_empty());
    }
}

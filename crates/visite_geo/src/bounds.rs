use std::f64::consts::PI;

use rstar::{AABB, Envelope};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geopoint::GeoPoint;

/// Square tile size of web-mercator maps, in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Deepest zoom level map providers usually serve.
pub const MAX_PROVIDER_ZOOM: f64 = 21.0;

/// Latitude limit of the web-mercator projection.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_78;

/// Axis-aligned box enclosing every point it has been extended with.
///
/// Stored as `[longitude, latitude]` corners.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsRegion {
    envelope: AABB<[f64; 2]>,
}

impl BoundsRegion {
    pub fn from_point(point: &GeoPoint) -> Self {
        Self {
            envelope: AABB::from_point([point.longitude, point.latitude]),
        }
    }

    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a GeoPoint>,
    {
        let mut points = points.into_iter();
        let mut bounds = BoundsRegion::from_point(points.next()?);
        for point in points {
            bounds.extend(point);
        }

        Some(bounds)
    }

    pub fn extend(&mut self, point: &GeoPoint) {
        self.envelope
            .merge(&AABB::from_point([point.longitude, point.latitude]));
    }

    pub fn south_west(&self) -> GeoPoint {
        let [lng, lat] = self.envelope.lower();
        GeoPoint::new(lat, lng)
    }

    pub fn north_east(&self) -> GeoPoint {
        let [lng, lat] = self.envelope.upper();
        GeoPoint::new(lat, lng)
    }

    pub fn center(&self) -> GeoPoint {
        let [lng, lat] = self.envelope.center();
        GeoPoint::new(lat, lng)
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.envelope
            .contains_point(&[point.longitude, point.latitude])
    }

    pub fn to_rect(&self) -> geo::Rect<f64> {
        let [min_x, min_y] = self.envelope.lower();
        let [max_x, max_y] = self.envelope.upper();
        geo::Rect::new(
            geo::coord! { x: min_x, y: min_y },
            geo::coord! { x: max_x, y: max_y },
        )
    }
}

/// Pixel size of the map element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub padding: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
            padding: 0.0,
        }
    }
}

/// Fraction of the mercator world height above `latitude`.
pub fn mercator_y(latitude: f64) -> f64 {
    let lat_rad = latitude
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();

    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

/// Fraction of the mercator world width east of the antimeridian.
pub fn mercator_x(longitude: f64) -> f64 {
    (longitude + 180.0) / 360.0
}

impl Viewport {
    /// Deepest integer zoom at which `bounds` fits inside the viewport.
    pub fn fit_zoom(&self, bounds: &BoundsRegion) -> f64 {
        let sw = bounds.south_west();
        let ne = bounds.north_east();

        let width_fraction = mercator_x(ne.longitude) - mercator_x(sw.longitude);
        let height_fraction = mercator_y(sw.latitude) - mercator_y(ne.latitude);

        let usable_width = (self.width - 2.0 * self.padding).max(1.0);
        let usable_height = (self.height - 2.0 * self.padding).max(1.0);

        let zoom_for = |pixels: f64, fraction: f64| {
            if fraction <= 0.0 {
                MAX_PROVIDER_ZOOM
            } else {
                (pixels / TILE_SIZE / fraction).log2()
            }
        };

        zoom_for(usable_width, width_fraction)
            .min(zoom_for(usable_height, height_fraction))
            .floor()
            .clamp(0.0, MAX_PROVIDER_ZOOM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_accumulate_points() {
        let points = [
            GeoPoint::new(36.7, 3.05),
            GeoPoint::new(35.6, -0.6),
            GeoPoint::new(36.4, 6.6),
        ];
        let bounds = BoundsRegion::from_points(&points).unwrap();

        assert_eq!(bounds.south_west(), GeoPoint::new(35.6, -0.6));
        assert_eq!(bounds.north_east(), GeoPoint::new(36.7, 6.6));
        assert!(points.iter().all(|point| bounds.contains(point)));

        let center = bounds.center();
        assert!((center.latitude - 36.15).abs() < 1e-9);
        assert!((center.longitude - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_points_no_bounds() {
        assert!(BoundsRegion::from_points(&Vec::<GeoPoint>::new()).is_none());
    }

    #[test]
    fn test_single_point_fits_at_max_provider_zoom() {
        let bounds = BoundsRegion::from_point(&GeoPoint::new(50.0, 4.0));

        assert_eq!(Viewport::default().fit_zoom(&bounds), MAX_PROVIDER_ZOOM);
    }

    #[test]
    fn test_whole_world_fits_at_low_zoom() {
        let bounds = BoundsRegion::from_points(&[
            GeoPoint::new(-80.0, -179.0),
            GeoPoint::new(80.0, 179.0),
        ])
        .unwrap();

        let zoom = Viewport::default().fit_zoom(&bounds);
        assert!(zoom <= 2.0);
    }

    #[test]
    fn test_to_rect() {
        let bounds =
            BoundsRegion::from_points(&[GeoPoint::new(1.0, 2.0), GeoPoint::new(3.0, 4.0)]).unwrap();
        let rect = bounds.to_rect();

        assert_eq!(rect.min(), geo::coord! { x: 2.0, y: 1.0 });
        assert_eq!(rect.max(), geo::coord! { x: 4.0, y: 3.0 });
    }
}

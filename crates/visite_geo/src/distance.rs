use std::{fmt, marker::PhantomData};

use serde::{Serialize, Serializer};

use crate::{error::GeoError, geopoint::GeoPoint};

/// Mean earth radius used by every distance computed in this crate.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub trait DistanceUnit: Copy + Eq {
    const MILLIMETERS_IN_UNIT: i64;
}

/// A distance stored as whole millimeters, tagged with the unit it is read in.
#[derive(Debug, Clone, Copy, Eq)]
pub struct Distance<T: DistanceUnit> {
    mm: i64,
    unit: PhantomData<T>,
}

macro_rules! create_distance_unit {
    ($struct_name:ident, $mm_conv:expr) => {
        #[derive(Debug, Copy, Clone, Eq, PartialEq)]
        pub struct $struct_name;

        impl DistanceUnit for $struct_name {
            const MILLIMETERS_IN_UNIT: i64 = $mm_conv;
        }

        impl Distance<$struct_name> {
            #[inline(always)]
            pub fn value(&self) -> f64 {
                (self.mm as f64) / ($struct_name::MILLIMETERS_IN_UNIT as f64)
            }
        }
    };
}

create_distance_unit!(Meters, 1_000);
create_distance_unit!(Kilometers, 1_000_000);

impl<T: DistanceUnit> Distance<T> {
    pub fn in_unit<U: DistanceUnit>(self) -> Distance<U> {
        Distance {
            mm: self.mm,
            unit: PhantomData,
        }
    }

    pub fn kilometers(&self) -> f64 {
        self.in_unit::<Kilometers>().value()
    }
}

impl<T> From<f64> for Distance<T>
where
    T: DistanceUnit,
{
    fn from(value: f64) -> Self {
        Distance {
            mm: (value * (T::MILLIMETERS_IN_UNIT as f64)).round() as i64,
            unit: PhantomData,
        }
    }
}

impl<T> From<Distance<T>> for f64
where
    T: DistanceUnit,
{
    fn from(value: Distance<T>) -> Self {
        (value.mm as f64) / T::MILLIMETERS_IN_UNIT as f64
    }
}

/// Displays with the same thresholds as [`format_distance`], whatever the unit.
impl<T> fmt::Display for Distance<T>
where
    T: DistanceUnit,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&format_distance(self.kilometers()))
    }
}

impl<T1, T2> PartialEq<Distance<T2>> for Distance<T1>
where
    T1: DistanceUnit,
    T2: DistanceUnit,
{
    fn eq(&self, other: &Distance<T2>) -> bool {
        self.mm == other.mm
    }
}

/// Serialized as a number in its own unit.
impl<T> Serialize for Distance<T>
where
    T: DistanceUnit,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(f64::from(*self))
    }
}

/// Great-circle distance in kilometers between two points given in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Formats a distance for display: whole meters under 1 km, two decimals
/// under 10 km and one decimal from 10 km on.
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{} m", (km * 1000.0).round() as i64)
    } else if km < 10.0 {
        format!("{:.2} km", km)
    } else {
        format!("{:.1} km", km)
    }
}

/// Formatted great-circle distance between two points given in degrees.
///
/// Degrees outside of the usual ranges are used as-is, see
/// [`checked_distance`] for the validating variant.
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> String {
    format_distance(haversine_km(lat1, lon1, lat2, lon2))
}

pub fn checked_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<String, GeoError> {
    let from = GeoPoint::new(lat1, lon1);
    let to = GeoPoint::new(lat2, lon2);

    for point in [from, to] {
        if !point.is_in_range() {
            return Err(GeoError::invalid_coordinate(
                point.latitude,
                point.longitude,
            ));
        }
    }

    Ok(distance(lat1, lon1, lat2, lon2))
}

macro_rules! meters {
    ($num:expr) => {
        $crate::distance::Distance::<$crate::distance::Meters>::from($num as f64)
    };
}

pub(crate) use meters;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero_meters() {
        for (lat, lng) in [(0.0, 0.0), (50.8503, 4.3517), (-33.86, 151.2), (89.9, -179.9)] {
            assert_eq!(distance(lat, lng, lat, lng), "0 m");
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            ((50.8503, 4.3517), (51.2194, 4.4025)),
            ((0.0, 0.0), (0.0, 0.01)),
            ((-12.5, 130.8), (35.6, 139.7)),
            ((36.75, 3.06), (36.7528, 3.0422)),
        ];

        for ((lat1, lon1), (lat2, lon2)) in pairs {
            assert_eq!(
                distance(lat1, lon1, lat2, lon2),
                distance(lat2, lon2, lat1, lon1)
            );
        }
    }

    #[test]
    fn test_format_branch_boundaries() {
        assert_eq!(format_distance(0.9994), "999 m");
        assert_eq!(format_distance(1.0), "1.00 km");
        assert_eq!(format_distance(9.5), "9.50 km");
        assert_eq!(format_distance(10.0), "10.0 km");
        assert_eq!(format_distance(157.249), "157.2 km");
    }

    #[test]
    fn test_small_distance_in_meters() {
        // 0.001 degree of longitude on the equator is about 111 m
        assert_eq!(distance(0.0, 0.0, 0.0, 0.001), "111 m");
    }

    #[test]
    fn test_hundredth_of_degree_on_equator() {
        let km = haversine_km(0.0, 0.0, 0.0, 0.01);
        assert!((km - 1.111_95).abs() < 1e-4);
        assert_eq!(distance(0.0, 0.0, 0.0, 0.01), "1.11 km");
    }

    #[test]
    fn test_brussels_antwerp() {
        assert_eq!(distance(50.8503, 4.3517, 51.2194, 4.4025), "41.2 km");
    }

    #[test]
    fn test_checked_distance_rejects_out_of_range() {
        assert!(checked_distance(91.0, 0.0, 0.0, 0.0).is_err());
        assert!(checked_distance(0.0, 0.0, 0.0, 180.5).is_err());
        assert!(checked_distance(f64::NAN, 0.0, 0.0, 0.0).is_err());
        assert_eq!(checked_distance(0.0, 0.0, 0.0, 0.01).unwrap(), "1.11 km");
    }

    #[test]
    fn test_unchecked_distance_accepts_out_of_range() {
        assert!(!distance(95.0, 0.0, 0.0, 200.0).is_empty());
    }

    #[test]
    fn test_units_compare_by_length() {
        assert_eq!(meters!(1500), Distance::<Kilometers>::from(1.5));
        assert_eq!(meters!(1500).in_unit::<Kilometers>().value(), 1.5);
        assert_eq!(serde_json::to_value(meters!(1500)).unwrap(), 1500.0);
    }

    #[test]
    fn test_distance_display_uses_label_format() {
        assert_eq!(meters!(450).to_string(), "450 m");
        assert_eq!(meters!(2500).to_string(), "2.50 km");
        assert_eq!(Distance::<Kilometers>::from(12.34).to_string(), "12.3 km");
    }
}

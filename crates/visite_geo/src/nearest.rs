use crate::{geopoint::GeoPoint, marker::MarkerIdx, utils::enumerate_idx::EnumerateIdx};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestMatch {
    pub index: MarkerIdx,
    pub distance_km: f64,
}

/// Linear scan for the point closest to `origin`.
///
/// `skip` is left out of the scan, as are points without finite
/// coordinates. Ties go to the candidate seen first.
pub fn nearest_to(
    origin: &GeoPoint,
    points: &[GeoPoint],
    skip: Option<MarkerIdx>,
) -> Option<NearestMatch> {
    let mut best: Option<NearestMatch> = None;

    for (index, candidate) in points.iter().enumerate_idx() {
        if Some(index) == skip || !candidate.is_finite() {
            continue;
        }

        let distance_km = origin.haversine_km(candidate);
        match best {
            Some(current) if distance_km >= current.distance_km => {}
            _ => {
                best = Some(NearestMatch { index, distance_km });
            }
        }
    }

    best
}

/// Nearest other marker to the marker at `selected`.
pub fn nearest_neighbor(selected: MarkerIdx, points: &[GeoPoint]) -> Option<NearestMatch> {
    let origin = points.get(selected.get())?;
    nearest_to(origin, points, Some(selected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks_closest() {
        let points = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.5),
            GeoPoint::new(0.0, 0.1),
        ];

        let nearest = nearest_neighbor(MarkerIdx::new(0), &points).unwrap();
        assert_eq!(nearest.index, MarkerIdx::new(2));
    }

    #[test]
    fn test_ties_go_to_first_candidate() {
        let points = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.2),
            GeoPoint::new(0.0, -0.2),
        ];

        for _ in 0..10 {
            let nearest = nearest_neighbor(MarkerIdx::new(0), &points).unwrap();
            assert_eq!(nearest.index, MarkerIdx::new(1));
        }

        let reordered = [points[0], points[2], points[1]];
        let nearest = nearest_neighbor(MarkerIdx::new(0), &reordered).unwrap();
        assert_eq!(nearest.index, MarkerIdx::new(1));
        assert_eq!(reordered[1], GeoPoint::new(0.0, -0.2));
    }

    #[test]
    fn test_single_point_has_no_neighbor() {
        assert!(nearest_neighbor(MarkerIdx::new(0), &[GeoPoint::new(1.0, 1.0)]).is_none());
        assert!(nearest_neighbor(MarkerIdx::new(3), &[GeoPoint::new(1.0, 1.0)]).is_none());
    }

    #[test]
    fn test_invalid_candidates_are_skipped() {
        let points = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(f64::NAN, 0.0),
            GeoPoint::new(1.0, 1.0),
        ];

        let nearest = nearest_neighbor(MarkerIdx::new(0), &points).unwrap();
        assert_eq!(nearest.index, MarkerIdx::new(2));
    }

    #[test]
    fn test_nearest_to_reference_point() {
        let points = [GeoPoint::new(36.75, 3.06), GeoPoint::new(35.69, -0.63)];
        let device = GeoPoint::new(35.7, -0.6);

        let nearest = nearest_to(&device, &points, None).unwrap();
        assert_eq!(nearest.index, MarkerIdx::new(1));
    }
}

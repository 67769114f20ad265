use rstar::{RTree, primitives::GeomWithData};
use serde::Serialize;
use smallvec::SmallVec;

use crate::{
    bounds::{TILE_SIZE, mercator_x, mercator_y},
    geopoint::GeoPoint,
    marker::MarkerIdx,
    utils::enumerate_idx::EnumerateIdx,
};

/// Default grouping radius, in screen pixels.
pub const DEFAULT_CLUSTER_RADIUS_PX: f64 = 60.0;

type ProjectedPoint = GeomWithData<[f64; 2], MarkerIdx>;

/// Markers that would overlap on screen at a given zoom level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub center: GeoPoint,
    pub members: SmallVec<[MarkerIdx; 4]>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }

    /// Text drawn on a cluster icon.
    pub fn label(&self) -> String {
        self.members.len().to_string()
    }
}

/// World pixel coordinates of `point` at `zoom`.
pub fn project(point: &GeoPoint, zoom: f64) -> [f64; 2] {
    let world_size = TILE_SIZE * 2_f64.powf(zoom);
    [
        mercator_x(point.longitude) * world_size,
        mercator_y(point.latitude) * world_size,
    ]
}

/// Greedy radius clustering in screen space.
///
/// Points are visited in input order: each point not yet assigned seeds a
/// cluster holding every unassigned point within `radius_px` of it. Points
/// without finite coordinates are ignored.
pub fn cluster_markers(points: &[GeoPoint], zoom: f64, radius_px: f64) -> Vec<Cluster> {
    let projected: Vec<ProjectedPoint> = points
        .iter()
        .enumerate_idx()
        .filter(|(_, point)| point.is_finite())
        .map(|(index, point)| ProjectedPoint::new(project(point, zoom), index))
        .collect();

    let tree = RTree::bulk_load(projected.clone());
    let mut assigned = vec![false; points.len()];
    let mut clusters = vec![];

    for seed in &projected {
        if assigned[seed.data.get()] {
            continue;
        }

        let mut members: SmallVec<[MarkerIdx; 4]> = tree
            .locate_within_distance(*seed.geom(), radius_px * radius_px)
            .map(|neighbor| neighbor.data)
            .filter(|index| !assigned[index.get()])
            .collect();
        members.sort_unstable();

        let (latitude_sum, longitude_sum) =
            members.iter().fold((0.0, 0.0), |(lat, lng), index| {
                assigned[index.get()] = true;
                let point = &points[index.get()];
                (lat + point.latitude, lng + point.longitude)
            });

        let count = members.len() as f64;
        clusters.push(Cluster {
            center: GeoPoint::new(latitude_sum / count, longitude_sum / count),
            members,
        });
    }

    clusters
}

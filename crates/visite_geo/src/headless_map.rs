use fxhash::FxHashMap;
use tracing::debug;

use crate::{
    bounds::{BoundsRegion, Viewport},
    geopoint::GeoPoint,
    map_provider::{InfoWindowHandle, MapEvent, MapProvider, MarkerHandle, PolylineHandle},
};

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMarker {
    pub position: GeoPoint,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessInfoWindow {
    pub anchor: GeoPoint,
    pub content: String,
}

/// A map provider that keeps its overlays in memory.
///
/// Camera moves are not animated: `fit_bounds` applies the web-mercator fit
/// immediately and queues a [`MapEvent::BoundsChanged`] that the host drains
/// with [`HeadlessMap::drain_events`].
#[derive(Debug)]
pub struct HeadlessMap {
    viewport: Viewport,
    center: GeoPoint,
    zoom: f64,
    next_id: u64,
    markers: FxHashMap<u64, HeadlessMarker>,
    polylines: FxHashMap<u64, (GeoPoint, GeoPoint)>,
    info_windows: FxHashMap<u64, HeadlessInfoWindow>,
    pending_events: Vec<MapEvent>,
}

impl HeadlessMap {
    pub fn new(viewport: Viewport, center: GeoPoint, zoom: f64) -> Self {
        Self {
            viewport,
            center,
            zoom,
            next_id: 0,
            markers: FxHashMap::default(),
            polylines: FxHashMap::default(),
            info_windows: FxHashMap::default(),
            pending_events: vec![],
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn marker(&self, handle: MarkerHandle) -> Option<&HeadlessMarker> {
        self.markers.get(&handle.id())
    }

    pub fn polylines(&self) -> impl Iterator<Item = &(GeoPoint, GeoPoint)> {
        self.polylines.values()
    }

    pub fn polyline_count(&self) -> usize {
        self.polylines.len()
    }

    pub fn info_window(&self, handle: InfoWindowHandle) -> Option<&HeadlessInfoWindow> {
        self.info_windows.get(&handle.id())
    }

    pub fn info_window_count(&self) -> usize {
        self.info_windows.len()
    }

    /// True when nothing was left behind on the map.
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.polylines.is_empty() && self.info_windows.is_empty()
    }
}

impl Default for HeadlessMap {
    fn default() -> Self {
        HeadlessMap::new(Viewport::default(), GeoPoint::new(0.0, 0.0), 2.0)
    }
}

impl MapProvider for HeadlessMap {
    fn create_marker(&mut self, position: GeoPoint, title: Option<&str>) -> MarkerHandle {
        let id = self.next_id();
        self.markers.insert(
            id,
            HeadlessMarker {
                position,
                title: title.map(str::to_owned),
            },
        );
        MarkerHandle::new(id)
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        self.markers.remove(&handle.id());
    }

    fn create_polyline(&mut self, from: GeoPoint, to: GeoPoint) -> PolylineHandle {
        let id = self.next_id();
        self.polylines.insert(id, (from, to));
        PolylineHandle::new(id)
    }

    fn remove_polyline(&mut self, handle: PolylineHandle) {
        self.polylines.remove(&handle.id());
    }

    fn open_info_window(&mut self, anchor: GeoPoint, content: &str) -> InfoWindowHandle {
        let id = self.next_id();
        self.info_windows.insert(
            id,
            HeadlessInfoWindow {
                anchor,
                content: content.to_owned(),
            },
        );
        InfoWindowHandle::new(id)
    }

    fn close_info_window(&mut self, handle: InfoWindowHandle) {
        self.info_windows.remove(&handle.id());
    }

    fn fit_bounds(&mut self, bounds: &BoundsRegion) {
        self.center = bounds.center();
        self.zoom = self.viewport.fit_zoom(bounds);
        debug!(
            "HeadlessMap: fitted bounds, center={:?} zoom={}",
            self.center, self.zoom
        );
        self.pending_events.push(MapEvent::BoundsChanged);
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    fn center(&self) -> GeoPoint {
        self.center
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlays_are_tracked_and_removed() {
        let mut map = HeadlessMap::default();

        let marker = map.create_marker(GeoPoint::new(1.0, 1.0), Some("a"));
        let line = map.create_polyline(GeoPoint::new(1.0, 1.0), GeoPoint::new(2.0, 2.0));
        let window = map.open_info_window(GeoPoint::new(1.5, 1.5), "157 km");

        assert_eq!(map.marker(marker).unwrap().title.as_deref(), Some("a"));
        assert_eq!(map.info_window(window).unwrap().content, "157 km");

        map.remove_marker(marker);
        map.remove_polyline(line);
        map.close_info_window(window);
        map.close_info_window(window);

        assert!(map.is_empty());
    }

    #[test]
    fn test_fit_bounds_queues_bounds_changed() {
        let mut map = HeadlessMap::default();
        map.fit_bounds(&BoundsRegion::from_point(&GeoPoint::new(36.0, 3.0)));

        assert_eq!(map.center(), GeoPoint::new(36.0, 3.0));
        assert_eq!(map.drain_events(), vec![MapEvent::BoundsChanged]);
        assert!(map.drain_events().is_empty());
    }
}

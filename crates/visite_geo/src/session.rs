use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    bounds::BoundsRegion,
    distance::{Distance, Meters, format_distance},
    error::GeoError,
    fetch::{Generation, GenerationCounter, Tagged},
    geopoint::GeoPoint,
    info::MarkerPayload,
    map_provider::{
        InfoWindowHandle, MapEvent, MapEventKind, MapProvider, OnceListener, PolylineHandle,
    },
    marker::{MarkerIdx, MarkerRecord, Payload, PlacedMarker},
    nearest::nearest_neighbor,
    placement::{PlacementOptions, place_markers},
};

/// What a selected marker gets linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    /// Closest other placed marker.
    #[default]
    NearestMarker,
    /// The device location set with [`MapSession::set_reference_point`].
    ReferencePoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct SessionOptions {
    pub placement: PlacementOptions,
    pub link_mode: LinkMode,
}

/// Text shown on the active distance line, anchored at its midpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceLabel {
    pub text: String,
    pub anchor: GeoPoint,
    pub distance: Distance<Meters>,
    pub from: GeoPoint,
    pub to: GeoPoint,
    /// The linked marker in [`LinkMode::NearestMarker`].
    pub target: Option<MarkerIdx>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    LineActive,
}

#[derive(Debug)]
struct ActiveLine {
    polyline: PolylineHandle,
    label_window: InfoWindowHandle,
    label: DistanceLabel,
}

/// Outcome of clicking a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub marker: MarkerIdx,
    pub info_window: InfoWindowHandle,
    /// `None` when there was nothing to link to.
    pub line: Option<DistanceLabel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacementSummary {
    pub generation: Generation,
    pub placed: usize,
    pub excluded: usize,
    pub bounds: Option<BoundsRegion>,
}

/// Owns every overlay of one map instance: the markers of the current data
/// set, the marker info window and the single distance line.
///
/// Overlays are torn down when the session is dropped.
pub struct MapSession<M: MapProvider, P = Payload> {
    map: M,
    options: SessionOptions,
    markers: Vec<PlacedMarker<P>>,
    positions: Vec<GeoPoint>,
    active_line: Option<ActiveLine>,
    info_window: Option<InfoWindowHandle>,
    zoom_clamp: OnceListener<f64>,
    reference_point: Option<GeoPoint>,
    generations: GenerationCounter,
    generation: Generation,
}

impl<M: MapProvider, P> MapSession<M, P> {
    pub fn new(map: M, options: SessionOptions) -> Self {
        let generations = GenerationCounter::default();
        let generation = generations.current();

        Self {
            map,
            options,
            markers: vec![],
            positions: vec![],
            active_line: None,
            info_window: None,
            zoom_clamp: OnceListener::disarmed(MapEventKind::BoundsChanged),
            reference_point: None,
            generations,
            generation,
        }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn markers(&self) -> &[PlacedMarker<P>] {
        &self.markers
    }

    pub fn marker(&self, index: MarkerIdx) -> Option<&PlacedMarker<P>> {
        self.markers.get(index.get())
    }

    pub fn link_state(&self) -> LinkState {
        match self.active_line {
            Some(_) => LinkState::LineActive,
            None => LinkState::Idle,
        }
    }

    pub fn active_label(&self) -> Option<&DistanceLabel> {
        self.active_line.as_ref().map(|line| &line.label)
    }

    pub fn reference_point(&self) -> Option<GeoPoint> {
        self.reference_point
    }

    pub fn set_reference_point(&mut self, point: Option<GeoPoint>) {
        self.reference_point = point.filter(GeoPoint::is_finite);
    }

    pub fn set_link_mode(&mut self, link_mode: LinkMode) {
        self.clear_line();
        self.options.link_mode = link_mode;
    }

    /// Generation of the data set currently on the map.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Starts a new data set refresh. Data fetched for any earlier
    /// generation is refused by [`MapSession::apply_fetched`].
    pub fn begin_refresh(&mut self) -> Generation {
        self.generations.advance()
    }

    /// Removes the distance line and its label. Safe to call when no line
    /// is drawn.
    pub fn clear_line(&mut self) {
        if let Some(line) = self.active_line.take() {
            self.map.remove_polyline(line.polyline);
            self.map.close_info_window(line.label_window);
        }
    }

    /// Removes every overlay the session placed.
    pub fn clear_overlays(&mut self) {
        self.clear_line();

        if let Some(window) = self.info_window.take() {
            self.map.close_info_window(window);
        }

        for marker in self.markers.drain(..) {
            self.map.remove_marker(marker.handle);
        }

        self.positions.clear();
        self.zoom_clamp.dispose();
    }

    pub fn dispose(&mut self) {
        self.clear_overlays();
    }

    fn draw_line(
        &mut self,
        from: GeoPoint,
        to: GeoPoint,
        target: Option<MarkerIdx>,
    ) -> DistanceLabel {
        // text from the unrounded value, like `distance`
        let label = DistanceLabel {
            text: format_distance(from.haversine_km(&to)),
            anchor: from.midpoint(&to),
            distance: from.haversine_distance(&to),
            from,
            to,
            target,
        };

        let polyline = self.map.create_polyline(from, to);
        let label_window = self.map.open_info_window(label.anchor, &label.text);

        self.active_line = Some(ActiveLine {
            polyline,
            label_window,
            label: label.clone(),
        });

        label
    }

    fn link(&mut self, index: MarkerIdx) -> Result<DistanceLabel, GeoError> {
        let selected = self.markers[index].position;

        match self.options.link_mode {
            LinkMode::NearestMarker => {
                let nearest = nearest_neighbor(index, &self.positions)
                    .ok_or(GeoError::NoNearestCandidate)?;
                let to = self.markers[nearest.index].position;
                Ok(self.draw_line(selected, to, Some(nearest.index)))
            }
            LinkMode::ReferencePoint => {
                let reference = self.reference_point.ok_or_else(|| {
                    GeoError::GeolocationUnavailable("no reference point".to_string())
                })?;
                Ok(self.draw_line(reference, selected, None))
            }
        }
    }
}

impl<M: MapProvider, P: MarkerPayload> MapSession<M, P> {
    /// Replaces the markers on the map with the usable records of `records`.
    pub fn place_markers(&mut self, records: Vec<MarkerRecord<P>>) -> PlacementSummary {
        self.generation = self.generations.advance();
        self.place(records)
    }

    /// Places a fetched data set, unless a newer refresh has started since
    /// it was requested.
    pub fn apply_fetched(
        &mut self,
        fetched: Tagged<Vec<MarkerRecord<P>>>,
    ) -> Option<PlacementSummary> {
        let generation = fetched.generation;
        let records = self.generations.accept(fetched)?;

        self.generation = generation;
        Some(self.place(records))
    }

    fn place(&mut self, records: Vec<MarkerRecord<P>>) -> PlacementSummary {
        self.clear_overlays();

        let placement = place_markers(&mut self.map, records, &self.options.placement);

        match placement.fitted_bounds() {
            Ok(_) => {
                self.zoom_clamp = OnceListener::new(
                    MapEventKind::BoundsChanged,
                    self.options.placement.max_zoom,
                );
            }
            Err(err) => debug!("Viewport left alone: {}", err),
        }

        self.positions = placement
            .markers
            .iter()
            .map(|marker| marker.position)
            .collect();
        self.markers = placement.markers;

        PlacementSummary {
            generation: self.generation,
            placed: self.markers.len(),
            excluded: placement.excluded,
            bounds: placement.bounds,
        }
    }

    /// Handles a click on a placed marker: opens its info window and draws
    /// the distance line of the current [`LinkMode`].
    pub fn select_marker(&mut self, index: MarkerIdx) -> Result<Selection, GeoError> {
        let marker = self
            .markers
            .get(index.get())
            .ok_or(GeoError::UnknownMarker(index))?;
        let position = marker.position;
        let content = marker.record.payload.info_content().render();

        self.clear_line();

        if let Some(window) = self.info_window.take() {
            self.map.close_info_window(window);
        }
        let info_window = self.map.open_info_window(position, &content);
        self.info_window = Some(info_window);

        let line = match self.link(index) {
            Ok(label) => Some(label),
            Err(err) if err.is_recoverable() => {
                debug!("No distance line for marker {}: {}", index, err);
                None
            }
            Err(err) => {
                warn!("No distance line for marker {}: {}", index, err);
                None
            }
        };

        Ok(Selection {
            marker: index,
            info_window,
            line,
        })
    }

    /// Forwards a map SDK event to the session.
    pub fn handle_event(&mut self, event: &MapEvent) -> Option<Selection> {
        match event {
            MapEvent::BoundsChanged => {
                if let Some(max_zoom) = self.zoom_clamp.fire(event) {
                    if self.map.zoom() != max_zoom {
                        self.map.set_zoom(max_zoom);
                    }
                }
                None
            }
            MapEvent::Click { .. } => {
                self.clear_line();
                None
            }
            MapEvent::MarkerClick(index) => match self.select_marker(*index) {
                Ok(selection) => Some(selection),
                Err(err) => {
                    warn!("Ignoring marker click: {}", err);
                    None
                }
            },
        }
    }
}

impl<M: MapProvider, P> Drop for MapSession<M, P> {
    fn drop(&mut self) {
        self.clear_overlays();
    }
}

use crate::{bounds::BoundsRegion, geopoint::GeoPoint, marker::MarkerIdx};

macro_rules! define_overlay_handle {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            pub const fn id(&self) -> u64 {
                self.0
            }
        }
    };
}

define_overlay_handle!(MarkerHandle);
define_overlay_handle!(PolylineHandle);
define_overlay_handle!(InfoWindowHandle);

/// The capability set the engine needs from a map SDK.
///
/// Removal of a handle the provider does not know about must be a no-op.
pub trait MapProvider {
    fn create_marker(&mut self, position: GeoPoint, title: Option<&str>) -> MarkerHandle;

    fn remove_marker(&mut self, handle: MarkerHandle);

    fn create_polyline(&mut self, from: GeoPoint, to: GeoPoint) -> PolylineHandle;

    fn remove_polyline(&mut self, handle: PolylineHandle);

    fn open_info_window(&mut self, anchor: GeoPoint, content: &str) -> InfoWindowHandle;

    fn close_info_window(&mut self, handle: InfoWindowHandle);

    /// Moves the viewport so that `bounds` is visible. Providers report the
    /// end of the camera move with [`MapEvent::BoundsChanged`].
    fn fit_bounds(&mut self, bounds: &BoundsRegion);

    fn zoom(&self) -> f64;

    fn set_zoom(&mut self, zoom: f64);

    fn center(&self) -> GeoPoint;
}

/// Events the host forwards from the map SDK to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    BoundsChanged,
    Click { position: GeoPoint },
    MarkerClick(MarkerIdx),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEventKind {
    BoundsChanged,
    Click,
    MarkerClick,
}

impl MapEvent {
    pub fn kind(&self) -> MapEventKind {
        match self {
            MapEvent::BoundsChanged => MapEventKind::BoundsChanged,
            MapEvent::Click { .. } => MapEventKind::Click,
            MapEvent::MarkerClick(_) => MapEventKind::MarkerClick,
        }
    }
}

/// A subscription that hands out its action the first time a matching event
/// is seen and is spent afterwards.
#[derive(Debug)]
pub struct OnceListener<A> {
    kind: MapEventKind,
    action: Option<A>,
}

impl<A> OnceListener<A> {
    pub fn new(kind: MapEventKind, action: A) -> Self {
        Self {
            kind,
            action: Some(action),
        }
    }

    pub fn disarmed(kind: MapEventKind) -> Self {
        Self { kind, action: None }
    }

    pub fn is_armed(&self) -> bool {
        self.action.is_some()
    }

    /// Takes the action if `event` matches, leaving the listener spent.
    pub fn fire(&mut self, event: &MapEvent) -> Option<A> {
        if event.kind() != self.kind {
            return None;
        }

        self.action.take()
    }

    pub fn dispose(&mut self) {
        self.action = None;
    }
}

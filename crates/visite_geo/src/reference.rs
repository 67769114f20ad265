use std::{future::Future, time::Duration};

use jiff::Timestamp;
use tracing::{debug, warn};

use crate::{error::GeoError, geopoint::GeoPoint};

pub const DEFAULT_GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of the device's current position.
pub trait Geolocator {
    fn current_position(&self) -> impl Future<Output = Result<GeoPoint, GeoError>> + Send;
}

/// A geolocator that always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub GeoPoint);

impl Geolocator for FixedGeolocator {
    fn current_position(&self) -> impl Future<Output = Result<GeoPoint, GeoError>> + Send {
        let position = self.0;
        async move { Ok(position) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub position: GeoPoint,
    pub acquired_at: Timestamp,
}

/// Asks the device for its position once and remembers the answer.
pub struct ReferenceLocator<G> {
    geolocator: G,
    timeout: Duration,
    fix: Option<LocationFix>,
}

impl<G: Geolocator> ReferenceLocator<G> {
    pub fn new(geolocator: G, timeout: Duration) -> Self {
        Self {
            geolocator,
            timeout,
            fix: None,
        }
    }

    pub fn fix(&self) -> Option<&LocationFix> {
        self.fix.as_ref()
    }

    /// The cached fix, or a fresh one from the geolocator. Failures are not
    /// cached so that a later call can retry.
    pub async fn locate_once(&mut self) -> Result<GeoPoint, GeoError> {
        if let Some(fix) = &self.fix {
            return Ok(fix.position);
        }

        let position = match tokio::time::timeout(self.timeout, self.geolocator.current_position())
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!("Geolocation timed out after {:?}", self.timeout);
                return Err(GeoError::GeolocationTimeout);
            }
        };

        if !position.is_in_range() {
            return Err(GeoError::GeolocationUnavailable(format!(
                "invalid position {:?}",
                position
            )));
        }

        debug!("Acquired device location {:?}", position);
        self.fix = Some(LocationFix {
            position,
            acquired_at: Timestamp::now(),
        });

        Ok(position)
    }

    pub fn forget(&mut self) {
        self.fix = None;
    }
}

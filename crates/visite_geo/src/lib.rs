pub mod bounds;
pub mod client;
pub mod cluster;
pub mod config;
pub mod distance;
pub mod error;
pub mod fetch;
pub mod geopoint;
pub mod headless_map;
pub mod info;
pub mod map_provider;
pub mod marker;
pub mod nearest;
pub mod placement;
pub mod reference;
pub mod schema;
pub mod session;
mod utils;

pub use distance::distance;
pub use error::GeoError;
pub use geopoint::GeoPoint;
pub use marker::{MarkerIdx, MarkerRecord};
pub use session::MapSession;

#[cfg(test)]
pub(crate) mod test_utils;

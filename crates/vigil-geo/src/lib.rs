//! VIGIL Geo - Pure geodesic math
//!
//! Great-circle distance, geofence membership, centroid, bearing, and
//! bounding boxes. Everything here is a pure function over validated
//! `Coordinate`s; no state, no I/O.

pub mod distance;
pub mod polygon;
pub mod bbox;
pub mod area;

pub use distance::*;
pub use polygon::*;
pub use bbox::*;
pub use area::*;

/// Mean Earth radius in kilometers, shared by all haversine math
pub const EARTH_RADIUS_KM: f64 = 6371.0;

//! Geographic value types
//!
//! `Coordinate` is an immutable validated (longitude, latitude) pair;
//! `TargetArea` is the geofence shape attached to broadcasts. Geometry
//! algorithms over these types live in `vigil-geo`.

use serde::{Deserialize, Serialize};

use crate::{VigilError, VigilResult};

/// A validated geographic position: longitude ∈ [-180, 180],
/// latitude ∈ [-90, 90], both finite.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    longitude: f64,
    latitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting non-finite or out-of-range values
    pub fn new(longitude: f64, latitude: f64) -> VigilResult<Self> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(VigilError::InvalidCoordinate {
                longitude,
                latitude,
            });
        }
        if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
            return Err(VigilError::InvalidCoordinate {
                longitude,
                latitude,
            });
        }
        Ok(Coordinate {
            longitude,
            latitude,
        })
    }

    #[inline]
    pub fn longitude(self) -> f64 {
        self.longitude
    }

    #[inline]
    pub fn latitude(self) -> f64 {
        self.latitude
    }
}

impl std::fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.longitude, self.latitude)
    }
}

/// Geofence shape for broadcast targeting
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TargetArea {
    /// All points within `radius_km` of `center` (inclusive boundary)
    Circle { center: Coordinate, radius_km: f64 },
    /// Closed polygon ring of at least 3 vertices
    Polygon { ring: Vec<Coordinate> },
}

impl TargetArea {
    /// Circle helper, validating the radius
    pub fn circle(center: Coordinate, radius_km: f64) -> VigilResult<Self> {
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(VigilError::InvalidCoordinate {
                longitude: radius_km,
                latitude: f64::NAN,
            });
        }
        Ok(TargetArea::Circle { center, radius_km })
    }

    /// Polygon helper, requiring at least 3 vertices
    pub fn polygon(ring: Vec<Coordinate>) -> VigilResult<Self> {
        if ring.len() < 3 {
            return Err(VigilError::DegeneratePolygon {
                vertices: ring.len(),
            });
        }
        Ok(TargetArea::Polygon { ring })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_valid_range() {
        assert!(Coordinate::new(0.0, 0.0).is_ok());
        assert!(Coordinate::new(-180.0, 90.0).is_ok());
        assert!(Coordinate::new(180.0, -90.0).is_ok());
    }

    #[test]
    fn test_coordinate_rejects_out_of_range() {
        assert!(Coordinate::new(181.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, 91.0).is_err());
        assert!(Coordinate::new(-200.0, 0.0).is_err());
    }

    #[test]
    fn test_coordinate_rejects_non_finite() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_polygon_requires_three_vertices() {
        let a = Coordinate::new(0.0, 0.0).unwrap();
        let b = Coordinate::new(1.0, 0.0).unwrap();

        assert!(TargetArea::polygon(vec![a, b]).is_err());
        assert!(TargetArea::polygon(vec![a, b, a]).is_ok());
    }

    #[test]
    fn test_circle_rejects_negative_radius() {
        let c = Coordinate::new(0.0, 0.0).unwrap();
        assert!(TargetArea::circle(c, -1.0).is_err());
        assert!(TargetArea::circle(c, f64::NAN).is_err());
    }
}

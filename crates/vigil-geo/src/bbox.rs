//! Coarse bounding boxes for circle pre-filtering
//!
//! The registry's geo queries run a cheap rectangle test before the
//! exact haversine check. The box over-approximates: it always fully
//! contains the circle, never the reverse.

use vigil_core::Coordinate;

use crate::EARTH_RADIUS_KM;

/// Latitude/longitude rectangle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Cheap containment test
    #[inline]
    pub fn contains(&self, point: Coordinate) -> bool {
        point.latitude() >= self.min_lat
            && point.latitude() <= self.max_lat
            && point.longitude() >= self.min_lon
            && point.longitude() <= self.max_lon
    }
}

/// Rectangle guaranteed to contain the circle of `radius_km` around
/// `center`. Near the poles or across the antimeridian the box widens
/// to the full longitude span rather than wrapping.
pub fn bounding_box(center: Coordinate, radius_km: f64) -> BoundingBox {
    let angular = radius_km / EARTH_RADIUS_KM;
    let d_lat = angular.to_degrees();

    let min_lat = (center.latitude() - d_lat).max(-90.0);
    let max_lat = (center.latitude() + d_lat).min(90.0);

    // Longitude shrink factor at the extreme latitude of the box keeps
    // the rectangle an over-approximation at every contained latitude
    let extreme_lat = min_lat.abs().max(max_lat.abs()).to_radians();
    let cos_lat = extreme_lat.cos();

    if cos_lat < 1e-9 {
        return BoundingBox {
            min_lat,
            max_lat,
            min_lon: -180.0,
            max_lon: 180.0,
        };
    }

    let d_lon = (angular / cos_lat).to_degrees();
    let min_lon = center.longitude() - d_lon;
    let max_lon = center.longitude() + d_lon;

    if min_lon < -180.0 || max_lon > 180.0 {
        // Crosses the antimeridian: fall back to the full span
        BoundingBox {
            min_lat,
            max_lat,
            min_lon: -180.0,
            max_lon: 180.0,
        }
    } else {
        BoundingBox {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{distance_km, within_radius};

    fn coord(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat).unwrap()
    }

    #[test]
    fn test_box_contains_center() {
        let center = coord(106.8, -6.2);
        let bbox = bounding_box(center, 10.0);
        assert!(bbox.contains(center));
    }

    #[test]
    fn test_box_contains_circle_boundary() {
        let center = coord(106.8, -6.2);
        let radius = 25.0;
        let bbox = bounding_box(center, radius);

        // Walk the circle boundary in 8 directions
        for octant in 0..8 {
            let target_bearing = octant as f64 * 45.0;
            let point = offset_point(center, radius * 0.999, target_bearing);
            assert!(
                bbox.contains(point),
                "boundary point at bearing {target_bearing} escaped the box"
            );
            assert!(within_radius(point, center, radius));
        }
    }

    #[test]
    fn test_box_near_pole_spans_all_longitudes() {
        let center = coord(10.0, 89.5);
        let bbox = bounding_box(center, 100.0);

        assert_eq!(bbox.min_lon, -180.0);
        assert_eq!(bbox.max_lon, 180.0);
        assert_eq!(bbox.max_lat, 90.0);
    }

    #[test]
    fn test_box_across_antimeridian_spans_all_longitudes() {
        let center = coord(179.9, 0.0);
        let bbox = bounding_box(center, 50.0);

        assert_eq!(bbox.min_lon, -180.0);
        assert_eq!(bbox.max_lon, 180.0);
    }

    #[test]
    fn test_box_excludes_distant_points() {
        let center = coord(0.0, 0.0);
        let bbox = bounding_box(center, 5.0);

        assert!(!bbox.contains(coord(1.0, 0.0))); // ~111 km away
    }

    /// Destination point at a given distance and initial bearing
    fn offset_point(start: Coordinate, distance_km_val: f64, bearing_deg: f64) -> Coordinate {
        let angular = distance_km_val / EARTH_RADIUS_KM;
        let bearing = bearing_deg.to_radians();
        let lat1 = start.latitude().to_radians();
        let lon1 = start.longitude().to_radians();

        let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
        let lon2 = lon1
            + (bearing.sin() * angular.sin() * lat1.cos())
                .atan2(angular.cos() - lat1.sin() * lat2.sin());

        let point = Coordinate::new(lon2.to_degrees(), lat2.to_degrees()).unwrap();
        // Sanity: the synthesized point really is on the circle
        assert!((distance_km(start, point) - distance_km_val).abs() < 0.1);
        point
    }
}

//! Great-circle distance and bearing (haversine formula)

use vigil_core::Coordinate;

use crate::EARTH_RADIUS_KM;

const KM_PER_MILE: f64 = 1.609344;

/// Output unit for distance calculations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceUnit {
    Kilometers,
    Miles,
}

/// Great-circle distance between two coordinates in kilometers.
/// Symmetric; zero for identical points.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude().to_radians();
    let lat_b = b.latitude().to_radians();
    let d_lat = (b.latitude() - a.latitude()).to_radians();
    let d_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    // asin of a clamped value keeps antipodal rounding from producing NaN
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Great-circle distance in the requested unit
pub fn distance(a: Coordinate, b: Coordinate, unit: DistanceUnit) -> f64 {
    let km = distance_km(a, b);
    match unit {
        DistanceUnit::Kilometers => km,
        DistanceUnit::Miles => km / KM_PER_MILE,
    }
}

/// True iff `point` is within `radius_km` of `center`, boundary inclusive
pub fn within_radius(point: Coordinate, center: Coordinate, radius_km: f64) -> bool {
    distance_km(point, center) <= radius_km
}

/// Initial bearing from `a` to `b` in degrees, normalized to [0, 360)
pub fn bearing_degrees(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude().to_radians();
    let lat_b = b.latitude().to_radians();
    let d_lon = (b.longitude() - a.longitude()).to_radians();

    let y = d_lon.sin() * lat_b.cos();
    let x = lat_a.cos() * lat_b.sin() - lat_a.sin() * lat_b.cos() * d_lon.cos();

    y.atan2(x).to_degrees().rem_euclid(360.0)
}

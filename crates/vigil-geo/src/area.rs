//! Membership and center helpers over `TargetArea`

use vigil_core::{Coordinate, TargetArea};

use crate::{centroid, point_in_polygon, within_radius};

/// True iff `point` falls inside the geofence
pub fn area_contains(area: &TargetArea, point: Coordinate) -> bool {
    match area {
        TargetArea::Circle { center, radius_km } => within_radius(point, *center, *radius_km),
        TargetArea::Polygon { ring } => point_in_polygon(point, ring),
    }
}

/// Representative center of the geofence: the circle's center, or the
/// polygon's spherical centroid. `None` only for a degenerate empty ring.
pub fn area_center(area: &TargetArea) -> Option<Coordinate> {
    match area {
        TargetArea::Circle { center, .. } => Some(*center),
        TargetArea::Polygon { ring } => centroid(ring),
    }
}

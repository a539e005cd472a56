//! Polygon membership and spherical centroid

use vigil_core::Coordinate;

/// Tolerance for the point-on-edge test, in degrees
const EDGE_EPSILON: f64 = 1e-9;

/// Ray-casting point-in-polygon test over lon/lat space.
///
/// Points exactly on an edge count as inside. The ring is treated as
/// closed; the last vertex does not need to repeat the first.
pub fn point_in_polygon(point: Coordinate, ring: &[Coordinate]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let px = point.longitude();
    let py = point.latitude();

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].longitude(), ring[i].latitude());
        let (xj, yj) = (ring[j].longitude(), ring[j].latitude());

        if on_segment(px, py, xi, yi, xj, yj) {
            return true;
        }

        if (yi > py) != (yj > py) {
            let x_cross = (xj - xi) * (py - yi) / (yj - yi) + xi;
            if px < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Collinear-and-between test for the edge rule
fn on_segment(px: f64, py: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> bool {
    let cross = (x2 - x1) * (py - y1) - (y2 - y1) * (px - x1);
    if cross.abs() > EDGE_EPSILON {
        return false;
    }
    let dot = (px - x1) * (x2 - x1) + (py - y1) * (y2 - y1);
    let len_sq = (x2 - x1).powi(2) + (y2 - y1).powi(2);
    dot >= -EDGE_EPSILON && dot <= len_sq + EDGE_EPSILON
}

/// Spherical centroid: unit-vector mean projected back to lon/lat.
/// `None` for empty input; a single point is returned unchanged.
pub fn centroid(points: &[Coordinate]) -> Option<Coordinate> {
    match points {
        [] => None,
        [only] => Some(*only),
        _ => {
            let (mut x, mut y, mut z) = (0.0f64, 0.0f64, 0.0f64);
            for p in points {
                let lat = p.latitude().to_radians();
                let lon = p.longitude().to_radians();
                x += lat.cos() * lon.cos();
                y += lat.cos() * lon.sin();
                z += lat.sin();
            }
            let n = points.len() as f64;
            x /= n;
            y /= n;
            z /= n;

            let lon = y.atan2(x).to_degrees();
            let hyp = (x * x + y * y).sqrt();
            let lat = z.atan2(hyp).to_degrees();

            // Mean vector of validated inputs stays in range
            Coordinate::new(lon, lat).ok()
        }
    }
}

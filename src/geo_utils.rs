//! Geographic utilities: great-circle distance, path length, path
//! simplification, and distance display formatting.

use crate::TrackPoint;

/// Mean Earth radius in meters, used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points in meters (haversine).
///
/// # Example
/// ```
/// use runtest::{haversine_distance, TrackPoint};
///
/// let london = TrackPoint::new(51.5074, -0.1278);
/// let paris = TrackPoint::new(48.8566, 2.3522);
/// let distance = haversine_distance(&london, &paris);
/// assert!(distance > 340_000.0 && distance < 350_000.0);
/// ```
pub fn haversine_distance(a: &TrackPoint, b: &TrackPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Total distance along a path in meters.
pub fn polyline_length(points: &[TrackPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Douglas-Peucker simplification of a recorded path, for map rendering.
///
/// Reduces the number of points while preserving shape. Tolerance is in
/// coordinate degrees (0.0001 is roughly 11 meters).
pub fn simplify_path(points: &[TrackPoint], tolerance_deg: f64) -> Vec<TrackPoint> {
    use geo::{algorithm::simplify::Simplify, Coord, LineString};

    if points.len() < 3 {
        return points.to_vec();
    }

    let coords: Vec<Coord<f64>> = points
        .iter()
        .map(|p| Coord {
            x: p.longitude,
            y: p.latitude,
        })
        .collect();

    let line = LineString::new(coords);
    let simplified = line.simplify(&tolerance_deg);

    simplified
        .coords()
        .map(|c| TrackPoint::new(c.y, c.x))
        .collect()
}

/// Format a distance for display: whole meters below 1 km, kilometers
/// with two decimals at or above.
///
/// # Example
/// ```
/// use runtest::format_distance;
///
/// assert_eq!(format_distance(842.3), "842 m");
/// assert_eq!(format_distance(1243.0), "1.24 km");
/// ```
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{} m", meters.round() as i64)
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

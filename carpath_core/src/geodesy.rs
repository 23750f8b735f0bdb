//! Geodesy helpers - great-circle bearing, haversine distances, map framing.
//!
//! Coordinates are degrees (WGS84). `geo` works in (x = longitude,
//! y = latitude) order, so conversions happen at this module's boundary.

use carpath_env::{Coordinate, Region};
use geo::{BoundingRect, HaversineDistance, HaversineLength, LineString, Point};

/// Smallest span (degrees) used when framing a region.
///
/// Keeps a single-point or perfectly straight route from collapsing the
/// viewport to zero width.
pub const MIN_SPAN_DEGREES: f64 = 0.005;

/// Initial great-circle bearing from `from` toward `to`.
///
/// Returns degrees clockwise from true north in `[0, 360)`.
/// Coincident points give `atan2(0, 0) = 0`.
pub fn bearing(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Maps an angle from `(-360, 360)` into `[0, 360)`.
fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = if degrees < 0.0 { degrees + 360.0 } else { degrees };
    // -1e-15 + 360.0 rounds to exactly 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

fn to_point(c: Coordinate) -> Point<f64> {
    Point::new(c.longitude, c.latitude)
}

fn to_line_string(points: &[Coordinate]) -> LineString<f64> {
    LineString::from(
        points
            .iter()
            .map(|c| (c.longitude, c.latitude))
            .collect::<Vec<_>>(),
    )
}

/// Haversine distance in meters.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    to_point(a).haversine_distance(&to_point(b))
}

/// Total haversine length of a polyline in meters.
pub fn path_length_meters(points: &[Coordinate]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    to_line_string(points).haversine_length()
}

/// Linear interpolation between two coordinates (`fraction` in `[0, 1]`).
///
/// Adequate for the short hops between consecutive route points.
pub fn interpolate(a: Coordinate, b: Coordinate, fraction: f64) -> Coordinate {
    Coordinate::new(
        a.latitude + (b.latitude - a.latitude) * fraction,
        a.longitude + (b.longitude - a.longitude) * fraction,
    )
}

/// Region enclosing every point, with each span scaled by `padding`.
///
/// Returns `None` for an empty slice.
pub fn bounding_region(points: &[Coordinate], padding: f64) -> Option<Region> {
    let rect = to_line_string(points).bounding_rect()?;
    let center = rect.center();

    Some(Region::new(
        Coordinate::new(center.y, center.x),
        (rect.height() * padding).max(MIN_SPAN_DEGREES),
        (rect.width() * padding).max(MIN_SPAN_DEGREES),
    ))
}

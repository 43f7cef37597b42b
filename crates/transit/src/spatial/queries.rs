//! Distance calculations on a spherical Earth.
//!
//! All distances use the haversine formula with the mean Earth radius
//! `geo` uses (6 371 008.8 m). A stop whose haversine distance equals the
//! query radius counts as inside.

use geo::{HaversineDistance, Point};

/// Mean Earth radius in meters, identical to `geo`'s haversine model
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Calculate Haversine distance between two points in meters
pub fn haversine_distance(p1: Point, p2: Point) -> f64 {
    p1.haversine_distance(&p2)
}

/// Project a lon/lat point onto a sphere of radius [`EARTH_RADIUS_M`]
pub fn to_cartesian(point: Point) -> [f64; 3] {
    let lat = point.y().to_radians();
    let lon = point.x().to_radians();
    [
        EARTH_RADIUS_M * lat.cos() * lon.cos(),
        EARTH_RADIUS_M * lat.cos() * lon.sin(),
        EARTH_RADIUS_M * lat.sin(),
    ]
}

/// Straight-line chord length subtending a great-circle arc of `meters`
///
/// Chord length grows monotonically with arc length up to half the
/// circumference, after which every point on the sphere is reachable.
pub fn arc_to_chord(meters: f64) -> f64 {
    let angle = (meters / EARTH_RADIUS_M).min(std::f64::consts::PI);
    2.0 * EARTH_RADIUS_M * (angle / 2.0).sin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_haversine_distance() {
        // Distance from NYC to LA is approximately 3,936 km
        let nyc = Point::new(-74.0060, 40.7128);
        let la = Point::new(-118.2437, 34.0522);

        let dist = haversine_distance(nyc, la);
        assert!((dist - 3_936_000.0).abs() < 50_000.0); // Within 50km
    }

    #[test]
    fn test_short_distance() {
        // One ten-thousandth of a degree each way in Chicago is ~14m
        let a = Point::new(-87.6300, 41.8800);
        let b = Point::new(-87.6301, 41.8801);

        let dist = haversine_distance(a, b);
        assert!(dist > 10.0 && dist < 20.0, "{dist}");
    }

    #[test]
    fn test_chord_matches_cartesian_distance() {
        let a = Point::new(-87.63, 41.88);
        let b = Point::new(-87.60, 41.95);

        let (ca, cb) = (to_cartesian(a), to_cartesian(b));
        let chord = ((ca[0] - cb[0]).powi(2) + (ca[1] - cb[1]).powi(2) + (ca[2] - cb[2]).powi(2))
            .sqrt();

        assert_relative_eq!(chord, arc_to_chord(haversine_distance(a, b)), max_relative = 1e-6);
    }

    #[test]
    fn test_chord_saturates_at_diameter() {
        assert_relative_eq!(arc_to_chord(1e9), 2.0 * EARTH_RADIUS_M);
        assert_eq!(arc_to_chord(0.0), 0.0);
    }
}

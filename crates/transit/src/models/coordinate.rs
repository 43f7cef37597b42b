//! Validated WGS84 coordinates.

use geo::Point;

use crate::models::types::CoordinateError;

/// A latitude/longitude pair that is known to be finite and in range.
///
/// Latitude is in `[-90, 90]`, longitude in `[-180, 180]`, both in degrees.
/// The only way to build one is [`Coordinate::new`], so holding a
/// `Coordinate` is proof of validity.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }

        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// `geo` point with x = longitude, y = latitude
    pub fn to_point(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }
}

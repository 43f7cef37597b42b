//! Core data types and errors.

use std::time::Duration;

use crate::identifiers::*;
use crate::models::coordinate::Coordinate;

// ============================================================================
// Data Structures
// ============================================================================

/// One stop occurrence on one route, as listed by the feed
///
/// The same location may appear several times for a route; every row is kept.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StopRecord {
    pub route_id: RouteIdentifier,
    pub stop_id: Option<StopIdentifier>,
    pub coordinate: Coordinate,
}

impl StopRecord {
    pub fn new(route_id: RouteIdentifier, coordinate: Coordinate) -> Self {
        Self {
            route_id,
            stop_id: None,
            coordinate,
        }
    }

    pub fn with_stop_id(mut self, stop_id: StopIdentifier) -> Self {
        self.stop_id = Some(stop_id);
        self
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("Latitude out of range [-90, 90]: {0}")]
    Latitude(f64),

    #[error("Longitude out of range [-180, 180]: {0}")]
    Longitude(f64),
}

/// Why a single feed row was dropped
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("Malformed row: {0}")]
    MalformedRow(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

/// Failure to obtain raw feed bytes
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    #[error("Feed fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Feed server error: HTTP {status}")]
    ServerError { status: u16 },
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchFailure),

    #[error("Refresh did not finish within {0:?}")]
    TimedOut(Duration),
}

/// Caller-facing query errors
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordinateError),

    #[error("Route index unavailable: {0}")]
    IndexUnavailable(#[source] RefreshError),
}

pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_record_builder() {
        let coordinate = Coordinate::new(41.88, -87.63).unwrap();
        let record = StopRecord::new(RouteIdentifier::new("146"), coordinate)
            .with_stop_id(StopIdentifier::new("1106"));

        assert_eq!(record.route_id.as_str(), "146");
        assert_eq!(record.stop_id.as_ref().map(|s| s.as_str()), Some("1106"));
        assert_eq!(record.coordinate, coordinate);
    }

    #[test]
    fn test_error_messages() {
        let err = QueryError::IndexUnavailable(RefreshError::Fetch(FetchFailure::ServerError {
            status: 503,
        }));
        assert_eq!(
            err.to_string(),
            "Route index unavailable: Feed server error: HTTP 503"
        );

        let err: QueryError = CoordinateError::Latitude(91.0).into();
        assert!(matches!(err, QueryError::InvalidCoordinate(_)));
    }
}

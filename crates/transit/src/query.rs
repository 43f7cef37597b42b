//! Radius queries against the freshest available route index.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::identifiers::RouteIdentifier;
use crate::models::{Coordinate, Result};
use crate::provider::{RouteIndex, StopMatch};
use crate::refresh::{RefreshCoordinator, Snapshot};

/// Answers "which routes stop within this radius of a point?"
#[derive(Clone)]
pub struct ProximityQueryEngine {
    coordinator: RefreshCoordinator,
    first_load_timeout: Duration,
}

impl ProximityQueryEngine {
    pub fn new(coordinator: RefreshCoordinator, first_load_timeout: Duration) -> Self {
        Self {
            coordinator,
            first_load_timeout,
        }
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Routes with at least one stop within `radius_m` meters of `point`
    ///
    /// Pure function of its arguments. A radius that is not a positive,
    /// finite number yields an empty set.
    pub fn query(point: Coordinate, radius_m: f64, snapshot: &RouteIndex) -> HashSet<RouteIdentifier> {
        snapshot.routes_near(point, radius_m)
    }

    /// Validate the point, obtain a snapshot no older than `max_staleness`
    /// (or the stale one while it refreshes) and query it
    ///
    /// Routes come back in the order they first appear in the feed.
    pub async fn query_routes_near(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: f64,
        max_staleness: Duration,
    ) -> Result<Vec<RouteIdentifier>> {
        let (point, snapshot) = self.prepare(latitude, longitude, max_staleness).await?;

        let started = std::time::Instant::now();
        let index = snapshot.index();
        let routes = index.in_feed_order(&Self::query(point, radius_m, index));

        tracing::debug!(
            latitude,
            longitude,
            radius_m,
            matches = routes.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Answered proximity query"
        );

        Ok(routes)
    }

    /// Like [`Self::query_routes_near`], but returns the matching stops, nearest first
    pub async fn stops_near(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: f64,
        max_staleness: Duration,
    ) -> Result<Vec<StopMatch>> {
        let (point, snapshot) = self.prepare(latitude, longitude, max_staleness).await?;
        Ok(snapshot.index().stops_near(point, radius_m))
    }

    /// Point validation happens before any snapshot work
    async fn prepare(
        &self,
        latitude: f64,
        longitude: f64,
        max_staleness: Duration,
    ) -> Result<(Coordinate, Arc<Snapshot>)> {
        let point = Coordinate::new(latitude, longitude)?;
        let snapshot = self
            .coordinator
            .get_snapshot(max_staleness, self.first_load_timeout)
            .await?;
        Ok((point, snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;

    use crate::feed::{parse_feed, FeedFormat};
    use crate::models::{CoordinateError, FetchFailure, QueryError};
    use crate::network::{FeedSource, FetchResult};

    fn scenario_format() -> FeedFormat {
        FeedFormat {
            delimiter: ',',
            route_column: 0,
            stop_column: None,
            latitude_column: 3,
            longitude_column: 4,
        }
    }

    fn scenario_index() -> RouteIndex {
        RouteIndex::build(parse_feed(b"146,X,Y,41.8800,-87.6300\n", &scenario_format()).records)
    }

    struct Unreachable;

    impl FeedSource for Unreachable {
        fn fetch<'a>(&'a self) -> Pin<Box<dyn Future<Output = FetchResult> + Send + 'a>> {
            Box::pin(async { Err(FetchFailure::Network("unreachable".into())) })
        }
    }

    struct Fixture;

    impl FeedSource for Fixture {
        fn fetch<'a>(&'a self) -> Pin<Box<dyn Future<Output = FetchResult> + Send + 'a>> {
            Box::pin(async { Ok(b"146,X,Y,41.8800,-87.6300\n".to_vec()) })
        }
    }

    #[test]
    fn test_route_within_radius() {
        let index = scenario_index();
        let point = Coordinate::new(41.8801, -87.6301).unwrap();

        let routes = ProximityQueryEngine::query(point, 500.0, &index);
        assert!(routes.contains(&RouteIdentifier::new("146")));
    }

    #[test]
    fn test_route_outside_tiny_radius() {
        let index = scenario_index();
        // ~2km north of the stop
        let point = Coordinate::new(41.8980, -87.6300).unwrap();

        assert!(ProximityQueryEngine::query(point, 1.0, &index).is_empty());
        assert!(ProximityQueryEngine::query(point, 2_500.0, &index)
            .contains(&RouteIdentifier::new("146")));
    }

    #[test]
    fn test_zero_radius_on_top_of_stop() {
        let index = scenario_index();
        let point = Coordinate::new(41.8800, -87.6300).unwrap();

        assert!(ProximityQueryEngine::query(point, 0.0, &index).is_empty());
    }

    #[test]
    fn test_query_is_deterministic() {
        let index = scenario_index();
        let point = Coordinate::new(41.8801, -87.6301).unwrap();

        assert_eq!(
            ProximityQueryEngine::query(point, 500.0, &index),
            ProximityQueryEngine::query(point, 500.0, &index)
        );
    }

    #[tokio::test]
    async fn test_invalid_point_rejected_before_fetch() {
        let coordinator = RefreshCoordinator::new(Arc::new(Unreachable));
        let engine = ProximityQueryEngine::new(coordinator.clone(), Duration::from_secs(1));

        let err = engine
            .query_routes_near(123.0, -87.63, 500.0, Duration::from_secs(60))
            .await
            .unwrap_err();

        assert_eq!(err, QueryError::InvalidCoordinate(CoordinateError::Latitude(123.0)));
        assert_eq!(coordinator.status().fetch_attempts, 0);
    }

    #[tokio::test]
    async fn test_stops_near_from_engine() {
        let coordinator = RefreshCoordinator::with_options(
            Arc::new(Fixture),
            scenario_format(),
            Duration::from_secs(1),
        );
        let engine = ProximityQueryEngine::new(coordinator, Duration::from_secs(1));

        let stops = engine
            .stops_near(41.8801, -87.6301, 500.0, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].stop.route_id.as_str(), "146");
        assert!(stops[0].distance_m < 20.0);
    }

    #[tokio::test]
    async fn test_unavailable_index() {
        let coordinator = RefreshCoordinator::new(Arc::new(Unreachable));
        let engine = ProximityQueryEngine::new(coordinator, Duration::from_secs(1));

        let err = engine
            .query_routes_near(41.88, -87.63, 500.0, Duration::from_secs(60))
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::IndexUnavailable(_)));
    }
}

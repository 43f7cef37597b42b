//! Published index state and observability records.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::models::FetchFailure;
use crate::provider::RouteIndex;

/// A published route index together with when it was built
#[derive(Debug)]
pub struct Snapshot {
    index: RouteIndex,
    refreshed_at: Instant,
    report: RefreshReport,
}

impl Snapshot {
    pub(crate) fn new(index: RouteIndex, report: RefreshReport) -> Self {
        Self {
            index,
            refreshed_at: Instant::now(),
            report,
        }
    }

    pub fn index(&self) -> &RouteIndex {
        &self.index
    }

    /// Time since this snapshot was published, on the monotonic clock
    pub fn age(&self) -> Duration {
        self.refreshed_at.elapsed()
    }

    pub fn report(&self) -> &RefreshReport {
        &self.report
    }
}

/// Summary of one successful refresh
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RefreshReport {
    pub stops: usize,
    pub routes: usize,
    pub malformed_rows: usize,
    pub invalid_coordinates: usize,
    pub bytes: usize,
    pub elapsed_ms: u64,
    pub refreshed_at: DateTime<Utc>,
}

/// Everything the coordinator publishes
///
/// Only the coordinator writes this. A new `snapshot` is swapped in as a
/// whole, in the same update that clears `refreshing`.
#[derive(Clone, Debug, Default)]
pub(crate) struct IndexState {
    pub snapshot: Option<Arc<Snapshot>>,
    /// The single refresh slot is taken
    pub refreshing: bool,
    /// Finished refresh attempts, successful or not
    pub completed: u64,
    pub fetch_attempts: u64,
    pub successful_refreshes: u64,
    pub failed_refreshes: u64,
    pub consecutive_failures: u64,
    pub last_failure: Option<FetchFailure>,
    pub last_failure_at: Option<DateTime<Utc>>,
}

/// Point-in-time view of the coordinator for health and status reporting
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IndexStatus {
    pub loaded: bool,
    pub stops: usize,
    pub routes: usize,
    pub last_refresh: Option<RefreshReport>,
    pub age_secs: Option<u64>,
    pub refresh_in_flight: bool,
    pub fetch_attempts: u64,
    pub successful_refreshes: u64,
    pub failed_refreshes: u64,
    pub consecutive_failures: u64,
    pub last_failure: Option<String>,
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl IndexState {
    pub(crate) fn status(&self) -> IndexStatus {
        let snapshot = self.snapshot.as_deref();
        IndexStatus {
            loaded: snapshot.is_some(),
            stops: snapshot.map_or(0, |s| s.index().len()),
            routes: snapshot.map_or(0, |s| s.index().route_count()),
            last_refresh: snapshot.map(|s| s.report().clone()),
            age_secs: snapshot.map(|s| s.age().as_secs()),
            refresh_in_flight: self.refreshing,
            fetch_attempts: self.fetch_attempts,
            successful_refreshes: self.successful_refreshes,
            failed_refreshes: self.failed_refreshes,
            consecutive_failures: self.consecutive_failures,
            last_failure: self.last_failure.as_ref().map(ToString::to_string),
            last_failure_at: self.last_failure_at,
        }
    }
}

//! Single-flight, stale-while-revalidate refresh of the route index.
//!
//! The coordinator owns the only mutable state in the crate. Readers get an
//! `Arc<Snapshot>` and never lock anything themselves; a refresh builds a new
//! [`RouteIndex`] off to the side and swaps it in through a
//! [`tokio::sync::watch`] channel.
//!
//! ## Policy
//!
//! - No snapshot yet: callers wait for the first load, bounded by their own
//!   timeout. A failed first load is reported to the waiters.
//! - Snapshot younger than the caller's `max_staleness`: returned as is.
//! - Older: returned as is, and a background refresh is started unless one is
//!   already running.
//!
//! At most one fetch runs at a time. The refresh slot lives in the published
//! state: it is taken and released under the same lock that publishes
//! outcomes, so an outcome and the slot becoming free are observed together.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::feed::{parse_feed, FeedFormat};
use crate::models::{FetchFailure, QueryError, RefreshError, Result};
use crate::network::FeedSource;
use crate::provider::RouteIndex;
use crate::refresh::state::{IndexState, IndexStatus, RefreshReport, Snapshot};

/// Default bound on a single feed fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared handle to the refresh machinery
///
/// This type is cheap to clone; clones share the same index state.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn FeedSource>,
    format: FeedFormat,
    fetch_timeout: Duration,
    state: watch::Sender<IndexState>,
}

/// Claim on the refresh slot
///
/// The refresh clears the slot when it publishes. Dropping the claim only
/// matters if the refresh task never got that far.
struct InFlight {
    inner: Arc<Inner>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.inner
            .state
            .send_if_modified(|s| std::mem::take(&mut s.refreshing));
    }
}

impl Inner {
    /// Take the refresh slot if it is free and `wanted` holds for the
    /// current state
    fn claim_if(self: &Arc<Self>, wanted: impl FnOnce(&IndexState) -> bool) -> Option<InFlight> {
        let claimed = self.state.send_if_modified(|s| {
            if s.refreshing || !wanted(s) {
                return false;
            }
            s.refreshing = true;
            true
        });

        claimed.then(|| InFlight {
            inner: self.clone(),
        })
    }
}

impl RefreshCoordinator {
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        Self::with_options(source, FeedFormat::default(), DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_options(
        source: Arc<dyn FeedSource>,
        format: FeedFormat,
        fetch_timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(IndexState::default());
        Self {
            inner: Arc::new(Inner {
                source,
                format,
                fetch_timeout,
                state,
            }),
        }
    }

    /// Current snapshot, if one has ever been published. Never blocks.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.inner.state.borrow().snapshot.clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.state.borrow().refreshing
    }

    pub fn status(&self) -> IndexStatus {
        self.inner.state.borrow().status()
    }

    /// Get a snapshot no older than `max_staleness`, or the stale one while
    /// a fresh one is being fetched
    ///
    /// Only suspends when nothing has ever loaded, for at most
    /// `first_load_timeout`.
    pub async fn get_snapshot(
        &self,
        max_staleness: Duration,
        first_load_timeout: Duration,
    ) -> Result<Arc<Snapshot>> {
        match self.current() {
            Some(snapshot) => {
                if snapshot.age() > max_staleness && self.revalidate(max_staleness) {
                    tracing::debug!(
                        age_secs = snapshot.age().as_secs(),
                        "Route index is stale, refreshing in background"
                    );
                }
                Ok(snapshot)
            }
            None => self.wait_for_first_load(first_load_timeout).await,
        }
    }

    /// Start a background refresh unless one is already running
    ///
    /// Returns whether this call started it. Must be called from within a
    /// Tokio runtime.
    pub fn trigger_refresh(&self) -> bool {
        self.spawn(self.inner.claim_if(|_| true))
    }

    /// Start a background refresh only if the published snapshot is still
    /// older than `max_staleness`
    ///
    /// A caller that saw a stale snapshot may find a fresh one already
    /// published by the time it gets here.
    fn revalidate(&self, max_staleness: Duration) -> bool {
        self.spawn(self.inner.claim_if(|s| {
            s.snapshot
                .as_ref()
                .is_some_and(|snapshot| snapshot.age() > max_staleness)
        }))
    }

    fn spawn(&self, claim: Option<InFlight>) -> bool {
        let Some(claim) = claim else {
            return false;
        };

        tokio::spawn(async move {
            let inner = claim.inner.clone();
            let _ = inner.refresh(claim).await;
        });
        true
    }

    /// Start or join a refresh and wait for its outcome
    pub async fn refresh(
        &self,
        timeout: Duration,
    ) -> std::result::Result<RefreshReport, RefreshError> {
        let mut updates = self.inner.state.subscribe();
        let mut seen = 0;
        let claim = self.inner.claim_if(|s| {
            seen = s.completed;
            true
        });
        self.spawn(claim);

        let finished = tokio::time::timeout(timeout, updates.wait_for(|s| s.completed > seen))
            .await
            .map_err(|_| RefreshError::TimedOut(timeout))?
            .map_err(|_| RefreshError::TimedOut(timeout))?;

        if finished.consecutive_failures == 0 {
            if let Some(snapshot) = &finished.snapshot {
                return Ok(snapshot.report().clone());
            }
        }
        Err(RefreshError::Fetch(last_failure(&finished)))
    }

    async fn wait_for_first_load(&self, timeout: Duration) -> Result<Arc<Snapshot>> {
        let mut updates = self.inner.state.subscribe();
        let mut seen = 0;
        let mut loaded = None;
        let claim = self.inner.claim_if(|s| {
            seen = s.completed;
            loaded = s.snapshot.clone();
            loaded.is_none()
        });

        if let Some(snapshot) = loaded {
            return Ok(snapshot);
        }
        if self.spawn(claim) {
            tracing::info!(source = %self.inner.source.describe(), "Loading route index");
        }

        let unavailable = QueryError::IndexUnavailable;
        let state = tokio::time::timeout(
            timeout,
            updates.wait_for(|s| s.snapshot.is_some() || s.completed > seen),
        )
        .await
        .map_err(|_| unavailable(RefreshError::TimedOut(timeout)))?
        .map_err(|_| unavailable(RefreshError::TimedOut(timeout)))?;

        match &state.snapshot {
            Some(snapshot) => Ok(snapshot.clone()),
            None => Err(unavailable(RefreshError::Fetch(last_failure(&state)))),
        }
    }
}

impl Inner {
    /// Fetch, parse and publish. The outcome is published in the same update
    /// that frees the refresh slot.
    async fn refresh(&self, _claim: InFlight) -> std::result::Result<RefreshReport, FetchFailure> {
        let started = Instant::now();
        self.state.send_modify(|s| s.fetch_attempts += 1);

        let fetched = match tokio::time::timeout(self.fetch_timeout, self.source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(FetchFailure::Timeout(self.fetch_timeout)),
        };

        let bytes = match fetched {
            Ok(bytes) => bytes,
            Err(failure) => {
                tracing::warn!(
                    source = %self.source.describe(),
                    %failure,
                    "Feed refresh failed, keeping previous route index"
                );
                self.state.send_modify(|s| {
                    s.refreshing = false;
                    s.completed += 1;
                    s.failed_refreshes += 1;
                    s.consecutive_failures += 1;
                    s.last_failure = Some(failure.clone());
                    s.last_failure_at = Some(Utc::now());
                });
                return Err(failure);
            }
        };

        let parsed = parse_feed(&bytes, &self.format);
        let rejected = parsed.rejected();
        let (malformed_rows, invalid_coordinates) = (parsed.malformed_rows, parsed.invalid_coordinates);
        let index = RouteIndex::build(parsed.records);

        let report = RefreshReport {
            stops: index.len(),
            routes: index.route_count(),
            malformed_rows,
            invalid_coordinates,
            bytes: bytes.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            refreshed_at: Utc::now(),
        };

        tracing::info!(
            stops = report.stops,
            routes = report.routes,
            rejected,
            elapsed_ms = report.elapsed_ms,
            "Published route index"
        );

        let snapshot = Arc::new(Snapshot::new(index, report.clone()));
        self.state.send_modify(|s| {
            s.snapshot = Some(snapshot);
            s.refreshing = false;
            s.completed += 1;
            s.successful_refreshes += 1;
            s.consecutive_failures = 0;
        });

        Ok(report)
    }
}

fn last_failure(state: &IndexState) -> FetchFailure {
    state
        .last_failure
        .clone()
        .unwrap_or_else(|| FetchFailure::Network("refresh failed".into()))
}

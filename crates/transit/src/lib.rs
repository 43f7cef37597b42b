//! # route-radar-transit
//!
//! In-memory index of transit stops grouped by route, refreshed from an
//! external feed, answering "which routes stop near here?".
//!
//! ## Features
//!
//! - **Resilient parsing**: bad feed rows are counted and skipped, never fatal
//! - **Immutable snapshots**: readers hold an `Arc` that never changes under them
//! - **Stale-while-revalidate**: old data is served while a refresh runs
//! - **Single-flight refresh**: concurrent callers never trigger duplicate fetches
//! - **Spatial queries**: R-tree prefilter with exact haversine distances
//! - **Pluggable feeds**: implement [`FeedSource`] for HTTP, files or fixtures
//!
//! ## Example
//!
//! ```
//! use route_radar_transit::prelude::*;
//!
//! let feed = "146,Inner Drive/Michigan Express,Southbound,1106,41.8800,-87.6300\n";
//! let parsed = parse_feed(feed.as_bytes(), &FeedFormat::default());
//! let index = RouteIndex::build(parsed.records);
//!
//! // Query routes
//! let point = Coordinate::new(41.8801, -87.6301).unwrap();
//! let nearby = ProximityQueryEngine::query(point, 500.0, &index); // 500m radius
//! assert!(nearby.contains(&RouteIdentifier::new("146")));
//! ```

pub mod feed;
pub mod identifiers;
pub mod models;
pub mod network;
pub mod provider;
pub mod query;
pub mod refresh;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::feed::{parse_feed, parse_line, FeedFormat, ParsedFeed};
    pub use crate::identifiers::*;
    pub use crate::models::{
        Coordinate, CoordinateError, FetchFailure, QueryError, RefreshError, Rejection, StopRecord,
    };
    pub use crate::network::{FeedSource, FetchResult, FileFeedSource};
    pub use crate::provider::{RouteIndex, StopMatch};
    pub use crate::query::ProximityQueryEngine;
    pub use crate::refresh::{
        IndexStatus, RefreshCoordinator, RefreshReport, Snapshot, DEFAULT_FETCH_TIMEOUT,
    };
}

pub use prelude::*;

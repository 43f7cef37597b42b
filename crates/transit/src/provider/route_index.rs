//! Immutable route → stops index.
//!
//! A [`RouteIndex`] is built in one go from a sequence of stop records and
//! never changes afterwards. Refreshing the feed produces a new index.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use rstar::RTree;

use crate::identifiers::RouteIdentifier;
use crate::models::{Coordinate, StopRecord};
use crate::spatial::index::StopNode;
use crate::spatial::queries::{arc_to_chord, haversine_distance, to_cartesian};

/// Slack added to the chord prefilter so rounding never drops a stop that the
/// haversine test would accept
const PREFILTER_SLACK_M: f64 = 0.01;

/// A stop that matched a radius query
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StopMatch {
    pub stop: Arc<StopRecord>,
    pub distance_m: f64,
}

/// Snapshot of every stop in the feed, grouped by route
///
/// This type is cheap to share: wrap it in an `Arc` and hand out clones.
#[derive(Clone, Default)]
pub struct RouteIndex {
    // Core data, feed order
    stops: Vec<Arc<StopRecord>>,
    // Route ids in first-seen order
    routes: Vec<RouteIdentifier>,

    // Lookup maps
    route_map: HashMap<RouteIdentifier, Vec<Arc<StopRecord>>>,

    // Spatial index
    stop_tree: RTree<StopNode>,
}

impl RouteIndex {
    /// Build an index from feed records
    ///
    /// Routes keep the order in which they first appear, and stops keep
    /// their feed order within each route. Duplicates are preserved.
    pub fn build(records: impl IntoIterator<Item = StopRecord>) -> Self {
        let stops: Vec<Arc<StopRecord>> = records.into_iter().map(Arc::new).collect();

        let mut routes = Vec::new();
        let mut route_map: HashMap<RouteIdentifier, Vec<Arc<StopRecord>>> = HashMap::new();
        for stop in &stops {
            route_map
                .entry(stop.route_id.clone())
                .or_insert_with(|| {
                    routes.push(stop.route_id.clone());
                    Vec::new()
                })
                .push(stop.clone());
        }

        let stop_tree = RTree::bulk_load(
            stops
                .iter()
                .enumerate()
                .map(|(position, s)| StopNode::new(position, s.clone()))
                .collect(),
        );

        Self {
            stops,
            routes,
            route_map,
            stop_tree,
        }
    }

    /// Number of stop records
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Route ids in first-seen feed order
    pub fn routes(&self) -> &[RouteIdentifier] {
        &self.routes
    }

    /// Every stop record in feed order
    pub fn stops(&self) -> &[Arc<StopRecord>] {
        &self.stops
    }

    pub fn stops_for(&self, route: &RouteIdentifier) -> &[Arc<StopRecord>] {
        self.route_map.get(route).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_route(&self, route: &RouteIdentifier) -> bool {
        self.route_map.contains_key(route)
    }

    /// Distinct routes with at least one stop within `radius_m` meters of `point`
    ///
    /// A non-positive or non-finite radius matches nothing.
    pub fn routes_near(&self, point: Coordinate, radius_m: f64) -> HashSet<RouteIdentifier> {
        self.candidates(point, radius_m)
            .filter(|(_, distance)| *distance <= radius_m)
            .map(|(node, _)| node.stop.route_id.clone())
            .collect()
    }

    /// Stops within `radius_m` meters of `point`, nearest first
    ///
    /// Equal distances are ordered by feed position.
    pub fn stops_near(&self, point: Coordinate, radius_m: f64) -> Vec<StopMatch> {
        let mut matches: Vec<(usize, StopMatch)> = self
            .candidates(point, radius_m)
            .filter(|(_, distance)| *distance <= radius_m)
            .map(|(node, distance_m)| {
                (
                    node.position(),
                    StopMatch {
                        stop: node.stop.clone(),
                        distance_m,
                    },
                )
            })
            .collect();

        matches.sort_by(|(pa, a), (pb, b)| a.distance_m.total_cmp(&b.distance_m).then(pa.cmp(pb)));
        matches.into_iter().map(|(_, m)| m).collect()
    }

    /// Restrict `routes` to this index's first-seen route order
    pub fn in_feed_order(&self, routes: &HashSet<RouteIdentifier>) -> Vec<RouteIdentifier> {
        self.routes
            .iter()
            .filter(|route| routes.contains(*route))
            .cloned()
            .collect()
    }

    /// R-tree candidates paired with their haversine distance
    fn candidates(
        &self,
        point: Coordinate,
        radius_m: f64,
    ) -> Box<dyn Iterator<Item = (&StopNode, f64)> + '_> {
        // Validate radius is positive
        if radius_m <= 0.0 || !radius_m.is_finite() {
            return Box::new(std::iter::empty());
        }

        let origin = point.to_point();
        let chord = arc_to_chord(radius_m) + PREFILTER_SLACK_M;

        Box::new(
            self.stop_tree
                .locate_within_distance(to_cartesian(origin), chord * chord)
                .map(move |node| {
                    let distance = haversine_distance(origin, node.stop.coordinate.to_point());
                    (node, distance)
                }),
        )
    }
}

impl fmt::Debug for RouteIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteIndex")
            .field("stops", &self.stops.len())
            .field("routes", &self.routes.len())
            .finish()
    }
}

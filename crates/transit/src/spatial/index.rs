//! R-tree nodes for spatial indexing.
//!
//! Stops are stored as points on a sphere in 3-D cartesian space rather than
//! as raw lon/lat pairs.
//!
//! ## Two-Stage Filtering
//!
//! 1. **R-tree filter**: Euclidean (chord) distance in 3-D. Chord length is a
//!    monotonic function of great-circle distance, so a chord radius derived
//!    from the query radius selects a superset of the matching stops, with no
//!    special cases at the poles or the antimeridian.
//! 2. **Haversine filter**: the exact great-circle test on the candidates.

use std::sync::Arc;

use rstar::{PointDistance, RTreeObject, AABB};

use crate::models::StopRecord;
use crate::spatial::queries::to_cartesian;

#[derive(Clone, Debug)]
pub struct StopNode {
    pub stop: Arc<StopRecord>,
    position: usize,
    point: [f64; 3],
}

impl StopNode {
    /// `position` is the record's index in feed order
    pub fn new(position: usize, stop: Arc<StopRecord>) -> Self {
        let point = to_cartesian(stop.coordinate.to_point());
        Self {
            stop,
            position,
            point,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

impl RTreeObject for StopNode {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StopNode {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        let dz = self.point[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

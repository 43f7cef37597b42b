//! Route index snapshots.

pub mod route_index;

pub use route_index::{RouteIndex, StopMatch};

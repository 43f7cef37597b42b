//! Keeping the route index fresh.

pub mod coordinator;
pub mod state;

pub use coordinator::{RefreshCoordinator, DEFAULT_FETCH_TIMEOUT};
pub use state::{IndexStatus, RefreshReport, Snapshot};

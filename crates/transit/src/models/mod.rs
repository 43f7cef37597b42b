//! Feed data models and error types.

pub mod coordinate;
pub mod types;

// Re-exports for convenience
pub use coordinate::Coordinate;
pub use types::{
    CoordinateError, FetchFailure, QueryError, RefreshError, Rejection, Result, StopRecord,
};

//! Network and IO abstractions.

pub mod file;
pub mod traits;

pub use file::FileFeedSource;
pub use traits::{FeedSource, FetchResult};

//! Pluggable feed fetching.
//!
//! External crates implement [`FeedSource`] to provide the raw stop feed
//! (HTTP, local file, test fixture).

use std::future::Future;
use std::pin::Pin;

use crate::models::FetchFailure;

pub type FetchResult = std::result::Result<Vec<u8>, FetchFailure>;

/// Fetch the raw bytes of the stop feed
pub trait FeedSource: Send + Sync {
    fn fetch<'a>(&'a self) -> Pin<Box<dyn Future<Output = FetchResult> + Send + 'a>>;

    /// Short human readable description for logs
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

//! Feed source backed by a local file.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::models::FetchFailure;
use crate::network::traits::{FeedSource, FetchResult};

/// Reads the feed from disk on every fetch
///
/// Useful for serving a previously downloaded copy of the feed.
#[derive(Clone, Debug)]
pub struct FileFeedSource {
    path: PathBuf,
}

impl FileFeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FeedSource for FileFeedSource {
    fn fetch<'a>(&'a self) -> Pin<Box<dyn Future<Output = FetchResult> + Send + 'a>> {
        Box::pin(async move {
            tokio::fs::read(&self.path)
                .await
                .map_err(|e| FetchFailure::Network(format!("{}: {}", self.path.display(), e)))
        })
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_file() {
        let path = std::env::temp_dir().join(format!("route-radar-feed-{}.txt", std::process::id()));
        tokio::fs::write(&path, b"146,X,Y,1,41.88,-87.63\n").await.unwrap();

        let source = FileFeedSource::new(&path);
        let bytes = source.fetch().await.unwrap();
        assert_eq!(bytes, b"146,X,Y,1,41.88,-87.63\n");

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_a_fetch_failure() {
        let source = FileFeedSource::new("/definitely/not/here/stops.txt");
        let result = source.fetch().await;
        assert!(matches!(result, Err(FetchFailure::Network(_))));
        assert!(source.describe().contains("stops.txt"));
    }
}

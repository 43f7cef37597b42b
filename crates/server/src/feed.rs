use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use route_radar_transit::{FeedSource, FetchFailure, FetchResult};

/// Fetches the stop feed over HTTP
pub struct HttpFeedSource {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpFeedSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url: url.into(),
            timeout,
        })
    }

    fn classify(&self, error: reqwest::Error) -> FetchFailure {
        if error.is_timeout() {
            FetchFailure::Timeout(self.timeout)
        } else if let Some(status) = error.status() {
            FetchFailure::ServerError {
                status: status.as_u16(),
            }
        } else {
            FetchFailure::Network(error.to_string())
        }
    }
}

impl FeedSource for HttpFeedSource {
    fn fetch<'a>(&'a self) -> Pin<Box<dyn Future<Output = FetchResult> + Send + 'a>> {
        Box::pin(async move {
            tracing::debug!(url = %self.url, "Fetching stop feed");

            let response = self
                .client
                .get(&self.url)
                .send()
                .await
                .map_err(|e| self.classify(e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchFailure::ServerError {
                    status: status.as_u16(),
                });
            }

            let body = response.bytes().await.map_err(|e| self.classify(e))?;
            Ok(body.to_vec())
        })
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_fetches_body() {
        let base = serve(Router::new().route("/stops.txt", get(|| async { "146,X,Y,1,41.88,-87.63\n" }))).await;

        let source = HttpFeedSource::new(format!("{base}/stops.txt"), Duration::from_secs(5)).unwrap();
        let body = source.fetch().await.unwrap();
        assert_eq!(body, b"146,X,Y,1,41.88,-87.63\n");
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let base = serve(Router::new().route(
            "/stops.txt",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        ))
        .await;

        let source = HttpFeedSource::new(format!("{base}/stops.txt"), Duration::from_secs(5)).unwrap();
        assert_eq!(
            source.fetch().await,
            Err(FetchFailure::ServerError { status: 502 })
        );
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let base = serve(Router::new().route(
            "/stops.txt",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        ))
        .await;

        let source =
            HttpFeedSource::new(format!("{base}/stops.txt"), Duration::from_millis(100)).unwrap();
        assert_eq!(
            source.fetch().await,
            Err(FetchFailure::Timeout(Duration::from_millis(100)))
        );
    }
}

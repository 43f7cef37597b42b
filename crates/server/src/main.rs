mod config;
mod error;
mod feed;
mod logging;
mod routes;

use std::sync::Arc;

use clap::Parser;
use eyre::WrapErr;
use route_radar_transit::{FeedSource, FileFeedSource, ProximityQueryEngine, RefreshCoordinator};

use crate::config::Config;
use crate::feed::HttpFeedSource;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    logging::init();

    let config = Config::parse();
    config.validate()?;

    let source: Arc<dyn FeedSource> = match &config.feed_file {
        Some(path) => Arc::new(FileFeedSource::new(path)),
        None => Arc::new(
            HttpFeedSource::new(config.feed_url.clone(), config.fetch_timeout())
                .wrap_err("Failed to build HTTP client")?,
        ),
    };

    tracing::info!(
        feed = %source.describe(),
        max_staleness_secs = config.max_staleness_secs,
        "Starting route index"
    );

    let coordinator =
        RefreshCoordinator::with_options(source, config.feed_format(), config.fetch_timeout());
    if config.warm_up {
        coordinator.trigger_refresh();
    }

    let app = routes::create_router(AppState {
        engine: ProximityQueryEngine::new(coordinator, config.first_load_timeout()),
        default_radius_m: config.default_radius_meters,
        max_staleness: config.max_staleness(),
        refresh_timeout: config.first_load_timeout(),
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .wrap_err_with(|| format!("Failed to bind {}", config.bind))?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use route_radar_transit::{
    IndexStatus, ProximityQueryEngine, RefreshReport, RouteIdentifier, StopMatch,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

pub struct AppState {
    pub engine: ProximityQueryEngine,
    pub default_radius_m: f64,
    pub max_staleness: Duration,
    pub refresh_timeout: Duration,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/routes/near", post(routes_near))
        .route("/stops/near", post(stops_near))
        .route("/status", get(status))
        .route("/refresh", post(refresh))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(Arc::new(state))
}

/// Accepts `x`/`y` as aliases for latitude/longitude
#[derive(Debug, Deserialize)]
pub struct NearRequest {
    #[serde(alias = "x")]
    pub latitude: f64,
    #[serde(alias = "y")]
    pub longitude: f64,
    pub radius_meters: Option<f64>,
    pub max_staleness_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct RoutesNearResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub routes: Vec<RouteIdentifier>,
}

#[derive(Debug, Serialize)]
pub struct StopsNearResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub stops: Vec<StopMatch>,
}

impl AppState {
    fn resolve(&self, request: &NearRequest) -> (f64, Duration) {
        let radius = request.radius_meters.unwrap_or(self.default_radius_m);
        let staleness = request
            .max_staleness_secs
            .map(Duration::from_secs)
            .unwrap_or(self.max_staleness);
        (radius, staleness)
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn routes_near(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NearRequest>,
) -> Result<Json<RoutesNearResponse>, ApiError> {
    let started = Instant::now();
    let (radius, staleness) = state.resolve(&request);

    let routes = state
        .engine
        .query_routes_near(request.latitude, request.longitude, radius, staleness)
        .await?;

    tracing::info!(
        latitude = request.latitude,
        longitude = request.longitude,
        radius,
        routes = routes.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Routes near point"
    );

    Ok(Json(RoutesNearResponse {
        latitude: request.latitude,
        longitude: request.longitude,
        radius_meters: radius,
        routes,
    }))
}

async fn stops_near(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NearRequest>,
) -> Result<Json<StopsNearResponse>, ApiError> {
    let (radius, staleness) = state.resolve(&request);

    let stops = state
        .engine
        .stops_near(request.latitude, request.longitude, radius, staleness)
        .await?;

    Ok(Json(StopsNearResponse {
        latitude: request.latitude,
        longitude: request.longitude,
        radius_meters: radius,
        stops,
    }))
}

async fn status(State(state): State<Arc<AppState>>) -> Json<IndexStatus> {
    Json(state.engine.coordinator().status())
}

async fn refresh(State(state): State<Arc<AppState>>) -> Result<Json<RefreshReport>, ApiError> {
    let report = state.engine.coordinator().refresh(state.refresh_timeout).await?;
    Ok(Json(report))
}

use crate::config::ApiConfig;
use crate::error::QrError;
use crate::health::HealthProbe;
use crate::pipeline::{QrPipeline, UploadResult};
use crate::store::AuthMethod;
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<QrPipeline>,
    pub health: Arc<HealthProbe>,
    pub service_name: String,
    pub version: String,
    pub auth_method: AuthMethod,
}

/// Body of POST /generate
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub url: String,
}

/// Query of the deprecated POST /generate-qr/
#[derive(Debug, Deserialize)]
pub struct LegacyQuery {
    pub url: String,
}

/// Create the API router
pub fn create_router(state: AppState, config: &ApiConfig) -> Router {
    let cors = if config.cors_enabled {
        if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/generate", post(generate))
        .route("/generate-qr/", post(generate_legacy))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Service metadata
async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "QR Code Generator API",
        "version": state.version,
        "status": "running",
        "auth_method": state.auth_method.as_str(),
        "endpoints": {
            "health": "/health",
            "generate": "/generate (POST with JSON body)",
            "generate_legacy": "/generate-qr/ (POST with query param)"
        }
    }))
}

/// Liveness plus bucket reachability; always 200
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let s3_access = state.health.check().await;

    Json(serde_json::json!({
        "status": "healthy",
        "service": state.service_name,
        "bucket": state.pipeline.bucket(),
        "s3_access": s3_access,
        "auth_method": state.auth_method.short_label(),
    }))
}

/// Generate a QR code from a JSON body: {"url": "https://example.com"}
#[instrument(skip_all)]
async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<UploadResult>, QrError> {
    let Json(request) = payload.map_err(|e| QrError::Validation(e.body_text()))?;

    state.pipeline.generate(&request.url).await.map(Json)
}

/// Deprecated: /generate-qr/?url=https://example.com
#[instrument(skip_all)]
async fn generate_legacy(
    State(state): State<AppState>,
    query: Result<Query<LegacyQuery>, QueryRejection>,
) -> Result<Json<UploadResult>, QrError> {
    let Query(query) = query
        .map_err(|e| QrError::Validation(format!("Invalid URL provided: {}", e.body_text())))?;

    state.pipeline.generate_legacy(&query.url).await.map(Json)
}

/// Serve the API until `shutdown` resolves
pub async fn start_api_server<F>(state: AppState, config: &ApiConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = create_router(state, config);
    let addr = format!("{}:{}", config.host, config.port);

    info!(address = %addr, "Starting QR code API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server error")?;

    Ok(())
}

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod importer;
pub mod media;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, services::ServeDir};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Wires the catalog services over `db`, storing blobs under the
    /// configured media root.
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let media: Arc<dyn media::MediaStore> =
            Arc::new(media::FsMediaStore::new(&config.media_root));
        let services = handlers::AppServices::new(db.clone(), media);
        Self {
            db,
            config,
            services,
        }
    }
}

/// Catalog read API plus health, status and the media file tree.
pub fn catalog_routes(state: &AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(handlers::catalog::catalog_routes());

    // Relative media URLs are served from the media root by this process.
    let media_path = state.config.media_url.trim_end_matches('/');
    if media_path.starts_with('/') && media_path.len() > 1 {
        router.nest_service(media_path, ServeDir::new(&state.config.media_root))
    } else {
        router
    }
}

/// Full application router with the request-id, tracing and compression
/// layers applied.
pub fn build_router(state: AppState) -> Router {
    catalog_routes(&state)
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

async fn api_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let healthy = db::check_connection(&state.db).await.is_ok();
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if healthy { "healthy" } else { "unhealthy" },
            "checks": {
                "database": if healthy { "healthy" } else { "unhealthy" },
            },
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

//! HTTP server: Axum router for the price endpoint and the game API.
//!
//! CORS is open for GET/POST so a browser front end on another origin
//! can drive the game.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::engine::TaskGuard;
use routes::AppState;

/// Bind `port` and serve in the background until the guard drops.
pub async fn spawn_server(state: AppState, port: u16) -> Result<TaskGuard> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!(port, "Server listening on http://localhost:{port}");

    Ok(TaskGuard::spawn("http-server", async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Server error");
        }
    }))
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/price", get(routes::get_price))
        .route("/health", get(routes::health))
        .route("/api/feed", get(routes::get_feed))
        .route("/api/round", get(routes::get_round).post(routes::start_round))
        .route("/api/round/reset", post(routes::reset_round))
        .route("/api/stats", get(routes::get_stats))
        .route(
            "/api/leaderboard",
            get(routes::get_leaderboard).post(routes::submit_leaderboard),
        )
        .route("/api/settings", get(routes::get_settings))
        .route("/api/settings/:name/toggle", post(routes::toggle_setting))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

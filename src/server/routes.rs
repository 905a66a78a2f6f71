//! API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<ServerState>`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::game::session::{GameSession, RoundSummary, SharedSession};
use crate::price::cache::CachedPriceService;
use crate::price::feed::{FeedStatus, PriceFeed};
use crate::price::PriceResponse;
use crate::store::leaderboard::LeaderboardEntry;
use crate::store::stats::Stats;
use crate::store::Settings;
use crate::types::{ClashError, Direction, Phase, Setting};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ServerState {
    pub session: SharedSession,
    /// What the game reads prices from.
    pub feed: Arc<PriceFeed>,
    /// What `GET /price` serves.
    pub prices: Arc<CachedPriceService>,
}

pub type AppState = Arc<ServerState>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// JSON error body with a status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ClashError> for ApiError {
    fn from(e: ClashError) -> Self {
        let status = match &e {
            ClashError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ClashError::InvalidPrice(_) | ClashError::PriceUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ClashError::UnknownDirection(_) => StatusCode::BAD_REQUEST,
            ClashError::UnknownSetting(_) => StatusCode::NOT_FOUND,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    pub round_id: Option<Uuid>,
    pub phase: Phase,
    pub direction: Option<Direction>,
    pub locked_price: Option<f64>,
    pub current_price: f64,
    pub time_remaining: u32,
    pub round_duration: u32,
    /// Multiplier the current streak earns on a win.
    pub multiplier: u64,
    pub is_winning: Option<bool>,
    pub result: Option<RoundSummary>,
}

impl RoundView {
    pub fn of(session: &GameSession) -> Self {
        let round = session.round();
        Self {
            round_id: round.id(),
            phase: round.phase(),
            direction: round.bet_direction(),
            locked_price: round.locked_price(),
            current_price: round.current_price(),
            time_remaining: round.time_remaining(),
            round_duration: round.round_duration(),
            multiplier: session.stats().next_multiplier(),
            is_winning: round.is_winning(),
            result: session.last_result().cloned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartRoundRequest {
    pub direction: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: Stats,
    pub win_rate: f64,
    pub next_multiplier: u64,
    pub wins_to_next_tier: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub entry: LeaderboardEntry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitEntryRequest {
    pub identifier: String,
    /// Defaults to the player's total points.
    pub points: Option<u64>,
    /// Defaults to the player's best streak.
    pub streak: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEntryResponse {
    pub rank: Option<usize>,
    pub entry: LeaderboardEntry,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /price
pub async fn get_price(State(state): State<AppState>) -> (StatusCode, Json<PriceResponse>) {
    let resp = state.prices.response().await;
    let status = if resp.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(resp))
}

/// GET /api/feed
pub async fn get_feed(State(state): State<AppState>) -> Json<FeedStatus> {
    Json(state.feed.status().await)
}

/// GET /api/round
pub async fn get_round(State(state): State<AppState>) -> Json<RoundView> {
    let session = state.session.read().await;
    Json(RoundView::of(&session))
}

/// POST /api/round
pub async fn start_round(
    State(state): State<AppState>,
    Json(req): Json<StartRoundRequest>,
) -> Result<(StatusCode, Json<RoundView>), ApiError> {
    let direction: Direction = req.direction.parse()?;

    if !state.feed.is_live().await {
        let reason = state
            .feed
            .last_error()
            .await
            .unwrap_or_else(|| "no price yet".to_string());
        return Err(ClashError::PriceUnavailable(reason).into());
    }
    let price = state.feed.current_price().await;

    let mut session = state.session.write().await;
    session.observe_price(price);
    session.start_round(direction, price)?;
    Ok((StatusCode::CREATED, Json(RoundView::of(&session))))
}

/// POST /api/round/reset
pub async fn reset_round(State(state): State<AppState>) -> Result<Json<RoundView>, ApiError> {
    let mut session = state.session.write().await;
    session.reset()?;
    Ok(Json(RoundView::of(&session)))
}

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let session = state.session.read().await;
    let stats = session.stats().clone();
    Json(StatsResponse {
        win_rate: stats.win_rate(),
        next_multiplier: stats.next_multiplier(),
        wins_to_next_tier: crate::game::scoring::wins_to_next_tier(stats.current_streak),
        stats,
    })
}

/// GET /api/leaderboard
pub async fn get_leaderboard(State(state): State<AppState>) -> Json<Vec<RankedEntry>> {
    let session = state.session.read().await;
    let ranked = session
        .store()
        .leaderboard()
        .entries()
        .iter()
        .enumerate()
        .map(|(i, e)| RankedEntry {
            rank: i + 1,
            entry: e.clone(),
        })
        .collect();
    Json(ranked)
}

/// POST /api/leaderboard
pub async fn submit_leaderboard(
    State(state): State<AppState>,
    Json(req): Json<SubmitEntryRequest>,
) -> Result<(StatusCode, Json<SubmitEntryResponse>), ApiError> {
    let identifier = req.identifier.trim();
    if identifier.is_empty() {
        return Err(ApiError::bad_request("identifier must not be empty"));
    }

    let mut session = state.session.write().await;
    let stats = session.stats();
    let entry = LeaderboardEntry {
        identifier: identifier.to_string(),
        points: req.points.unwrap_or(stats.total_points),
        streak: req.streak.unwrap_or(stats.best_streak),
        timestamp: Utc::now(),
    };
    let rank = session.submit_to_leaderboard(entry.clone());
    Ok((StatusCode::CREATED, Json(SubmitEntryResponse { rank, entry })))
}

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.session.read().await.store().settings())
}

/// POST /api/settings/:name/toggle
pub async fn toggle_setting(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Settings>, ApiError> {
    let setting: Setting = name.parse()?;
    let mut session = state.session.write().await;
    session.toggle_setting(setting);
    Ok(Json(session.store().settings()))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

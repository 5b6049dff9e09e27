//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::domain::{BoardError, StationCode, StationInfo};
use crate::poll::{BoardPhase, BoardState};

use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stations/platform-status", get(platform_status))
        .route("/api/board", get(board_state))
        .route("/api/board/refresh", post(board_refresh))
        .route("/api/board/station", post(board_station))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Query parameters for the on-demand status endpoint.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub code: String,
}

/// On-demand platform status for any station.
///
/// Bypasses the watched board entirely; each request is a fresh fetch.
async fn platform_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StationInfo>, AppError> {
    let code = parse_code(&query.code)?;
    let info = state.fetcher.fetch(&code).await?;
    Ok(Json(info))
}

/// Request body for selecting the station to watch.
#[derive(Debug, Deserialize)]
pub struct WatchStationRequest {
    pub code: String,
}

/// Wire form of the controller state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardStateResponse {
    pub phase: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    pub applied_seq: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<StationInfo>,
}

impl From<BoardState> for BoardStateResponse {
    fn from(state: BoardState) -> Self {
        Self {
            phase: phase_name(state.phase),
            station: state.station.map(|code| code.as_str().to_string()),
            applied_seq: state.applied_seq,
            error: state.error,
            snapshot: state.snapshot.map(|snapshot| (*snapshot).clone()),
        }
    }
}

fn phase_name(phase: BoardPhase) -> &'static str {
    match phase {
        BoardPhase::Idle => "IDLE",
        BoardPhase::Loading => "LOADING",
        BoardPhase::Ready => "READY",
        BoardPhase::Error => "ERROR",
    }
}

/// Current state of the watched board.
async fn board_state(State(state): State<AppState>) -> Json<BoardStateResponse> {
    Json(state.board.state().into())
}

/// Trigger a manual refresh of the watched board.
async fn board_refresh(State(state): State<AppState>) -> Json<BoardStateResponse> {
    Json(state.board.refresh().await.into())
}

/// Point the watched board at a different station.
async fn board_station(
    State(state): State<AppState>,
    Json(request): Json<WatchStationRequest>,
) -> Result<Json<BoardStateResponse>, AppError> {
    let code = parse_code(&request.code)?;
    Ok(Json(state.board.search(code).await.into()))
}

fn parse_code(raw: &str) -> Result<StationCode, AppError> {
    StationCode::parse(raw).map_err(|e| AppError::BadRequest {
        message: format!("invalid station code {raw:?}: {e}"),
    })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Client sent something unusable
    BadRequest { message: String },
    /// Something went wrong on our side
    Internal { message: String },
}

impl From<BoardError> for AppError {
    fn from(e: BoardError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

/// JSON body for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        error!(%status, %message, "request failed");

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

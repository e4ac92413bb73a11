//! API route handlers.
//!
//! Thin glue between the HTTP surface and the game store. Handlers do no
//! game logic of their own; they validate transport-level input, call the
//! store, and map errors onto status codes:
//! validation -> 400, locked movement -> 403, unknown user/artwork -> 404,
//! persistence -> 500.

use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atelier_core::{
    normalize, AwardSummary, DrawingScene, GameError, Movement, ScoreResult,
};

use crate::metrics::{record_advisory_score, record_like, record_save, record_validation_failure};
use crate::store::{Artwork, LeaderboardEntry, LeaderboardScope, StoreError, UserProfile};
use crate::validation::validate_username;
use crate::AppState;

/// Title used when the player saves without one.
const DEFAULT_TITLE: &str = "Untitled Masterpiece";

/// API error with its HTTP status mapping.
pub struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err)
    }
}

impl From<crate::validation::ValidationError> for ApiError {
    fn from(err: crate::validation::ValidationError) -> Self {
        Self(StoreError::Validation(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StoreError::Game(GameError::MovementLocked { .. }) => StatusCode::FORBIDDEN,
            StoreError::Game(GameError::UnknownUser(_)) | StoreError::ArtworkNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            StoreError::Game(_) => StatusCode::BAD_REQUEST,
            StoreError::Validation(e) => {
                record_validation_failure(&e.to_string());
                StatusCode::BAD_REQUEST
            }
            StoreError::Io(_) | StoreError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self.0);
        }
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

/// Build the `/api` router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/movements", get(get_movements))
        .route("/score", post(score_drawing))
        .route("/artworks", post(save_artwork).get(list_gallery))
        .route("/artworks/{artwork_id}/like", post(like_artwork))
        .route("/artworks/{artwork_id}/view", post(view_artwork))
        .route("/leaderboard/global", get(leaderboard_global))
        .route(
            "/leaderboard/movement/{movement_id}",
            get(leaderboard_movement),
        )
        .route("/users/{user_id}", put(register_user))
        .route("/users/{user_id}/progression", get(get_progression))
}

/// The movement catalog.
async fn get_movements(State(state): State<AppState>) -> Json<Vec<Movement>> {
    Json(state.store.catalog().movements().cloned().collect())
}

/// Advisory score request.
#[derive(Debug, Deserialize)]
struct ScoreRequest {
    /// Caller identity, if signed in; gates locked movements.
    user_id: Option<String>,
    movement_id: String,
    scene: DrawingScene,
}

/// Non-authoritative advisory score for live display.
async fn score_drawing(
    State(state): State<AppState>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ScoreResult>, ApiError> {
    let started = Instant::now();
    let snapshot = normalize(&req.scene);
    let result =
        state
            .store
            .advisory_score(req.user_id.as_deref(), &req.movement_id, &snapshot)?;
    record_advisory_score(&req.movement_id, started.elapsed().as_secs_f64());
    Ok(Json(result))
}

/// Save request.
#[derive(Debug, Deserialize)]
struct SaveRequest {
    user_id: String,
    movement_id: String,
    title: Option<String>,
    scene: DrawingScene,
}

/// Save response: the committed artwork and its progression delta.
#[derive(Debug, Serialize)]
struct SaveResponse {
    artwork: Artwork,
    award: AwardSummary,
}

/// Authoritative save: rescores, commits, applies progression.
async fn save_artwork(
    State(state): State<AppState>,
    Json(req): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, ApiError> {
    let title = req.title.as_deref().filter(|t| !t.is_empty());
    let result = state.store.save_artwork(
        &req.user_id,
        &req.movement_id,
        &req.scene,
        title.unwrap_or(DEFAULT_TITLE),
    );
    match result {
        Ok((artwork, award)) => {
            record_save(&req.movement_id, "ok");
            Ok(Json(SaveResponse { artwork, award }))
        }
        Err(e) => {
            let outcome = match &e {
                StoreError::Io(_) | StoreError::Serialization(_) => "failed",
                _ => "rejected",
            };
            record_save(&req.movement_id, outcome);
            Err(e.into())
        }
    }
}

/// Gallery query.
#[derive(Debug, Deserialize)]
struct GalleryQuery {
    user_id: Option<String>,
}

/// Committed artworks, newest first.
async fn list_gallery(
    State(state): State<AppState>,
    Query(query): Query<GalleryQuery>,
) -> Json<Vec<Artwork>> {
    Json(state.store.list_gallery(query.user_id.as_deref()))
}

/// Like counter response.
#[derive(Debug, Serialize)]
struct LikeResponse {
    likes: u64,
}

async fn like_artwork(
    State(state): State<AppState>,
    Path(artwork_id): Path<Uuid>,
) -> Result<Json<LikeResponse>, ApiError> {
    let likes = state.store.like_artwork(artwork_id)?;
    record_like();
    Ok(Json(LikeResponse { likes }))
}

/// View counter response.
#[derive(Debug, Serialize)]
struct ViewResponse {
    views: u64,
}

async fn view_artwork(
    State(state): State<AppState>,
    Path(artwork_id): Path<Uuid>,
) -> Result<Json<ViewResponse>, ApiError> {
    let views = state.store.record_view(artwork_id)?;
    Ok(Json(ViewResponse { views }))
}

async fn leaderboard_global(State(state): State<AppState>) -> Json<Vec<LeaderboardEntry>> {
    Json(state.store.leaderboard(&LeaderboardScope::Global))
}

async fn leaderboard_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<String>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    // Reject unknown movements rather than returning an empty board
    state.store.catalog().get(&movement_id).map_err(StoreError::from)?;
    Ok(Json(
        state
            .store
            .leaderboard(&LeaderboardScope::Movement(movement_id)),
    ))
}

/// Registration request from the session layer.
#[derive(Debug, Deserialize)]
struct RegisterRequest {
    username: String,
}

/// Provision (or rename) a user with default progression.
async fn register_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    validate_username(&req.username)?;
    Ok(Json(state.store.ensure_user(&user_id, &req.username)?))
}

/// Read-only progression projection for profile and shop display.
async fn get_progression(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.store.get_profile(&user_id)?))
}

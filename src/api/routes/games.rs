use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::GameResult;
use crate::ingest;
use crate::models::GameId;

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: String,
    pub game_id: GameId,
}

#[derive(Debug, Serialize)]
pub struct GameListResponse {
    pub games: Vec<GameResult>,
    pub total: usize,
}

/// Accept a game from the scorekeeping client.
///
/// The raw body is parsed here rather than through the `Json` extractor so
/// malformed and invalid payloads both produce the same 400 error shape.
pub async fn create_game(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let game = ingest::submit(state.games.as_ref(), &state.cache, &body, None)?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Game data saved successfully!".to_string(),
            game_id: game.id,
        }),
    ))
}

/// Every game, newest first, with its outcome.
pub async fn list_games(
    State(state): State<AppState>,
) -> Result<Json<GameListResponse>, ApiError> {
    let games: Vec<GameResult> = state
        .games
        .list_games()?
        .iter()
        .map(GameResult::from_game)
        .collect();

    Ok(Json(GameListResponse {
        total: games.len(),
        games,
    }))
}

pub async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GameResult>, ApiError> {
    let game = state
        .games
        .get_game(&GameId::from(id.as_str()))?
        .ok_or_else(|| ApiError::NotFound(format!("Game '{}' not found", id)))?;

    Ok(Json(GameResult::from_game(&game)))
}

/// Delete a game with its players; statistics are rebuilt.
pub async fn delete_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = ingest::remove_game(state.games.as_ref(), &state.cache, &GameId::from(id.as_str()))?;
    if !removed {
        return Err(ApiError::NotFound(format!("Game '{}' not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

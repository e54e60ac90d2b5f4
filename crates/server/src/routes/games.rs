use axum::{extract::Path, extract::Query, Extension, Json};
use serde::Deserialize;
use sqlx::PgPool;

use rating::GameOutcome;

use crate::auth::middleware::AuthUser;
use crate::db::{games, profiles, users};
use crate::error::AppError;

#[derive(Deserialize)]
pub struct CreateGameRequest {
    pub opponent_id: Option<i64>,
    pub time_control: String,
    pub time_limit_seconds: i32,
    #[serde(default)]
    pub increment_seconds: i32,
    #[serde(default = "default_true")]
    pub is_rated: bool,
    #[serde(default)]
    pub is_vs_engine: bool,
    pub engine_difficulty: Option<i32>,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
pub struct RecordResultRequest {
    pub result: GameOutcome,
    pub pgn: Option<String>,
}

#[derive(Deserialize)]
pub struct MyGamesQuery {
    pub limit: Option<i64>,
}

/// POST /games
pub async fn create_game(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
    Json(req): Json<CreateGameRequest>,
) -> Result<Json<games::Game>, AppError> {
    if profiles::rating_column(&req.time_control).is_none() {
        return Err(AppError::Validation(format!(
            "Unknown time control: {}",
            req.time_control
        )));
    }
    if req.time_limit_seconds < 1 {
        return Err(AppError::Validation(
            "time_limit_seconds must be at least 1".into(),
        ));
    }
    if req.increment_seconds < 0 {
        return Err(AppError::Validation(
            "increment_seconds cannot be negative".into(),
        ));
    }

    let new = if req.is_vs_engine {
        let difficulty = req
            .engine_difficulty
            .ok_or_else(|| AppError::Validation("engine_difficulty is required".into()))?;
        if !(1..=10).contains(&difficulty) {
            return Err(AppError::Validation(
                "engine_difficulty must be between 1 and 10".into(),
            ));
        }
        games::NewGame {
            white_player_id: user.id,
            black_player_id: None,
            time_control: &req.time_control,
            time_limit_seconds: req.time_limit_seconds,
            increment_seconds: req.increment_seconds,
            // Engine games never move ratings
            is_rated: false,
            is_vs_engine: true,
            engine_difficulty: Some(difficulty),
        }
    } else {
        let opponent_id = req
            .opponent_id
            .ok_or_else(|| AppError::Validation("opponent_id is required".into()))?;
        if opponent_id == user.id {
            return Err(AppError::BadRequest(
                "You cannot play against yourself".into(),
            ));
        }
        if users::get_user_by_id(&pool, opponent_id).await?.is_none() {
            return Err(AppError::NotFound("Opponent not found".into()));
        }
        games::NewGame {
            white_player_id: user.id,
            black_player_id: Some(opponent_id),
            time_control: &req.time_control,
            time_limit_seconds: req.time_limit_seconds,
            increment_seconds: req.increment_seconds,
            is_rated: req.is_rated,
            is_vs_engine: false,
            engine_difficulty: None,
        }
    };

    let game = games::create_game(&pool, &new).await?;

    tracing::info!(
        game_id = game.id,
        white = game.white_player_id,
        black = ?game.black_player_id,
        time_control = %game.time_control,
        rated = game.is_rated,
        "created game"
    );

    Ok(Json(game))
}

/// GET /games/{game_id}
pub async fn get_game(
    Extension(pool): Extension<PgPool>,
    Path(game_id): Path<i64>,
    user: AuthUser,
) -> Result<Json<games::Game>, AppError> {
    let game = games::get_game(&pool, game_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Game not found".into()))?;

    if !game.involves(user.id) {
        return Err(AppError::Forbidden(
            "You are not a participant in this game".into(),
        ));
    }

    Ok(Json(game))
}

/// POST /games/{game_id}/result
pub async fn record_result(
    Extension(pool): Extension<PgPool>,
    Path(game_id): Path<i64>,
    user: AuthUser,
    Json(req): Json<RecordResultRequest>,
) -> Result<Json<games::Game>, AppError> {
    let game = games::get_game(&pool, game_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Game not found".into()))?;

    if !game.involves(user.id) {
        return Err(AppError::Forbidden(
            "You are not a participant in this game".into(),
        ));
    }

    let updated = games::complete_game(&pool, game_id, req.result, req.pgn.as_deref()).await?;

    tracing::info!(
        game_id = updated.id,
        result = %updated.result,
        white_after = ?updated.white_rating_after,
        black_after = ?updated.black_rating_after,
        "recorded game result"
    );

    Ok(Json(updated))
}

/// GET /users/me/games
pub async fn my_games(
    Extension(pool): Extension<PgPool>,
    Query(q): Query<MyGamesQuery>,
    user: AuthUser,
) -> Result<Json<Vec<games::Game>>, AppError> {
    let limit = q.limit.unwrap_or(50).clamp(1, 200);
    let list = games::list_games_for_user(&pool, user.id, limit).await?;
    Ok(Json(list))
}

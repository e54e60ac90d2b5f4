use axum::{extract::Path, Extension, Json};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::middleware::AuthUser;
use crate::db::puzzles::{self, Puzzle, PuzzleAttempt};
use crate::error::AppError;

#[derive(Deserialize)]
pub struct AttemptRequest {
    pub solved: bool,
    pub time_taken_seconds: Option<i32>,
}

/// GET /puzzles/daily
///
/// Public: the daily puzzle renders on the landing page before login.
pub async fn daily_puzzle(
    Extension(pool): Extension<PgPool>,
) -> Result<Json<Puzzle>, AppError> {
    let puzzle = puzzles::get_daily_puzzle(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("No puzzles available".into()))?;

    Ok(Json(puzzle))
}

/// POST /puzzles/{puzzle_id}/attempt
pub async fn record_attempt(
    Extension(pool): Extension<PgPool>,
    Path(puzzle_id): Path<i64>,
    user: AuthUser,
    Json(req): Json<AttemptRequest>,
) -> Result<Json<PuzzleAttempt>, AppError> {
    let (attempt, new_rating) = puzzles::record_attempt(
        &pool,
        user.id,
        puzzle_id,
        req.solved,
        req.time_taken_seconds,
    )
    .await?;

    tracing::info!(
        user_id = user.id,
        puzzle_id,
        solved = req.solved,
        puzzle_rating = new_rating,
        "recorded puzzle attempt"
    );

    Ok(Json(attempt))
}

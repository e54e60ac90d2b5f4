use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rating::{elo_delta, k_factor, RATING_FLOOR};

use crate::db::profiles;
use crate::error::AppError;

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Puzzle {
    pub id: i64,
    pub fen: String,
    /// Solution moves in UCI notation, comma-separated
    pub moves: String,
    pub rating: i32,
    pub themes: Option<String>,
    pub is_daily: bool,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct PuzzleAttempt {
    pub id: i64,
    pub puzzle_id: i64,
    pub solved: bool,
    pub time_taken_seconds: Option<i32>,
    pub attempted_at: DateTime<Utc>,
}

const PUZZLE_COLUMNS: &str = "id, fen, moves, rating, themes, is_daily";

pub async fn get_puzzle(pool: &PgPool, puzzle_id: i64) -> Result<Option<Puzzle>, AppError> {
    let sql = format!("SELECT {PUZZLE_COLUMNS} FROM puzzles WHERE id = $1");
    sqlx::query_as::<_, Puzzle>(&sql)
        .bind(puzzle_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)
}

/// The flagged daily puzzle, or the newest puzzle when none is flagged.
pub async fn get_daily_puzzle(pool: &PgPool) -> Result<Option<Puzzle>, AppError> {
    let sql = format!(
        "SELECT {PUZZLE_COLUMNS} FROM puzzles
         WHERE is_daily = TRUE
         ORDER BY daily_date DESC NULLS LAST
         LIMIT 1"
    );
    let daily = sqlx::query_as::<_, Puzzle>(&sql)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)?;

    if daily.is_some() {
        return Ok(daily);
    }

    let sql = format!("SELECT {PUZZLE_COLUMNS} FROM puzzles ORDER BY id DESC LIMIT 1");
    sqlx::query_as::<_, Puzzle>(&sql)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)
}

/// Store an attempt and move the user's puzzle rating against the
/// puzzle's rating, scored 1 for solved and 0 for failed. The K-factor
/// comes from the user's puzzle rating and prior attempt count.
/// Returns the attempt and the user's new puzzle rating.
pub async fn record_attempt(
    pool: &PgPool,
    user_id: i64,
    puzzle_id: i64,
    solved: bool,
    time_taken_seconds: Option<i32>,
) -> Result<(PuzzleAttempt, i32), AppError> {
    let mut tx = pool.begin().await.map_err(AppError::Sqlx)?;

    let sql = format!("SELECT {PUZZLE_COLUMNS} FROM puzzles WHERE id = $1");
    let puzzle = sqlx::query_as::<_, Puzzle>(&sql)
        .bind(puzzle_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Sqlx)?
        .ok_or_else(|| AppError::NotFound("Puzzle not found".into()))?;

    let profile = profiles::get_profile_for_update(&mut tx, user_id)
        .await?
        .ok_or_else(|| AppError::Internal("User has no profile".into()))?;

    let (prior_attempts,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM puzzle_attempts WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Sqlx)?;

    let attempt = sqlx::query_as::<_, PuzzleAttempt>(
        r#"INSERT INTO puzzle_attempts (user_id, puzzle_id, solved, time_taken_seconds)
           VALUES ($1, $2, $3, $4)
           RETURNING id, puzzle_id, solved, time_taken_seconds, attempted_at"#,
    )
    .bind(user_id)
    .bind(puzzle_id)
    .bind(solved)
    .bind(time_taken_seconds)
    .fetch_one(&mut *tx)
    .await
    .map_err(AppError::Sqlx)?;

    let score = if solved { 1.0 } else { 0.0 };
    let k = k_factor(profile.puzzle_rating, prior_attempts as i32);
    let delta = elo_delta(profile.puzzle_rating, puzzle.rating, score, k);
    let new_rating = (profile.puzzle_rating + delta).max(RATING_FLOOR);

    profiles::set_puzzle_rating(&mut tx, user_id, new_rating).await?;

    sqlx::query("UPDATE puzzles SET popularity = popularity + 1 WHERE id = $1")
        .bind(puzzle_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Sqlx)?;

    tx.commit().await.map_err(AppError::Sqlx)?;
    Ok((attempt, new_rating))
}

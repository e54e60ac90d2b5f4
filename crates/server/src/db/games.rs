use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rating::{GameOutcome, PlayerRating};

use crate::db::profiles;
use crate::error::AppError;

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Game {
    pub id: i64,
    pub white_player_id: i64,
    /// None for games against the engine
    pub black_player_id: Option<i64>,
    pub time_control: String,
    pub time_limit_seconds: i32,
    pub increment_seconds: i32,
    pub result: String,
    pub pgn: Option<String>,
    pub is_rated: bool,
    pub is_vs_engine: bool,
    pub engine_difficulty: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub white_rating_before: Option<i32>,
    pub white_rating_after: Option<i32>,
    pub black_rating_before: Option<i32>,
    pub black_rating_after: Option<i32>,
}

impl Game {
    pub fn involves(&self, user_id: i64) -> bool {
        self.white_player_id == user_id || self.black_player_id == Some(user_id)
    }
}

const GAME_COLUMNS: &str = "id, white_player_id, black_player_id, time_control, \
     time_limit_seconds, increment_seconds, result, pgn, is_rated, is_vs_engine, \
     engine_difficulty, created_at, completed_at, white_rating_before, \
     white_rating_after, black_rating_before, black_rating_after";

pub struct NewGame<'a> {
    pub white_player_id: i64,
    pub black_player_id: Option<i64>,
    pub time_control: &'a str,
    pub time_limit_seconds: i32,
    pub increment_seconds: i32,
    pub is_rated: bool,
    pub is_vs_engine: bool,
    pub engine_difficulty: Option<i32>,
}

pub async fn create_game(pool: &PgPool, new: &NewGame<'_>) -> Result<Game, AppError> {
    let sql = format!(
        r#"INSERT INTO games
            (white_player_id, black_player_id, time_control, time_limit_seconds,
             increment_seconds, is_rated, is_vs_engine, engine_difficulty)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
           RETURNING {GAME_COLUMNS}"#
    );
    sqlx::query_as::<_, Game>(&sql)
        .bind(new.white_player_id)
        .bind(new.black_player_id)
        .bind(new.time_control)
        .bind(new.time_limit_seconds)
        .bind(new.increment_seconds)
        .bind(new.is_rated)
        .bind(new.is_vs_engine)
        .bind(new.engine_difficulty)
        .fetch_one(pool)
        .await
        .map_err(AppError::Sqlx)
}

pub async fn get_game(pool: &PgPool, game_id: i64) -> Result<Option<Game>, AppError> {
    let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1");
    sqlx::query_as::<_, Game>(&sql)
        .bind(game_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)
}

pub async fn list_games_for_user(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<Game>, AppError> {
    let sql = format!(
        r#"SELECT {GAME_COLUMNS} FROM games
           WHERE white_player_id = $1 OR black_player_id = $1
           ORDER BY created_at DESC
           LIMIT $2"#
    );
    sqlx::query_as::<_, Game>(&sql)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(AppError::Sqlx)
}

/// Record a finished game.
///
/// One transaction covers the whole flow: the game row is locked so a
/// result lands exactly once, both pre-game ratings are snapshotted
/// from the locked profiles, the Elo update runs off that snapshot for
/// rated games, and profile stats are bumped either way.
pub async fn complete_game(
    pool: &PgPool,
    game_id: i64,
    outcome: GameOutcome,
    pgn: Option<&str>,
) -> Result<Game, AppError> {
    let mut tx = pool.begin().await.map_err(AppError::Sqlx)?;

    let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1 FOR UPDATE");
    let game = sqlx::query_as::<_, Game>(&sql)
        .bind(game_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Sqlx)?
        .ok_or_else(|| AppError::NotFound("Game not found".into()))?;

    if game.result != "ongoing" {
        return Err(AppError::Conflict("Game result already recorded".into()));
    }

    let white_outcome_col = profiles::outcome_column(outcome, true);
    let black_outcome_col = profiles::outcome_column(outcome, false);

    // Engine games never move ratings; a missing black player means engine
    let rated_opponent = if game.is_rated && !game.is_vs_engine {
        game.black_player_id
    } else {
        None
    };

    let mut white_before = None;
    let mut white_after = None;
    let mut black_before = None;
    let mut black_after = None;

    if let Some(black_id) = rated_opponent {
        let white = profiles::get_profile_for_update(&mut tx, game.white_player_id)
            .await?
            .ok_or_else(|| AppError::Internal("White player has no profile".into()))?;
        let black = profiles::get_profile_for_update(&mut tx, black_id)
            .await?
            .ok_or_else(|| AppError::Internal("Black player has no profile".into()))?;

        let rating_col = profiles::rating_column(&game.time_control).ok_or_else(|| {
            AppError::Internal(format!("Unknown time control: {}", game.time_control))
        })?;

        let white_pre = white.rating_for(&game.time_control);
        let black_pre = black.rating_for(&game.time_control);
        let (white_post, black_post) = rating::rate_game(
            PlayerRating {
                rating: white_pre,
                games_played: white.total_games,
            },
            PlayerRating {
                rating: black_pre,
                games_played: black.total_games,
            },
            outcome,
        );

        profiles::record_rated_result(
            &mut tx,
            game.white_player_id,
            rating_col,
            white_post,
            white_outcome_col,
        )
        .await?;
        profiles::record_rated_result(&mut tx, black_id, rating_col, black_post, black_outcome_col)
            .await?;

        white_before = Some(white_pre);
        white_after = Some(white_post);
        black_before = Some(black_pre);
        black_after = Some(black_post);
    } else {
        profiles::record_unrated_result(&mut tx, game.white_player_id, white_outcome_col).await?;
        if let Some(black_id) = game.black_player_id {
            profiles::record_unrated_result(&mut tx, black_id, black_outcome_col).await?;
        }
    }

    let sql = format!(
        r#"UPDATE games SET
            result = $2,
            pgn = COALESCE($3, pgn),
            completed_at = NOW(),
            white_rating_before = $4,
            white_rating_after = $5,
            black_rating_before = $6,
            black_rating_after = $7
        WHERE id = $1
        RETURNING {GAME_COLUMNS}"#
    );
    let updated = sqlx::query_as::<_, Game>(&sql)
        .bind(game_id)
        .bind(outcome.as_str())
        .bind(pgn)
        .bind(white_before)
        .bind(white_after)
        .bind(black_before)
        .bind(black_after)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Sqlx)?;

    tx.commit().await.map_err(AppError::Sqlx)?;
    Ok(updated)
}

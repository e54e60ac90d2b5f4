use sqlx::{PgPool, Postgres, Transaction};

use rating::GameOutcome;

use crate::error::AppError;

/// A user's ratings, lifetime stats and preferences. Serializes to the
/// public profile shape; row ids stay internal.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Profile {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub rating_bullet: i32,
    pub rating_blitz: i32,
    pub rating_rapid: i32,
    pub rating_classical: i32,
    pub puzzle_rating: i32,
    pub total_games: i32,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
    pub preferred_time_control: String,
    pub board_theme: String,
    pub piece_style: String,
    pub sound_enabled: bool,
}

const PROFILE_COLUMNS: &str = "id, user_id, rating_bullet, rating_blitz, rating_rapid, \
     rating_classical, puzzle_rating, total_games, wins, losses, draws, \
     preferred_time_control, board_theme, piece_style, sound_enabled";

impl Profile {
    pub fn rating_for(&self, time_control: &str) -> i32 {
        match time_control {
            "bullet" => self.rating_bullet,
            "blitz" => self.rating_blitz,
            "rapid" => self.rating_rapid,
            "classical" => self.rating_classical,
            _ => rating::DEFAULT_RATING,
        }
    }
}

/// Rating column for a playable time control.
pub fn rating_column(time_control: &str) -> Option<&'static str> {
    match time_control {
        "bullet" => Some("rating_bullet"),
        "blitz" => Some("rating_blitz"),
        "rapid" => Some("rating_rapid"),
        "classical" => Some("rating_classical"),
        _ => None,
    }
}

/// Leaderboards additionally expose the puzzle ladder.
pub fn leaderboard_column(time_control: &str) -> Option<&'static str> {
    match time_control {
        "puzzle" => Some("puzzle_rating"),
        other => rating_column(other),
    }
}

/// Column recording this player's result: wins, losses or draws.
pub fn outcome_column(outcome: GameOutcome, is_white: bool) -> &'static str {
    match (outcome, is_white) {
        (GameOutcome::Draw, _) => "draws",
        (GameOutcome::WhiteWin, true) | (GameOutcome::BlackWin, false) => "wins",
        _ => "losses",
    }
}

pub async fn get_profile(pool: &PgPool, user_id: i64) -> Result<Option<Profile>, AppError> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1");
    sqlx::query_as::<_, Profile>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)
}

/// Lock and fetch a profile inside a result-recording transaction.
pub async fn get_profile_for_update(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
) -> Result<Option<Profile>, AppError> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1 FOR UPDATE");
    sqlx::query_as::<_, Profile>(&sql)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Sqlx)
}

pub async fn update_preferences(
    pool: &PgPool,
    user_id: i64,
    preferred_time_control: Option<&str>,
    board_theme: Option<&str>,
    piece_style: Option<&str>,
    sound_enabled: Option<bool>,
) -> Result<Profile, AppError> {
    let sql = format!(
        r#"UPDATE user_profiles SET
            preferred_time_control = COALESCE($2, preferred_time_control),
            board_theme = COALESCE($3, board_theme),
            piece_style = COALESCE($4, piece_style),
            sound_enabled = COALESCE($5, sound_enabled)
        WHERE user_id = $1
        RETURNING {PROFILE_COLUMNS}"#
    );
    sqlx::query_as::<_, Profile>(&sql)
        .bind(user_id)
        .bind(preferred_time_control)
        .bind(board_theme)
        .bind(piece_style)
        .bind(sound_enabled)
        .fetch_one(pool)
        .await
        .map_err(AppError::Sqlx)
}

/// Write one side's post-game rating and bump their stats.
pub async fn record_rated_result(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    rating_col: &str,
    new_rating: i32,
    outcome_col: &str,
) -> Result<(), AppError> {
    let sql = format!(
        "UPDATE user_profiles
         SET {rating_col} = $2,
             total_games = total_games + 1,
             {outcome_col} = {outcome_col} + 1
         WHERE user_id = $1"
    );
    sqlx::query(&sql)
        .bind(user_id)
        .bind(new_rating)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(())
}

/// Bump stats for a game that moves no rating (unrated or vs engine).
pub async fn record_unrated_result(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    outcome_col: &str,
) -> Result<(), AppError> {
    let sql = format!(
        "UPDATE user_profiles
         SET total_games = total_games + 1,
             {outcome_col} = {outcome_col} + 1
         WHERE user_id = $1"
    );
    sqlx::query(&sql)
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(())
}

pub async fn set_puzzle_rating(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    new_rating: i32,
) -> Result<(), AppError> {
    sqlx::query("UPDATE user_profiles SET puzzle_rating = $2 WHERE user_id = $1")
        .bind(user_id)
        .bind(new_rating)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(())
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub rating: i32,
    pub total_games: i32,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
}

pub async fn leaderboard_page(
    pool: &PgPool,
    rating_col: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<LeaderboardEntry>, AppError> {
    let sql = format!(
        r#"SELECT u.username, p.{rating_col} AS rating,
                  p.total_games, p.wins, p.losses, p.draws
           FROM user_profiles p
           JOIN users u ON u.id = p.user_id
           ORDER BY p.{rating_col} DESC, u.username ASC
           LIMIT $1 OFFSET $2"#
    );
    sqlx::query_as::<_, LeaderboardEntry>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(AppError::Sqlx)
}

pub async fn count_profiles(pool: &PgPool) -> Result<i64, AppError> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_profiles")
        .fetch_one(pool)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(row.0)
}

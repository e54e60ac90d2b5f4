use axum::{extract::Path, extract::Query, Extension, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::profiles::{self, LeaderboardEntry};
use crate::error::AppError;

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
    pub total_count: i64,
    pub page: i64,
    pub per_page: i64,
}

/// GET /leaderboard/{time_control}
///
/// Public. `time_control` is one of the four playable controls or
/// `puzzle` for the puzzle ladder.
pub async fn leaderboard(
    Extension(pool): Extension<PgPool>,
    Path(time_control): Path<String>,
    Query(q): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let rating_col = profiles::leaderboard_column(&time_control).ok_or_else(|| {
        AppError::Validation(format!("Unknown time control: {time_control}"))
    })?;

    let page = q.page.unwrap_or(1).max(1);
    let per_page = q.per_page.unwrap_or(50).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let entries = profiles::leaderboard_page(&pool, rating_col, per_page, offset).await?;
    let total_count = profiles::count_profiles(&pool).await?;

    Ok(Json(LeaderboardResponse {
        entries,
        total_count,
        page,
        per_page,
    }))
}

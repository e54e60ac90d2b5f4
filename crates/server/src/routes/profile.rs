use axum::{Extension, Json};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::middleware::AuthUser;
use crate::db::profiles::{self, Profile};
use crate::error::AppError;

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub preferred_time_control: Option<String>,
    pub board_theme: Option<String>,
    pub piece_style: Option<String>,
    pub sound_enabled: Option<bool>,
}

/// GET /users/me/profile
pub async fn get_my_profile(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
) -> Result<Json<Profile>, AppError> {
    let profile = profiles::get_profile(&pool, user.id)
        .await?
        .ok_or(AppError::NotFound("Profile not found".into()))?;

    Ok(Json(profile))
}

/// PUT /users/me/profile
pub async fn update_my_profile(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    if let Some(ref tc) = req.preferred_time_control {
        if profiles::rating_column(tc).is_none() {
            return Err(AppError::Validation(format!(
                "Unknown time control: {tc}"
            )));
        }
    }

    let profile = profiles::update_preferences(
        &pool,
        user.id,
        req.preferred_time_control.as_deref(),
        req.board_theme.as_deref(),
        req.piece_style.as_deref(),
        req.sound_enabled,
    )
    .await?;

    Ok(Json(profile))
}

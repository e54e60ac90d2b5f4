use axum::{Extension, Json};
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;

use crate::error::AppError;

/// Engine binary state resolved once at startup, exposed for diagnostics.
#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub path: String,
    pub available: bool,
}

/// GET /
pub async fn root() -> Json<JsonValue> {
    Json(json!({ "message": "Chess Engine API is running" }))
}

/// GET /health
pub async fn health_check(
    Extension(pool): Extension<PgPool>,
    Extension(engine): Extension<EngineStatus>,
) -> Result<Json<JsonValue>, AppError> {
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(AppError::Sqlx)?;

    Ok(Json(json!({
        "status": "healthy",
        "engine_available": engine.available,
        "engine_path": engine.path,
    })))
}

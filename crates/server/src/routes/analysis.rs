use axum::{Extension, Json};
use engine::{Analysis, Evaluator};
use serde::Deserialize;

use crate::error::AppError;

fn default_analyze_depth() -> u32 {
    12
}

fn default_batch_depth() -> u32 {
    10
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub fen: String,
    #[serde(default = "default_analyze_depth")]
    pub depth: u32,
}

#[derive(Deserialize)]
pub struct AnalyzeBatchRequest {
    pub fens: Vec<String>,
    #[serde(default = "default_batch_depth")]
    pub depth: u32,
}

/// POST /analyze
///
/// Always 200 with an `Analysis` body; engine trouble lands in its
/// `error` field, not in the HTTP status.
pub async fn analyze(
    Extension(evaluator): Extension<Evaluator>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<Analysis>, AppError> {
    if req.depth < 1 {
        return Err(AppError::Validation(
            "depth must be a positive integer".into(),
        ));
    }
    Ok(Json(evaluator.analyze(&req.fen, req.depth).await))
}

/// POST /analyze-batch
///
/// One result per input FEN, in input order; a bad position fails only
/// its own slot.
pub async fn analyze_batch(
    Extension(evaluator): Extension<Evaluator>,
    Json(req): Json<AnalyzeBatchRequest>,
) -> Result<Json<Vec<Analysis>>, AppError> {
    if req.depth < 1 {
        return Err(AppError::Validation(
            "depth must be a positive integer".into(),
        ));
    }
    Ok(Json(evaluator.analyze_batch(&req.fens, req.depth).await))
}

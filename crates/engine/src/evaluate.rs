//! Position evaluation: normalized analysis over a pluggable engine backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, Position};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::stockfish::EvalResult;

/// A depth-limited position search. Implemented by the real Stockfish
/// backend and by canned test doubles.
#[async_trait]
pub trait EngineBackend: Send + Sync {
    async fn evaluate(&self, fen: &str, depth: u32) -> Result<EvalResult, EngineError>;
}

/// Normalized analysis of one position.
///
/// `evaluation` is a White-perspective centipawn score, or a signed
/// mate distance when `mate` is true. A failed analysis has `error`
/// set, `evaluation` 0 and no best move; analysis never surfaces as an
/// HTTP error so batch callers keep one result per input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub best_move: Option<String>,
    pub evaluation: f64,
    pub mate: bool,
    pub error: Option<String>,
}

impl Analysis {
    fn failed(error: String) -> Self {
        Self {
            best_move: None,
            evaluation: 0.0,
            mate: false,
            error: Some(error),
        }
    }
}

/// Flip side-to-move relative engine scores to White's perspective.
fn normalize(raw: EvalResult, turn: Color) -> Analysis {
    let sign = match turn {
        Color::White => 1,
        Color::Black => -1,
    };
    let (evaluation, mate) = match raw.mate {
        Some(mate) => (f64::from(mate * sign), true),
        None => (f64::from(raw.cp.unwrap_or(0) * sign), false),
    };
    Analysis {
        best_move: raw.best_move,
        evaluation,
        mate,
        error: None,
    }
}

/// Runs analyses against a backend, bounding concurrent engine processes
/// with a semaphore and aborting searches that outlive the wall-clock
/// timeout.
#[derive(Clone)]
pub struct Evaluator {
    backend: Arc<dyn EngineBackend>,
    limiter: Arc<Semaphore>,
    max_concurrent: usize,
    timeout: Duration,
}

impl Evaluator {
    pub fn new(backend: Arc<dyn EngineBackend>, max_concurrent: usize, timeout: Duration) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            backend,
            limiter: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            timeout,
        }
    }

    /// Analyze one position. Never fails; problems come back in `error`.
    pub async fn analyze(&self, fen: &str, depth: u32) -> Analysis {
        let pos = match fen
            .parse::<Fen>()
            .map_err(|e| EngineError::InvalidPosition(e.to_string()))
            .and_then(|parsed| {
                parsed
                    .into_position::<Chess>(CastlingMode::Standard)
                    .map_err(|e| EngineError::InvalidPosition(e.to_string()))
            }) {
            Ok(pos) => pos,
            Err(e) => {
                debug!(fen, "rejected unparsable position");
                return Analysis::failed(e.to_string());
            }
        };

        let _permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(_) => return Analysis::failed("Engine pool is shut down".to_string()),
        };

        // On timeout the backend future is dropped, which tears down the
        // engine process via its Drop impl.
        let raw = match tokio::time::timeout(self.timeout, self.backend.evaluate(fen, depth)).await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(fen, depth, error = %e, "analysis failed");
                return Analysis::failed(e.to_string());
            }
            Err(_) => {
                warn!(fen, depth, timeout_secs = self.timeout.as_secs(), "analysis timed out");
                return Analysis::failed(EngineError::Timeout(self.timeout.as_secs()).to_string());
            }
        };

        normalize(raw, pos.turn())
    }

    /// Analyze a sequence of positions at one shared depth. Runs up to
    /// `max_concurrent` searches at a time; results come back in input
    /// order with per-item failures isolated to their own index.
    pub async fn analyze_batch(&self, fens: &[String], depth: u32) -> Vec<Analysis> {
        // Materialized before streaming: a closure over `&String` held
        // across an await trips rustc's higher-ranked auto-trait check
        // (rust-lang/rust#89976) when callers need the future to be Send.
        let analyses: Vec<_> = fens.iter().map(|fen| self.analyze(fen, depth)).collect();
        stream::iter(analyses)
            .buffered(self.max_concurrent)
            .collect()
            .await
    }
}

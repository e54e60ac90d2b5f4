//! Engine error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine binary does not exist at the configured path. The
    /// message carries the resolved path so clients can see what was
    /// probed.
    #[error("Path Error: {0}")]
    Unavailable(String),

    #[error("Invalid FEN: {0}")]
    InvalidPosition(String),

    /// Subprocess spawn/IO failures, abnormal exits and malformed output.
    #[error("Engine error: {0}")]
    Protocol(String),

    #[error("Analysis timed out after {0}s")]
    Timeout(u64),
}

//! UCI engine integration: a per-call Stockfish subprocess adapter and a
//! position evaluator that turns raw engine output into stable,
//! White-perspective analysis results.

pub mod error;
pub mod evaluate;
pub mod stockfish;

pub use error::EngineError;
pub use evaluate::{Analysis, EngineBackend, Evaluator};
pub use stockfish::{EvalResult, StockfishBackend, StockfishEngine};

//! Stockfish engine wrapper using UCI protocol (async I/O)

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::evaluate::EngineBackend;

/// Raw result of a single position search.
///
/// Scores are side-to-move relative, exactly as the engine reports them;
/// the evaluator flips them to White's perspective. Exactly one of `cp`
/// and `mate` is set.
#[derive(Debug, Clone)]
pub struct EvalResult {
    /// Centipawn score
    pub cp: Option<i32>,
    /// Mate in N moves (positive = side to move wins)
    pub mate: Option<i32>,
    /// Best move in UCI notation; `None` when the engine reports
    /// `bestmove (none)` (checkmate or stalemate on the board)
    pub best_move: Option<String>,
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str) -> Result<Self, EngineError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| EngineError::Protocol(format!("Failed to spawn Stockfish: {e}")))?;

        let stdin = process.stdin.take().unwrap();
        let stdout = BufReader::new(process.stdout.take().unwrap());

        let mut engine = Self {
            process,
            stdin,
            stdout,
        };

        // Initialize UCI
        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        // One searcher thread per process; concurrency comes from running
        // several processes, so keep each one small
        engine.send("setoption name Threads value 1").await?;
        engine.send("setoption name Hash value 16").await?;
        engine.send("setoption name UCI_AnalyseMode value true").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| EngineError::Protocol(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| EngineError::Protocol(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), EngineError> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| EngineError::Protocol(format!("Failed to read from Stockfish: {e}")))?;
            if n == 0 {
                return Err(EngineError::Protocol(format!(
                    "Engine exited before sending {expected}"
                )));
            }
            let trimmed = line.trim();
            debug!(line = trimmed, "SF >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }

    /// Run a depth-limited search and collect the final score and best move
    pub async fn evaluate(&mut self, fen: &str, depth: u32) -> Result<EvalResult, EngineError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth}")).await?;

        let mut result = EvalResult {
            cp: None,
            mate: None,
            best_move: None,
        };

        let mut line = String::new();
        loop {
            line.clear();
            let n = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| EngineError::Protocol(format!("Failed to read from Stockfish: {e}")))?;
            if n == 0 {
                return Err(EngineError::Protocol(
                    "Engine exited during search".to_string(),
                ));
            }
            let trimmed = line.trim();

            // Terminal positions report depth-0 scores with no pv, so key
            // on the score token rather than pv presence. Later info lines
            // overwrite earlier ones; the deepest score wins.
            if trimmed.starts_with("info") && trimmed.contains(" score ") {
                if let Some(cp) = parse_cp(trimmed) {
                    result.cp = Some(cp);
                    result.mate = None;
                }
                if let Some(mate) = parse_mate(trimmed) {
                    result.mate = Some(mate);
                    result.cp = None;
                }
            } else if trimmed.starts_with("bestmove") {
                result.best_move = parse_bestmove(trimmed);
                break;
            }
        }

        if result.cp.is_none() && result.mate.is_none() {
            return Err(EngineError::Protocol(
                "No score in engine output".to_string(),
            ));
        }

        Ok(result)
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }

    /// Kill the process outright; used when the UCI session is wedged
    pub async fn kill(&mut self) {
        let _ = self.process.kill().await;
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop; covers the timeout path
        // where the evaluate future is cancelled mid-search
        let _ = self.process.start_kill();
    }
}

/// Engine backend that spawns one Stockfish process per evaluation.
///
/// The binary path is probed once at construction; a missing binary makes
/// every evaluation fail with [`EngineError::Unavailable`] instead of
/// crashing the server at startup.
#[derive(Debug, Clone)]
pub struct StockfishBackend {
    path: String,
    available: bool,
}

impl StockfishBackend {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let available = std::path::Path::new(&path).exists();
        if available {
            info!(path, "Stockfish binary found");
        } else {
            warn!(path, "Stockfish binary not found; analysis will return errors");
        }
        Self { path, available }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}

#[async_trait]
impl EngineBackend for StockfishBackend {
    async fn evaluate(&self, fen: &str, depth: u32) -> Result<EvalResult, EngineError> {
        if !self.available {
            return Err(EngineError::Unavailable(self.path.clone()));
        }

        let mut engine = StockfishEngine::new(&self.path).await?;
        match engine.evaluate(fen, depth).await {
            Ok(result) => {
                engine.quit().await;
                Ok(result)
            }
            Err(e) => {
                engine.kill().await;
                Err(e)
            }
        }
    }
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "cp" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "mate" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse the move from a bestmove line; "(none)" means no legal move
fn parse_bestmove(line: &str) -> Option<String> {
    let mut parts = line.split_whitespace();
    let _ = parts.next();
    match parts.next() {
        None | Some("(none)") => None,
        Some(mv) => Some(mv.to_string()),
    }
}

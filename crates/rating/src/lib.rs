//! Elo rating calculations.
//!
//! Pure functions over pre-game rating snapshots; callers read ratings from
//! storage, call in here, and persist the results. Deltas truncate toward
//! zero (not floor, not round); changing this would change rating drift
//! over many games, so it is pinned by tests.

use serde::{Deserialize, Serialize};

/// Ratings never drop below this after an update.
pub const RATING_FLOOR: i32 = 100;

/// Rating assigned to new profiles.
pub const DEFAULT_RATING: i32 = 1200;

/// K-factor for established, sub-master players.
pub const DEFAULT_K: i32 = 32;

const PROVISIONAL_GAMES: i32 = 30;
const PROVISIONAL_K: i32 = 40;
const MASTER_RATING: i32 = 2400;
const MASTER_K: i32 = 16;

/// Result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    WhiteWin,
    BlackWin,
    Draw,
}

impl GameOutcome {
    /// Actual scores as (white, black).
    pub fn scores(self) -> (f64, f64) {
        match self {
            GameOutcome::WhiteWin => (1.0, 0.0),
            GameOutcome::BlackWin => (0.0, 1.0),
            GameOutcome::Draw => (0.5, 0.5),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameOutcome::WhiteWin => "white_win",
            GameOutcome::BlackWin => "black_win",
            GameOutcome::Draw => "draw",
        }
    }
}

/// A player's rating state going into a game.
#[derive(Debug, Clone, Copy)]
pub struct PlayerRating {
    pub rating: i32,
    pub games_played: i32,
}

/// Probability of `player` scoring against `opponent`.
pub fn expected_score(player: i32, opponent: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf(f64::from(opponent - player) / 400.0))
}

/// Rating change for one player given their actual score (1.0 win, 0.5 draw,
/// 0.0 loss). The cast truncates toward zero, matching the original
/// behavior exactly.
pub fn elo_delta(player: i32, opponent: i32, score: f64, k: i32) -> i32 {
    (f64::from(k) * (score - expected_score(player, opponent))) as i32
}

/// K-factor from a player's own rating and experience. Provisional players
/// are checked first: a 2500-rated player with 10 games still gets K=40.
pub fn k_factor(rating: i32, games_played: i32) -> i32 {
    if games_played < PROVISIONAL_GAMES {
        return PROVISIONAL_K;
    }
    if rating >= MASTER_RATING {
        return MASTER_K;
    }
    DEFAULT_K
}

/// New (white, black) ratings after a game, one shared K-factor.
///
/// Both deltas are computed from the same pre-game snapshot: the second
/// player's delta uses the first player's rating from before the update.
pub fn update_ratings(white: i32, black: i32, outcome: GameOutcome, k: i32) -> (i32, i32) {
    let (white_score, black_score) = outcome.scores();
    let new_white = white + elo_delta(white, black, white_score, k);
    let new_black = black + elo_delta(black, white, black_score, k);
    (new_white.max(RATING_FLOOR), new_black.max(RATING_FLOOR))
}

/// New (white, black) ratings with each side's K-factor chosen
/// independently from their own rating and games played.
pub fn rate_game(white: PlayerRating, black: PlayerRating, outcome: GameOutcome) -> (i32, i32) {
    let (white_score, black_score) = outcome.scores();
    let white_k = k_factor(white.rating, white.games_played);
    let black_k = k_factor(black.rating, black.games_played);
    let new_white = white.rating + elo_delta(white.rating, black.rating, white_score, white_k);
    let new_black = black.rating + elo_delta(black.rating, white.rating, black_score, black_k);
    (new_white.max(RATING_FLOOR), new_black.max(RATING_FLOOR))
}

pub mod analysis;
pub mod auth;
pub mod games;
pub mod health;
pub mod leaderboard;
pub mod profile;
pub mod puzzles;

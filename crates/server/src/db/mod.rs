pub mod games;
pub mod pool;
pub mod profiles;
pub mod puzzles;
pub mod users;

use sqlx::postgres::{PgPool, PgPoolOptions};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Run the full Postgres schema migration inline.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Users table (authentication identity)
CREATE TABLE IF NOT EXISTS users (
    id              BIGSERIAL PRIMARY KEY,
    username        TEXT UNIQUE NOT NULL,
    email           TEXT UNIQUE NOT NULL,
    hashed_password TEXT NOT NULL,
    avatar_url      TEXT,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_users_username_lower
    ON users (LOWER(username));
CREATE INDEX IF NOT EXISTS idx_users_email_lower
    ON users (LOWER(email));

-- Ratings, lifetime stats and preferences; one row per user
CREATE TABLE IF NOT EXISTS user_profiles (
    id       BIGSERIAL PRIMARY KEY,
    user_id  BIGINT UNIQUE NOT NULL REFERENCES users(id) ON DELETE CASCADE,

    rating_bullet    INTEGER NOT NULL DEFAULT 1200,
    rating_blitz     INTEGER NOT NULL DEFAULT 1200,
    rating_rapid     INTEGER NOT NULL DEFAULT 1200,
    rating_classical INTEGER NOT NULL DEFAULT 1200,
    puzzle_rating    INTEGER NOT NULL DEFAULT 1200,

    total_games INTEGER NOT NULL DEFAULT 0,
    wins        INTEGER NOT NULL DEFAULT 0,
    losses      INTEGER NOT NULL DEFAULT 0,
    draws       INTEGER NOT NULL DEFAULT 0,

    preferred_time_control TEXT NOT NULL DEFAULT 'blitz',
    board_theme    TEXT NOT NULL DEFAULT 'default',
    piece_style    TEXT NOT NULL DEFAULT 'standard',
    sound_enabled  BOOLEAN NOT NULL DEFAULT TRUE
);

-- Games; black_player_id is NULL for games against the engine
CREATE TABLE IF NOT EXISTS games (
    id                 BIGSERIAL PRIMARY KEY,
    white_player_id    BIGINT NOT NULL REFERENCES users(id),
    black_player_id    BIGINT REFERENCES users(id),

    time_control       TEXT NOT NULL,
    time_limit_seconds INTEGER NOT NULL,
    increment_seconds  INTEGER NOT NULL DEFAULT 0,

    result             TEXT NOT NULL DEFAULT 'ongoing',
    pgn                TEXT,

    is_rated           BOOLEAN NOT NULL DEFAULT TRUE,
    is_vs_engine       BOOLEAN NOT NULL DEFAULT FALSE,
    engine_difficulty  INTEGER,

    created_at         TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    completed_at       TIMESTAMPTZ,

    white_rating_before INTEGER,
    white_rating_after  INTEGER,
    black_rating_before INTEGER,
    black_rating_after  INTEGER
);

CREATE INDEX IF NOT EXISTS idx_games_white_player ON games (white_player_id);
CREATE INDEX IF NOT EXISTS idx_games_black_player ON games (black_player_id);
CREATE INDEX IF NOT EXISTS idx_games_created_at   ON games (created_at DESC);

-- Puzzles
CREATE TABLE IF NOT EXISTS puzzles (
    id         BIGSERIAL PRIMARY KEY,
    fen        TEXT NOT NULL,
    moves      TEXT NOT NULL,
    rating     INTEGER NOT NULL,
    themes     TEXT,
    popularity INTEGER NOT NULL DEFAULT 0,
    is_daily   BOOLEAN NOT NULL DEFAULT FALSE,
    daily_date TIMESTAMPTZ
);

CREATE INDEX IF NOT EXISTS idx_puzzles_daily
    ON puzzles (is_daily, daily_date DESC);

-- Puzzle attempts
CREATE TABLE IF NOT EXISTS puzzle_attempts (
    id                 BIGSERIAL PRIMARY KEY,
    user_id            BIGINT NOT NULL REFERENCES users(id),
    puzzle_id          BIGINT NOT NULL REFERENCES puzzles(id),
    solved             BOOLEAN NOT NULL,
    time_taken_seconds INTEGER,
    attempted_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_puzzle_attempts_user
    ON puzzle_attempts (user_id);
CREATE INDEX IF NOT EXISTS idx_puzzle_attempts_puzzle
    ON puzzle_attempts (puzzle_id);
"#;

//! Seed the database with sample puzzles and a test account.
//!
//! Usage: cargo run --bin seed
//!
//! Idempotent: puzzles are only inserted into an empty puzzles table and
//! the test user is skipped when it already exists.

use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use server::auth::password;
use server::config::Config;
use server::db::{pool, users};

struct SeedPuzzle {
    fen: &'static str,
    moves: &'static str,
    rating: i32,
    themes: &'static str,
    is_daily: bool,
}

const SAMPLE_PUZZLES: &[SeedPuzzle] = &[
    // Fried Liver Attack
    SeedPuzzle {
        fen: "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
        moves: "f3g5,d7d5,g5f7",
        rating: 1500,
        themes: "fork,attack",
        is_daily: true,
    },
    // Ruy Lopez opening puzzle
    SeedPuzzle {
        fen: "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
        moves: "f1b5",
        rating: 1200,
        themes: "opening,pin",
        is_daily: false,
    },
    // Sicilian Defense
    SeedPuzzle {
        fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        moves: "c7c5",
        rating: 1000,
        themes: "opening",
        is_daily: false,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();

    tracing::info!("Connecting to database...");
    let pool = pool::create_pool(&config.database_url).await?;
    pool::run_migrations(&pool).await?;

    seed_puzzles(&pool).await?;
    seed_test_user(&pool).await?;

    tracing::info!("Database seeding complete");
    Ok(())
}

async fn seed_puzzles(pool: &PgPool) -> anyhow::Result<()> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM puzzles")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        tracing::info!("Puzzles already exist. Skipping.");
        return Ok(());
    }

    for p in SAMPLE_PUZZLES {
        sqlx::query(
            r#"INSERT INTO puzzles (fen, moves, rating, themes, is_daily, daily_date)
               VALUES ($1, $2, $3, $4, $5, CASE WHEN $5 THEN NOW() ELSE NULL END)"#,
        )
        .bind(p.fen)
        .bind(p.moves)
        .bind(p.rating)
        .bind(p.themes)
        .bind(p.is_daily)
        .execute(pool)
        .await?;
    }

    tracing::info!("Added {} puzzles", SAMPLE_PUZZLES.len());
    Ok(())
}

async fn seed_test_user(pool: &PgPool) -> anyhow::Result<()> {
    if users::username_exists(pool, "testuser").await? {
        tracing::info!("Test user already exists. Skipping.");
        return Ok(());
    }

    let hash = password::hash_password("password123")
        .map_err(|e| anyhow::anyhow!("Password hash error: {e}"))?;
    let user = users::create_user(pool, "testuser", "test@example.com", &hash).await?;

    sqlx::query(
        r#"UPDATE user_profiles SET
            rating_bullet = 1400,
            rating_blitz = 1500,
            rating_rapid = 1550,
            rating_classical = 1600,
            puzzle_rating = 1450
        WHERE user_id = $1"#,
    )
    .bind(user.id)
    .execute(pool)
    .await?;

    tracing::info!("Created test user: testuser / password123");
    Ok(())
}

use std::sync::Arc;
use std::time::Duration;

use server::config;
use server::db;
use server::routes;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();

    // Connect to Postgres
    tracing::info!("Connecting to database...");
    let pool = db::pool::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run schema migrations
    tracing::info!("Running migrations...");
    db::pool::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    // Engine pool: one Stockfish subprocess per request, bounded
    let backend = engine::StockfishBackend::new(&config.stockfish_path);
    let engine_status = routes::health::EngineStatus {
        path: config.stockfish_path.clone(),
        available: backend.is_available(),
    };
    let evaluator = engine::Evaluator::new(
        Arc::new(backend),
        config.max_concurrent_engines,
        Duration::from_secs(config.engine_timeout_secs),
    );
    tracing::info!(
        max_concurrent = config.max_concurrent_engines,
        timeout_secs = config.engine_timeout_secs,
        "Engine pool ready"
    );

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        // Analysis
        .route("/analyze", post(routes::analysis::analyze))
        .route("/analyze-batch", post(routes::analysis::analyze_batch))
        // Auth
        .route("/register", post(routes::auth::register))
        .route("/token", post(routes::auth::token))
        .route("/users/me", get(routes::auth::me))
        // Profile
        .route(
            "/users/me/profile",
            get(routes::profile::get_my_profile).put(routes::profile::update_my_profile),
        )
        .route("/users/me/games", get(routes::games::my_games))
        // Games
        .route("/games", post(routes::games::create_game))
        .route("/games/{game_id}", get(routes::games::get_game))
        .route("/games/{game_id}/result", post(routes::games::record_result))
        // Puzzles
        .route("/puzzles/daily", get(routes::puzzles::daily_puzzle))
        .route(
            "/puzzles/{puzzle_id}/attempt",
            post(routes::puzzles::record_attempt),
        )
        // Leaderboard
        .route(
            "/leaderboard/{time_control}",
            get(routes::leaderboard::leaderboard),
        )
        // Shared state
        .layer(Extension(pool))
        .layer(Extension(config.clone()))
        .layer(Extension(evaluator))
        .layer(Extension(engine_status))
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}

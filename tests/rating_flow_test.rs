//! Integration tests for games, Elo updates and the leaderboard.
//!
//! Requires the server to be running on localhost:8000. Every test
//! registers its own fresh players, so both sides start at 1200 with
//! zero games and the provisional K-factor of 40 applies.

mod common;

use reqwest::Client;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Player {
    id: i64,
    username: String,
    token: String,
}

/// Register a fresh player and grab their id and token.
async fn register_player(client: &Client, prefix: &str) -> Player {
    let suffix = common::unique_suffix();
    let username = format!("{prefix}_{suffix}");
    let email = format!("{prefix}_{suffix}@example.com");

    let resp = client
        .post(common::url("/register"))
        .json(&json!({
            "username": username,
            "email": email,
            "password": "testpass123",
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(resp.status(), 200, "Register should succeed");

    let body: Value = resp.json().await.unwrap();
    let id = body["id"].as_i64().expect("user id");

    let resp = client
        .post(common::url("/token"))
        .form(&[("username", username.as_str()), ("password", "testpass123")])
        .send()
        .await
        .expect("Failed to send token request");
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    let token = body["access_token"].as_str().unwrap().to_string();

    Player {
        id,
        username,
        token,
    }
}

async fn create_game(client: &Client, token: &str, body: Value) -> reqwest::Response {
    client
        .post(common::url("/games"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to send create game request")
}

async fn post_result(
    client: &Client,
    token: &str,
    game_id: i64,
    body: Value,
) -> reqwest::Response {
    client
        .post(common::url(&format!("/games/{game_id}/result")))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to send result request")
}

async fn get_profile(client: &Client, token: &str) -> Value {
    let resp = client
        .get(common::url("/users/me/profile"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

/// Create a rated blitz game between two fresh players and return its id.
async fn rated_blitz_game(client: &Client, white: &Player, black: &Player) -> i64 {
    let resp = create_game(
        client,
        &white.token,
        json!({
            "opponent_id": black.id,
            "time_control": "blitz",
            "time_limit_seconds": 300,
            "increment_seconds": 2,
        }),
    )
    .await;
    assert_eq!(resp.status(), 200, "Game creation should succeed");

    let game: Value = resp.json().await.unwrap();
    assert_eq!(game["white_player_id"].as_i64().unwrap(), white.id);
    assert_eq!(game["black_player_id"].as_i64().unwrap(), black.id);
    assert_eq!(game["result"], "ongoing");
    assert_eq!(game["is_rated"], true);
    game["id"].as_i64().expect("game id")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// A rated win between two fresh 1200s moves both sides by the full
/// provisional step: 40 * (1 - 0.5) = 20 points each way.
#[tokio::test]
async fn rated_win_moves_both_ratings() {
    let client = common::client();
    let white = register_player(&client, "rw").await;
    let black = register_player(&client, "rb").await;
    let game_id = rated_blitz_game(&client, &white, &black).await;

    // Either participant may report; use Black here
    let resp = post_result(&client, &black.token, game_id, json!({"result": "white_win"})).await;
    assert_eq!(resp.status(), 200, "Result should be recorded");

    let done: Value = resp.json().await.unwrap();
    assert_eq!(done["result"], "white_win");
    assert_eq!(done["white_rating_before"], 1200);
    assert_eq!(done["white_rating_after"], 1220);
    assert_eq!(done["black_rating_before"], 1200);
    assert_eq!(done["black_rating_after"], 1180);
    assert!(done["completed_at"].is_string(), "got: {done}");

    let prof = get_profile(&client, &white.token).await;
    assert_eq!(prof["rating_blitz"], 1220);
    assert_eq!(prof["total_games"], 1);
    assert_eq!(prof["wins"], 1);
    assert_eq!(prof["losses"], 0);

    let prof = get_profile(&client, &black.token).await;
    assert_eq!(prof["rating_blitz"], 1180);
    assert_eq!(prof["total_games"], 1);
    assert_eq!(prof["losses"], 1);
    // Other time controls stay untouched
    assert_eq!(prof["rating_rapid"], 1200);
}

/// A draw between equals moves nothing but still counts the game.
#[tokio::test]
async fn draw_between_equals_keeps_ratings() {
    let client = common::client();
    let white = register_player(&client, "dw").await;
    let black = register_player(&client, "db").await;
    let game_id = rated_blitz_game(&client, &white, &black).await;

    let resp = post_result(&client, &white.token, game_id, json!({"result": "draw"})).await;
    assert_eq!(resp.status(), 200);

    let done: Value = resp.json().await.unwrap();
    assert_eq!(done["white_rating_after"], 1200);
    assert_eq!(done["black_rating_after"], 1200);

    let prof = get_profile(&client, &white.token).await;
    assert_eq!(prof["rating_blitz"], 1200);
    assert_eq!(prof["draws"], 1);
    assert_eq!(prof["total_games"], 1);
}

/// Reporting a result twice conflicts.
#[tokio::test]
async fn second_result_conflicts() {
    let client = common::client();
    let white = register_player(&client, "cw").await;
    let black = register_player(&client, "cb").await;
    let game_id = rated_blitz_game(&client, &white, &black).await;

    let resp = post_result(&client, &white.token, game_id, json!({"result": "white_win"})).await;
    assert_eq!(resp.status(), 200);

    let resp = post_result(&client, &white.token, game_id, json!({"result": "black_win"})).await;
    assert_eq!(resp.status(), 409, "Second result should conflict");

    let body: Value = resp.json().await.unwrap();
    assert!(
        body["detail"].as_str().unwrap().contains("already"),
        "got: {body}"
    );

    // The first result stands
    let resp = client
        .get(common::url(&format!("/games/{game_id}")))
        .bearer_auth(&white.token)
        .send()
        .await
        .unwrap();
    let game: Value = resp.json().await.unwrap();
    assert_eq!(game["result"], "white_win");
}

/// Engine games are forced unrated: no opponent row, no rating motion.
#[tokio::test]
async fn engine_game_is_forced_unrated() {
    let client = common::client();
    let player = register_player(&client, "ev").await;

    let resp = create_game(
        &client,
        &player.token,
        json!({
            "time_control": "rapid",
            "time_limit_seconds": 600,
            "is_vs_engine": true,
            "engine_difficulty": 5,
            "is_rated": true,
        }),
    )
    .await;
    assert_eq!(resp.status(), 200);

    let game: Value = resp.json().await.unwrap();
    assert_eq!(game["is_vs_engine"], true);
    assert_eq!(game["is_rated"], false, "engine games cannot be rated");
    assert!(game["black_player_id"].is_null());
    assert_eq!(game["engine_difficulty"], 5);
    let game_id = game["id"].as_i64().unwrap();

    let resp = post_result(&client, &player.token, game_id, json!({"result": "white_win"})).await;
    assert_eq!(resp.status(), 200);

    let done: Value = resp.json().await.unwrap();
    assert!(done["white_rating_after"].is_null());
    assert!(done["black_rating_after"].is_null());

    let prof = get_profile(&client, &player.token).await;
    assert_eq!(prof["rating_rapid"], 1200, "unrated games move no rating");
    assert_eq!(prof["total_games"], 1);
    assert_eq!(prof["wins"], 1);
}

#[tokio::test]
async fn engine_game_requires_difficulty() {
    let client = common::client();
    let player = register_player(&client, "ed").await;

    let resp = create_game(
        &client,
        &player.token,
        json!({
            "time_control": "blitz",
            "time_limit_seconds": 300,
            "is_vs_engine": true,
        }),
    )
    .await;
    assert_eq!(resp.status(), 422);

    let resp = create_game(
        &client,
        &player.token,
        json!({
            "time_control": "blitz",
            "time_limit_seconds": 300,
            "is_vs_engine": true,
            "engine_difficulty": 11,
        }),
    )
    .await;
    assert_eq!(resp.status(), 422, "difficulty is capped at 10");
}

#[tokio::test]
async fn human_game_requires_real_opponent() {
    let client = common::client();
    let player = register_player(&client, "ho").await;

    // Missing opponent
    let resp = create_game(
        &client,
        &player.token,
        json!({"time_control": "blitz", "time_limit_seconds": 300}),
    )
    .await;
    assert_eq!(resp.status(), 422);

    // Self as opponent
    let resp = create_game(
        &client,
        &player.token,
        json!({
            "opponent_id": player.id,
            "time_control": "blitz",
            "time_limit_seconds": 300,
        }),
    )
    .await;
    assert_eq!(resp.status(), 400);

    // Nonexistent opponent
    let resp = create_game(
        &client,
        &player.token,
        json!({
            "opponent_id": 999_999_999,
            "time_control": "blitz",
            "time_limit_seconds": 300,
        }),
    )
    .await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn unknown_time_control_rejected() {
    let client = common::client();
    let player = register_player(&client, "tc").await;

    let resp = create_game(
        &client,
        &player.token,
        json!({
            "opponent_id": player.id,
            "time_control": "correspondence",
            "time_limit_seconds": 300,
        }),
    )
    .await;
    assert_eq!(resp.status(), 422);
}

/// Outsiders can neither read a game nor report its result.
#[tokio::test]
async fn non_participant_is_forbidden() {
    let client = common::client();
    let white = register_player(&client, "pw").await;
    let black = register_player(&client, "pb").await;
    let outsider = register_player(&client, "px").await;
    let game_id = rated_blitz_game(&client, &white, &black).await;

    let resp = client
        .get(common::url(&format!("/games/{game_id}")))
        .bearer_auth(&outsider.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = post_result(&client, &outsider.token, game_id, json!({"result": "draw"})).await;
    assert_eq!(resp.status(), 403);

    // The game is still ongoing for its participants
    let resp = client
        .get(common::url(&format!("/games/{game_id}")))
        .bearer_auth(&white.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let game: Value = resp.json().await.unwrap();
    assert_eq!(game["result"], "ongoing");
}

/// /users/me/games lists the caller's games, most recent first.
#[tokio::test]
async fn my_games_lists_recent_first() {
    let client = common::client();
    let white = register_player(&client, "gw").await;
    let black = register_player(&client, "gb").await;

    let first = rated_blitz_game(&client, &white, &black).await;
    let second = rated_blitz_game(&client, &white, &black).await;

    let resp = client
        .get(common::url("/users/me/games"))
        .bearer_auth(&white.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let games: Value = resp.json().await.unwrap();
    let games = games.as_array().expect("games array");
    assert_eq!(games.len(), 2);
    assert_eq!(games[0]["id"].as_i64().unwrap(), second);
    assert_eq!(games[1]["id"].as_i64().unwrap(), first);

    // Black sees the same games from their side
    let resp = client
        .get(common::url("/users/me/games"))
        .bearer_auth(&black.token)
        .send()
        .await
        .unwrap();
    let games: Value = resp.json().await.unwrap();
    assert_eq!(games.as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

/// Walk leaderboard pages until a username turns up.
async fn find_on_leaderboard(client: &Client, time_control: &str, username: &str) -> Option<i64> {
    let per_page = 100;
    let mut page = 1;
    loop {
        let resp = client
            .get(common::url(&format!(
                "/leaderboard/{time_control}?page={page}&per_page={per_page}"
            )))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        let entries = body["entries"].as_array().expect("entries");
        for e in entries {
            if e["username"] == username {
                return e["rating"].as_i64();
            }
        }

        let total = body["total_count"].as_i64().unwrap();
        if (page * per_page) >= total || entries.is_empty() {
            return None;
        }
        page += 1;
    }
}

/// The leaderboard is public, ordered by rating, and reflects results.
#[tokio::test]
async fn leaderboard_orders_by_rating() {
    let client = common::client();
    let white = register_player(&client, "lw").await;
    let black = register_player(&client, "lb").await;
    let game_id = rated_blitz_game(&client, &white, &black).await;
    let resp = post_result(&client, &white.token, game_id, json!({"result": "white_win"})).await;
    assert_eq!(resp.status(), 200);

    // No auth header: the board is public
    let resp = client
        .get(common::url("/leaderboard/blitz?page=1&per_page=50"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 50);
    assert!(body["total_count"].as_i64().unwrap() >= 2);

    let entries = body["entries"].as_array().expect("entries");
    let ratings: Vec<i64> = entries
        .iter()
        .map(|e| e["rating"].as_i64().unwrap())
        .collect();
    let mut sorted = ratings.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(ratings, sorted, "entries must be ordered by rating desc");

    // Both fresh players ended up where the game put them
    assert_eq!(
        find_on_leaderboard(&client, "blitz", &white.username).await,
        Some(1220)
    );
    assert_eq!(
        find_on_leaderboard(&client, "blitz", &black.username).await,
        Some(1180)
    );
}

#[tokio::test]
async fn leaderboard_pagination_caps() {
    let client = common::client();
    // Make sure at least one profile exists
    register_player(&client, "lp").await;

    let resp = client
        .get(common::url("/leaderboard/blitz?page=1&per_page=1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);
    assert_eq!(body["per_page"], 1);
}

#[tokio::test]
async fn leaderboard_rejects_unknown_control() {
    let client = common::client();
    let resp = client
        .get(common::url("/leaderboard/medieval"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
}

/// The puzzle ladder is a valid leaderboard dimension.
#[tokio::test]
async fn leaderboard_has_puzzle_ladder() {
    let client = common::client();
    register_player(&client, "lz").await;

    let resp = client
        .get(common::url("/leaderboard/puzzle"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert!(body["entries"].is_array());
}

use reqwest::Client;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

pub const BASE_URL: &str = "http://localhost:8000";

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::new()
}

/// Generate a unique suffix based on timestamp to avoid collisions.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}", ts % 1_000_000_000)
}

/// Build a URL for an API endpoint.
pub fn url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

/// Register a fresh user and log them in, returning (username, bearer token).
///
/// Keep `prefix` short; usernames are capped at 20 characters.
#[allow(dead_code)]
pub async fn register_and_token(client: &Client, prefix: &str) -> (String, String) {
    let suffix = unique_suffix();
    let username = format!("{prefix}_{suffix}");
    let email = format!("{prefix}_{suffix}@example.com");

    let resp = client
        .post(url("/register"))
        .json(&json!({
            "username": username,
            "email": email,
            "password": "testpass123",
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(resp.status(), 200, "Register should succeed");

    let resp = client
        .post(url("/token"))
        .form(&[("username", username.as_str()), ("password", "testpass123")])
        .send()
        .await
        .expect("Failed to send token request");
    assert_eq!(resp.status(), 200, "Token should be issued");

    let body: Value = resp.json().await.expect("Token response should be JSON");
    let token = body["access_token"]
        .as_str()
        .expect("access_token missing")
        .to_string();

    (username, token)
}

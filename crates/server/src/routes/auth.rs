use axum::extract::{FromRequest, Multipart, Request};
use axum::{Extension, Form, Json};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{jwt, middleware::AuthUser, password};
use crate::config::Config;
use crate::db::users;
use crate::error::AppError;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// POST /register
pub async fn register(
    Extension(pool): Extension<PgPool>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<users::User>, AppError> {
    if req.username.len() < 3 {
        return Err(AppError::BadRequest(
            "Username must be at least 3 characters".into(),
        ));
    }
    if req.username.len() > 20 {
        return Err(AppError::BadRequest(
            "Username must be at most 20 characters".into(),
        ));
    }
    let username_re = Regex::new(r"^[a-zA-Z0-9_]+$").unwrap();
    if !username_re.is_match(&req.username) {
        return Err(AppError::BadRequest(
            "Username can only contain letters, numbers, and underscores".into(),
        ));
    }

    let email_re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    if !email_re.is_match(&req.email) {
        return Err(AppError::Validation("Invalid email address".into()));
    }

    if req.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }

    if users::email_exists(&pool, &req.email).await? {
        return Err(AppError::BadRequest("Email already registered".into()));
    }
    if users::username_exists(&pool, &req.username).await? {
        return Err(AppError::BadRequest("Username already taken".into()));
    }

    let hash = password::hash_password(&req.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let user = users::create_user(&pool, &req.username, &req.email, &hash).await?;

    Ok(Json(user))
}

/// POST /token
pub async fn token(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    req: Request,
) -> Result<Json<TokenResponse>, AppError> {
    let creds = extract_credentials(req).await?;

    let user = users::get_user_by_username(&pool, &creds.username)
        .await?
        .ok_or(AppError::BadCredentials)?;

    let check = password::verify_password(&creds.password, &user.hashed_password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;

    if !check.valid {
        return Err(AppError::BadCredentials);
    }

    // Transparently upgrade legacy bcrypt hashes on successful login
    if check.needs_rehash {
        if let Ok(new_hash) = password::hash_password(&creds.password) {
            let _ = users::update_password_hash(&pool, user.id, &new_hash).await;
        }
    }

    let token = jwt::create_token(user.id, &config.jwt_secret, config.jwt_expire_hours)
        .map_err(|e| AppError::Internal(format!("Token creation error: {e}")))?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}

/// GET /users/me
pub async fn me(user: AuthUser) -> Json<AuthUser> {
    Json(user)
}

/// The login form arrives as multipart/form-data from browser FormData
/// and as application/x-www-form-urlencoded from OAuth2-style clients;
/// accept both.
async fn extract_credentials(req: Request) -> Result<Credentials, AppError> {
    let content_type = req
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(req, &())
            .await
            .map_err(|_| AppError::BadRequest("Malformed form body".into()))?;

        let mut username = None;
        let mut password = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| AppError::BadRequest("Malformed form body".into()))?
        {
            let name = field.name().unwrap_or("").to_string();
            let value = field
                .text()
                .await
                .map_err(|_| AppError::BadRequest("Malformed form body".into()))?;
            match name.as_str() {
                "username" => username = Some(value),
                "password" => password = Some(value),
                _ => {}
            }
        }

        Ok(Credentials {
            username: username.ok_or(AppError::Validation("username is required".into()))?,
            password: password.ok_or(AppError::Validation("password is required".into()))?,
        })
    } else {
        let Form(creds) = Form::<Credentials>::from_request(req, &())
            .await
            .map_err(|_| AppError::Validation("username and password are required".into()))?;
        Ok(creds)
    }
}

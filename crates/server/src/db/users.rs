use sqlx::PgPool;

use crate::error::AppError;

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub avatar_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Insert a user and their profile row in one transaction.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    hashed_password: &str,
) -> Result<User, AppError> {
    let mut tx = pool.begin().await.map_err(AppError::Sqlx)?;

    let user = sqlx::query_as::<_, User>(
        r#"INSERT INTO users (username, email, hashed_password)
           VALUES ($1, $2, $3)
           RETURNING id, username, email, hashed_password, avatar_url, created_at"#,
    )
    .bind(username)
    .bind(email)
    .bind(hashed_password)
    .fetch_one(&mut *tx)
    .await
    .map_err(AppError::Sqlx)?;

    sqlx::query("INSERT INTO user_profiles (user_id) VALUES ($1)")
        .bind(user.id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Sqlx)?;

    tx.commit().await.map_err(AppError::Sqlx)?;
    Ok(user)
}

pub async fn get_user_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, AppError> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, hashed_password, avatar_url, created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Sqlx)
}

pub async fn get_user_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, AppError> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, hashed_password, avatar_url, created_at FROM users WHERE LOWER(username) = LOWER($1)",
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Sqlx)
}

pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, AppError> {
    let row: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1))")
            .bind(username)
            .fetch_one(pool)
            .await
            .map_err(AppError::Sqlx)?;

    Ok(row.0)
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, AppError> {
    let row: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
            .bind(email)
            .fetch_one(pool)
            .await
            .map_err(AppError::Sqlx)?;

    Ok(row.0)
}

pub async fn update_password_hash(
    pool: &PgPool,
    user_id: i64,
    new_hash: &str,
) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET hashed_password = $2 WHERE id = $1")
        .bind(user_id)
        .bind(new_hash)
        .execute(pool)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(())
}

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Bearer token payload. `user_id` keys the account lookup on every
/// authenticated request; `exp` is seconds since the epoch.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub exp: i64,
}

pub fn create_token(
    user_id: i64,
    secret: &str,
    expire_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = Utc::now() + Duration::hours(expire_hours);
    let claims = Claims {
        user_id,
        exp: expiration.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let token = create_token(42, "secret", 1).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, 42);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token(42, "secret", 1).unwrap();
        assert!(verify_token(&token, "other-secret").is_none());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = create_token(42, "secret", -1).unwrap();
        assert!(verify_token(&token, "secret").is_none());
    }
}

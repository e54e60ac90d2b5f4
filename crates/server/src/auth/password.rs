use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Outcome of a password check. `needs_rehash` means the stored hash is
/// a legacy bcrypt one and should be upgraded after a successful login.
#[derive(Debug, Clone, Copy)]
pub struct Verified {
    pub valid: bool,
    pub needs_rehash: bool,
}

/// Hash a password with argon2id.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
///
/// New accounts get argon2 hashes; databases imported from the previous
/// deployment still hold bcrypt hashes, which verify here and get
/// upgraded on the next successful login.
pub fn verify_password(password: &str, hash: &str) -> Result<Verified, String> {
    if hash.starts_with("$argon2") {
        let parsed = PasswordHash::new(hash).map_err(|e| e.to_string())?;
        let valid = Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();
        Ok(Verified {
            valid,
            needs_rehash: false,
        })
    } else if hash.starts_with("$2a$") || hash.starts_with("$2b$") || hash.starts_with("$2y$") {
        let valid = bcrypt::verify(password, hash).unwrap_or(false);
        // Only rehash when the password was actually correct
        Ok(Verified {
            valid,
            needs_rehash: valid,
        })
    } else {
        Err("Unknown hash format".to_string())
    }
}

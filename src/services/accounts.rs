use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{NewUser, User},
};

const TOKEN_BYTES: usize = 32;

/// Lifetime of an access token unless configured otherwise
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub password: String,
}

/// Lowercases the domain part, leaving the local part as typed
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Argon2id hash in PHC string form
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Digest under which a bearer token is stored
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Issues a new opaque bearer token for the user, valid for `ttl`
pub async fn issue_token(store: &dyn CatalogStore, user: &User, ttl: Duration) -> AppResult<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);

    store
        .store_token(&token_digest(&token), user.id, Utc::now() + ttl)
        .await?;
    Ok(token)
}

/// Resolves a bearer token to an active user
pub async fn authenticate_token(store: &dyn CatalogStore, token: &str) -> AppResult<User> {
    match store.user_for_token(&token_digest(token), Utc::now()).await? {
        Some(user) if user.is_active => Ok(user),
        _ => Err(AppError::Unauthorized(
            "Invalid or expired credentials".to_string(),
        )),
    }
}

/// Exchanges a still-valid token for a fresh one; the old token stops working
pub async fn refresh_token(store: &dyn CatalogStore, token: &str, ttl: Duration) -> AppResult<String> {
    let user = authenticate_token(store, token).await?;
    let fresh = issue_token(store, &user, ttl).await?;
    store.revoke_token(&token_digest(token)).await?;

    tracing::debug!(user_id = user.id, "Access token refreshed");
    Ok(fresh)
}

/// Creates a user together with its profile and returns a fresh token
pub async fn register(
    store: &dyn CatalogStore,
    registration: Registration,
    ttl: Duration,
) -> AppResult<(User, String)> {
    let email = normalize_email(&registration.email);
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::InvalidInput("A valid email is required".to_string()));
    }
    if registration.full_name.trim().is_empty() {
        return Err(AppError::InvalidInput("Full name is required".to_string()));
    }
    let phone_number = registration.phone_number.trim().to_string();
    if phone_number.is_empty() || phone_number.len() > 15 {
        return Err(AppError::InvalidInput(
            "A phone number of at most 15 characters is required".to_string(),
        ));
    }
    if registration.password.is_empty() {
        return Err(AppError::InvalidInput("Password is required".to_string()));
    }

    let (user, profile) = store
        .create_user(NewUser {
            email,
            phone_number,
            full_name: registration.full_name.trim().to_string(),
            password_hash: hash_password(&registration.password)?,
        })
        .await?;

    tracing::info!(user_id = user.id, profile_id = profile.id, "User registered");

    let token = issue_token(store, &user, ttl).await?;
    Ok((user, token))
}

/// Checks credentials and returns a fresh token
pub async fn login(
    store: &dyn CatalogStore,
    email: &str,
    password: &str,
    ttl: Duration,
) -> AppResult<String> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let user = store
        .find_user_by_email(&normalize_email(email))
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active || !verify_password(password, &user.password_hash) {
        return Err(invalid());
    }

    issue_token(store, &user, ttl).await
}

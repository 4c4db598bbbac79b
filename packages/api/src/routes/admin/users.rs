use axum::{
    Router,
    routing::{delete, get, post},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::{error::ApiError, state::AppState};

pub mod create_user;
pub mod delete_user;
pub mod list_users;
pub mod update_password;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users::list_users).post(create_user::create_user))
        .route("/{user_id}/password", post(update_password::update_password))
        .route("/{user_id}", delete(delete_user::delete_user))
}

/// Hash a password with a fresh random salt. Stored as `salt$digest`, both
/// sides printable.
pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::fill(&mut salt_bytes)
        .map_err(|e| ApiError::internal(format!("Failed to generate salt: {}", e)))?;
    let salt = URL_SAFE_NO_PAD.encode(salt_bytes);
    Ok(format!("{}${}", salt, digest(&salt, password)))
}

pub(crate) fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => digest(salt, password) == expected,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize().to_hex().to_string()
}

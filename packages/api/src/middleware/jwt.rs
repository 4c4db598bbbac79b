use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::decode;
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    state::{AppState, CachedAuth},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account id as a string, per JWT convention
    pub sub: String,
    #[serde(default)]
    pub staff: bool,
    pub exp: usize,
}

/// Identity attached to every request by [`jwt_middleware`].
///
/// Requests without a usable token still pass through as `Unauthorized`;
/// handlers decide what they require via [`AppUser::user_id`] or
/// [`AppUser::require_staff`].
#[derive(Debug, Clone)]
pub enum AppUser {
    User { id: i32, staff: bool },
    Unauthorized,
}

impl AppUser {
    pub fn user_id(&self) -> Result<i32, ApiError> {
        match self {
            AppUser::User { id, .. } => Ok(*id),
            AppUser::Unauthorized => {
                Err(ApiError::unauthorized("Missing or invalid bearer token"))
            }
        }
    }

    pub fn require_staff(&self) -> Result<i32, ApiError> {
        match self {
            AppUser::User { id, staff: true } => Ok(*id),
            AppUser::User { .. } => Err(ApiError::forbidden("Staff access required")),
            AppUser::Unauthorized => {
                Err(ApiError::unauthorized("Missing or invalid bearer token"))
            }
        }
    }
}

fn token_hash(token: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_hex().to_string()
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Validate a bearer token against the configured HS256 secret, going
/// through the short-TTL auth cache first.
pub(crate) fn authorize(state: &AppState, token: &str) -> AppUser {
    let hash = token_hash(token);
    if let Some(cached) = state.auth_cache.get(&hash) {
        return match cached {
            CachedAuth::User { id, staff } => AppUser::User { id, staff },
            CachedAuth::Invalid => AppUser::Unauthorized,
        };
    }

    let decoded = decode::<Claims>(token, &state.jwt_decoding_key, &state.jwt_validation)
        .ok()
        .and_then(|data| {
            let id = data.claims.sub.parse::<i32>().ok()?;
            Some((id, data.claims.staff))
        });

    match decoded {
        Some((id, staff)) => {
            state.auth_cache.insert(hash, CachedAuth::User { id, staff });
            AppUser::User { id, staff }
        }
        None => {
            state.auth_cache.insert(hash, CachedAuth::Invalid);
            AppUser::Unauthorized
        }
    }
}

pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = match bearer_token(&request) {
        Some(token) => authorize(&state, token),
        None => AppUser::Unauthorized,
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

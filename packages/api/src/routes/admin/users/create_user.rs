use axum::{Extension, Json, extract::State};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    bad_request,
    entity::user,
    error::ApiError,
    middleware::jwt::AppUser,
    routes::admin::users::hash_password,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "admin",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Account created"),
        (status = 400, description = "Missing username or password"),
        (status = 409, description = "Username already taken")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "POST /admin/users", skip(state, user, req))]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<user::Model>, ApiError> {
    user.require_staff()?;

    let username = req.username.trim().to_string();
    if username.is_empty() || req.password.is_empty() {
        return Err(bad_request!("Username and password are required"));
    }

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("Username already taken"));
    }

    let now = Utc::now().naive_utc();
    let created = user::ActiveModel {
        username: Set(username),
        email: Set(req.email.filter(|e| !e.trim().is_empty())),
        password_hash: Set(hash_password(&req.password)?),
        is_staff: Set(false),
        is_superuser: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok(Json(created))
}

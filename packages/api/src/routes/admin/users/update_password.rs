use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    bad_request,
    entity::user,
    error::ApiError,
    middleware::jwt::AppUser,
    not_found,
    routes::admin::users::{hash_password, verify_password},
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdatePasswordResponse {
    pub success: bool,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/admin/users/{user_id}/password",
    tag = "admin",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = UpdatePasswordResponse),
        (status = 400, description = "Old password is incorrect or new password empty"),
        (status = 404, description = "No such account")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "POST /admin/users/{user_id}/password", skip(state, user, req))]
pub async fn update_password(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(user_id): Path<i32>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<Json<UpdatePasswordResponse>, ApiError> {
    user.require_staff()?;

    if req.new_password.is_empty() {
        return Err(bad_request!("New password must not be empty"));
    }

    let account = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found!("User {} not found", user_id))?;

    if !verify_password(&req.old_password, &account.password_hash) {
        return Err(bad_request!("Old password is incorrect"));
    }

    let mut account: user::ActiveModel = account.into();
    account.password_hash = Set(hash_password(&req.new_password)?);
    account.updated_at = Set(Utc::now().naive_utc());
    account.update(&state.db).await?;

    Ok(Json(UpdatePasswordResponse {
        success: true,
        message: "Password updated".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn rotating_the_hash_invalidates_the_old_password() {
        let db = test_support::setup_db().await;
        let account = test_support::seed_user(&db, "alice", false).await;
        assert!(verify_password("password", &account.password_hash));

        let mut active: user::ActiveModel = account.into();
        active.password_hash = Set(hash_password("fresh").unwrap());
        let updated = active.update(&db).await.unwrap();

        assert!(verify_password("fresh", &updated.password_hash));
        assert!(!verify_password("password", &updated.password_hash));
    }
}

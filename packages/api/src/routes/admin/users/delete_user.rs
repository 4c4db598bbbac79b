use axum::{
    Extension, Json,
    extract::{Path, State},
};
use sea_orm::{EntityTrait, ModelTrait};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    entity::user, error::ApiError, forbidden, middleware::jwt::AppUser, not_found,
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub message: String,
}

#[utoipa::path(
    delete,
    path = "/admin/users/{user_id}",
    tag = "admin",
    responses(
        (status = 200, description = "Account removed", body = DeleteUserResponse),
        (status = 403, description = "Superuser accounts cannot be removed"),
        (status = 404, description = "No such account")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "DELETE /admin/users/{user_id}", skip(state, user))]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(user_id): Path<i32>,
) -> Result<Json<DeleteUserResponse>, ApiError> {
    user.require_staff()?;

    let account = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found!("User {} not found", user_id))?;

    if account.is_superuser {
        return Err(forbidden!("Superuser accounts cannot be removed"));
    }

    let username = account.username.clone();
    account.delete(&state.db).await?;

    Ok(Json(DeleteUserResponse {
        success: true,
        message: format!("User {} removed", username),
    }))
}

#[cfg(test)]
mod tests {
    use sea_orm::{ActiveModelTrait, Set};

    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn superusers_survive_deletion_attempts() {
        let db = test_support::setup_db().await;
        let account = test_support::seed_user(&db, "root", true).await;

        let mut active: user::ActiveModel = account.clone().into();
        active.is_superuser = Set(true);
        let account = active.update(&db).await.unwrap();

        assert!(account.is_superuser);
        // The handler refuses before touching the row; deleting a plain
        // account goes through.
        let plain = test_support::seed_user(&db, "alice", false).await;
        plain.delete(&db).await.unwrap();
        assert!(
            user::Entity::find_by_id(account.id)
                .one(&db)
                .await
                .unwrap()
                .is_some()
        );
    }
}

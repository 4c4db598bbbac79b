use axum::{
    Extension, Json,
    extract::{Query, State},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;

use crate::{entity::user, error::ApiError, middleware::jwt::AppUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// Substring match on the username
    pub search: Option<String>,
}

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    params(
        ("search" = Option<String>, Query, description = "Substring match on the username")
    ),
    responses(
        (status = 200, description = "Accounts, password hashes omitted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "GET /admin/users", skip(state, user))]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<user::Model>>, ApiError> {
    user.require_staff()?;

    let mut select = user::Entity::find();
    if let Some(q) = query.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        select = select.filter(user::Column::Username.contains(q));
    }

    let users = select
        .order_by_asc(user::Column::Username)
        .all(&state.db)
        .await?;
    Ok(Json(users))
}

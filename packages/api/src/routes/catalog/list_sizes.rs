use axum::{Json, extract::State};
use sea_orm::{EntityTrait, QueryOrder};

use crate::{entity::size, error::ApiError, state::AppState};

/// All size labels; the storefront cart renders these into its size picker.
#[tracing::instrument(name = "GET /sizes", skip(state))]
pub async fn list_sizes(State(state): State<AppState>) -> Result<Json<Vec<size::Model>>, ApiError> {
    let sizes = size::Entity::find()
        .order_by_asc(size::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(sizes))
}

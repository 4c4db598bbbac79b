use axum::{Json, extract::State};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::{entity::category, error::ApiError, state::AppState};

/// Visible categories for the storefront navigation.
#[tracing::instrument(name = "GET /categories", skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<category::Model>>, ApiError> {
    let categories = category::Entity::find()
        .filter(category::Column::Hide.eq(false))
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(categories))
}

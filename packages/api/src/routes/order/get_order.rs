use axum::{
    Extension, Json,
    extract::{Path, State},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::{
    entity::order,
    error::ApiError,
    middleware::jwt::AppUser,
    not_found,
    routes::order::{OrderDetail, load_order_details},
    state::AppState,
};

/// One of the caller's orders with its line items. Orders of other users
/// are indistinguishable from missing ones.
#[tracing::instrument(name = "GET /orders/order/{order_id}", skip(state, user))]
pub async fn get_order(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(order_id): Path<i32>,
) -> Result<Json<OrderDetail>, ApiError> {
    let user_id = user.user_id()?;

    let order = order::Entity::find_by_id(order_id)
        .filter(order::Column::UserId.eq(user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found!("Order {} not found", order_id))?;

    let mut details = load_order_details(&state.db, vec![order]).await?;
    details
        .pop()
        .ok_or_else(|| ApiError::internal("Order detail resolution returned nothing"))
        .map(Json)
}

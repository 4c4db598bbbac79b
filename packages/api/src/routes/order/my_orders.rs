use axum::{Extension, Json, extract::State};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::{
    entity::order,
    error::ApiError,
    middleware::jwt::AppUser,
    routes::order::{OrderDetail, load_order_details},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct MyOrdersResponse {
    pub orders: Vec<OrderDetail>,
}

/// The caller's order history, newest first.
#[tracing::instrument(name = "GET /orders/my-orders", skip(state, user))]
pub async fn my_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> Result<Json<MyOrdersResponse>, ApiError> {
    let user_id = user.user_id()?;

    let orders = order::Entity::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let orders = load_order_details(&state.db, orders).await?;
    Ok(Json(MyOrdersResponse { orders }))
}

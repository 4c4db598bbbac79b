use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::{
    bad_request,
    entity::{order, sea_orm_active_enums::OrderStatus},
    error::ApiError,
    middleware::jwt::AppUser,
    not_found,
    routes::admin::orders::StatusChangeResponse,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/admin/orders/{order_id}/accept",
    tag = "admin",
    params(
        ("order_id" = i32, Path, description = "Order to accept")
    ),
    responses(
        (status = 200, description = "Order confirmed", body = StatusChangeResponse),
        (status = 400, description = "Order is not pending"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "POST /admin/orders/{order_id}/accept", skip(state, user))]
pub async fn accept_order(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(order_id): Path<i32>,
) -> Result<Json<StatusChangeResponse>, ApiError> {
    user.require_staff()?;

    let order = order::Entity::find_by_id(order_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found!("Order {} not found", order_id))?;

    if order.status != OrderStatus::Pending {
        return Err(bad_request!("Only pending orders can be accepted"));
    }

    let mut active: order::ActiveModel = order.into();
    active.status = Set(OrderStatus::Confirmed);
    active.updated_at = Set(Utc::now().naive_utc());
    let order = active.update(&state.db).await?;

    Ok(Json(StatusChangeResponse::new(
        "Order accepted",
        order.id,
        order.status,
    )))
}

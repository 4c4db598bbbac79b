use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    bad_request,
    entity::{order, sea_orm_active_enums::OrderStatus},
    error::ApiError,
    middleware::jwt::AppUser,
    not_found,
    routes::admin::orders::StatusChangeResponse,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
}

fn parse_status(raw: &str) -> Result<OrderStatus, ApiError> {
    match raw.trim().to_lowercase().as_str() {
        "pending" => Ok(OrderStatus::Pending),
        "confirmed" => Ok(OrderStatus::Confirmed),
        "shipping" => Ok(OrderStatus::Shipping),
        "completed" => Ok(OrderStatus::Completed),
        "cancelled" => Ok(OrderStatus::Cancelled),
        _ => Err(bad_request!("Invalid status")),
    }
}

/// Advance an order one step along its lifecycle. Cancellation is refused
/// here because it has to restore stock; that path is the cancel endpoint.
pub(crate) async fn apply_status(
    db: &DatabaseConnection,
    order_id: i32,
    target: OrderStatus,
) -> Result<order::Model, ApiError> {
    if target == OrderStatus::Cancelled {
        return Err(bad_request!(
            "Cancellation must go through the cancel endpoint"
        ));
    }

    let order = order::Entity::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| not_found!("Order {} not found", order_id))?;

    if !order.status.can_transition_to(target) {
        return Err(bad_request!(
            "Cannot move a {} order to {}",
            order.status.label(),
            target.label()
        ));
    }

    let mut active: order::ActiveModel = order.into();
    active.status = Set(target);
    active.updated_at = Set(Utc::now().naive_utc());
    Ok(active.update(db).await?)
}

#[utoipa::path(
    post,
    path = "/admin/orders/{order_id}/update-status",
    tag = "admin",
    params(
        ("order_id" = i32, Path, description = "Order to update")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = StatusChangeResponse),
        (status = 400, description = "Invalid status or illegal transition"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "POST /admin/orders/{order_id}/update-status", skip(state, user, req))]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(order_id): Path<i32>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<StatusChangeResponse>, ApiError> {
    user.require_staff()?;

    let target = parse_status(&req.status)?;
    let order = apply_status(&state.db, order_id, target).await?;

    Ok(Json(StatusChangeResponse::new(
        "Status updated",
        order.id,
        order.status,
    )))
}

use axum::{
    Router,
    routing::{get, post},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{entity::sea_orm_active_enums::OrderStatus, state::AppState};

pub mod accept_order;
pub mod cancel_order;
pub mod search_orders;
pub mod statistics;
pub mod update_status;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_orders::search_orders))
        .route("/statistics", get(statistics::order_statistics))
        .route("/{order_id}/accept", post(accept_order::accept_order))
        .route("/{order_id}/cancel", post(cancel_order::cancel_order))
        .route(
            "/{order_id}/update-status",
            post(update_status::update_status),
        )
}

/// Common response of the status-changing admin endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusChangeResponse {
    pub success: bool,
    pub message: String,
    pub order_id: i32,
    #[schema(value_type = String)]
    pub new_status: OrderStatus,
    #[schema(value_type = String)]
    pub status_display: &'static str,
}

impl StatusChangeResponse {
    pub(crate) fn new(message: impl Into<String>, order_id: i32, status: OrderStatus) -> Self {
        Self {
            success: true,
            message: message.into(),
            order_id,
            new_status: status,
            status_display: status.label(),
        }
    }
}

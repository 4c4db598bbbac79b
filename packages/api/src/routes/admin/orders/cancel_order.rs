use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    bad_request,
    entity::{order, order_item, product_size, sea_orm_active_enums::OrderStatus},
    error::ApiError,
    internal,
    middleware::jwt::AppUser,
    not_found,
    routes::admin::orders::StatusChangeResponse,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelRequest {
    pub reason: String,
}

/// Cancel an order and restore the stock it reserved, in one transaction.
///
/// Only pending and confirmed orders can be cancelled; anything that has
/// shipped keeps its decrement. The reason is appended to the order note.
pub(crate) async fn cancel_order_by_id(
    db: &DatabaseConnection,
    order_id: i32,
    reason: &str,
) -> Result<order::Model, ApiError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(bad_request!("A cancellation reason is required"));
    }

    let txn = db.begin().await?;

    let order = order::Entity::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found!("Order {} not found", order_id))?;

    if !order.status.cancellable() {
        return Err(bad_request!("Order cannot be cancelled in its current state"));
    }

    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .all(&txn)
        .await?;

    for item in items {
        let variant = product_size::Entity::find_by_id(item.product_size_id)
            .one(&txn)
            .await?
            .ok_or_else(|| internal!("Order item {} lost its variant", item.id))?;

        let restored = variant.quantity + item.quantity;
        let mut active: product_size::ActiveModel = variant.into();
        active.quantity = Set(restored);
        active.update(&txn).await?;
    }

    let annotation = format!("[CANCELLED] Reason: {}", reason);
    let note = match &order.note {
        Some(note) => format!("{}\n{}", note, annotation),
        None => annotation,
    };

    let mut active: order::ActiveModel = order.into();
    active.note = Set(Some(note));
    active.status = Set(OrderStatus::Cancelled);
    active.updated_at = Set(Utc::now().naive_utc());
    let order = active.update(&txn).await?;

    txn.commit().await?;
    Ok(order)
}

#[utoipa::path(
    post,
    path = "/admin/orders/{order_id}/cancel",
    tag = "admin",
    params(
        ("order_id" = i32, Path, description = "Order to cancel")
    ),
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Order cancelled, stock restored", body = StatusChangeResponse),
        (status = 400, description = "Missing reason or order not cancellable"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "POST /admin/orders/{order_id}/cancel", skip(state, user, req))]
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(order_id): Path<i32>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<StatusChangeResponse>, ApiError> {
    user.require_staff()?;

    let order = cancel_order_by_id(&state.db, order_id, &req.reason).await?;

    Ok(Json(StatusChangeResponse::new(
        "Order cancelled",
        order.id,
        order.status,
    )))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use sea_orm::EntityTrait;

    use super::*;
    use crate::routes::order::process_checkout::{
        CheckoutItem, CheckoutRequest, SizeRef, place_order,
    };
    use crate::test_support::{self, Seeded};

    async fn place_test_order(db: &DatabaseConnection, seeded: &Seeded) -> order::Model {
        let user = test_support::seed_user(db, "alice", false).await;
        let req = CheckoutRequest {
            receiver: "Alice".into(),
            phone: "0123456789".into(),
            address: "1 Main Street".into(),
            note: None,
            items: vec![
                CheckoutItem {
                    product_id: seeded.product.id,
                    size_id: SizeRef::Id(seeded.size_m.id),
                    quantity: 3,
                },
                CheckoutItem {
                    product_id: seeded.product.id,
                    size_id: SizeRef::Id(seeded.size_l.id),
                    quantity: 1,
                },
            ],
            total_amount: 0.0,
        };
        place_order(db, user.id, req).await.unwrap()
    }

    #[tokio::test]
    async fn cancelling_restores_stock_and_annotates_note() {
        let db = test_support::setup_db().await;
        let seeded = test_support::seed_catalog(&db).await;
        let placed = place_test_order(&db, &seeded).await;

        let cancelled = cancel_order_by_id(&db, placed.id, "customer request")
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(
            cancelled
                .note
                .as_deref()
                .unwrap()
                .contains("[CANCELLED] Reason: customer request")
        );

        let m = product_size::Entity::find_by_id(seeded.variant_m.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let l = product_size::Entity::find_by_id(seeded.variant_l.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.quantity, seeded.variant_m.quantity);
        assert_eq!(l.quantity, seeded.variant_l.quantity);
    }

    #[tokio::test]
    async fn stock_is_restored_exactly_once() {
        let db = test_support::setup_db().await;
        let seeded = test_support::seed_catalog(&db).await;
        let placed = place_test_order(&db, &seeded).await;

        cancel_order_by_id(&db, placed.id, "mistake").await.unwrap();
        let err = cancel_order_by_id(&db, placed.id, "again").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let m = product_size::Entity::find_by_id(seeded.variant_m.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.quantity, seeded.variant_m.quantity);
    }

    #[tokio::test]
    async fn shipped_orders_cannot_be_cancelled() {
        let db = test_support::setup_db().await;
        let seeded = test_support::seed_catalog(&db).await;
        let placed = place_test_order(&db, &seeded).await;

        test_support::force_status(&db, placed.id, OrderStatus::Shipping).await;
        let err = cancel_order_by_id(&db, placed.id, "too late").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        // The decrement must stay in place.
        let m = product_size::Entity::find_by_id(seeded.variant_m.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.quantity, seeded.variant_m.quantity - 3);
    }

    #[tokio::test]
    async fn blank_reasons_are_rejected() {
        let db = test_support::setup_db().await;
        let seeded = test_support::seed_catalog(&db).await;
        let placed = place_test_order(&db, &seeded).await;

        let err = cancel_order_by_id(&db, placed.id, "  ").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let current = order::Entity::find_by_id(placed.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, OrderStatus::Pending);
    }
}

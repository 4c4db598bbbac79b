use std::collections::HashMap;

use axum::{Extension, Json, extract::State};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::{
    bad_request,
    entity::{order, order_item, product, product_size, sea_orm_active_enums::OrderStatus, size},
    error::ApiError,
    internal,
    middleware::jwt::AppUser,
    state::AppState,
};

/// A size reference in a cart line. The storefront JS sends numeric ids,
/// but size names ("M", "L") are accepted as well.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SizeRef {
    Id(i32),
    Name(String),
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CheckoutItem {
    pub product_id: i32,
    pub size_id: SizeRef,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub receiver: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    /// Client-side total. Informational only; the order total is recomputed
    /// from the resolved lines.
    #[serde(default)]
    pub total_amount: f64,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub status: String,
    pub message: String,
    pub order_id: i32,
}

struct ResolvedLine {
    variant: product_size::Model,
    unit_price: f64,
    quantity: i32,
}

async fn resolve_variant(
    txn: &sea_orm::DatabaseTransaction,
    item: &CheckoutItem,
) -> Result<Option<product_size::Model>, ApiError> {
    let select =
        product_size::Entity::find().filter(product_size::Column::ProductId.eq(item.product_id));

    let variant = match &item.size_id {
        SizeRef::Id(size_id) => {
            select
                .filter(product_size::Column::SizeId.eq(*size_id))
                .one(txn)
                .await?
        }
        SizeRef::Name(name) => {
            select
                .join(JoinType::InnerJoin, product_size::Relation::Size.def())
                .filter(size::Column::Name.eq(name.trim()))
                .one(txn)
                .await?
        }
    };

    Ok(variant)
}

/// Place an order for a cart within a single transaction.
///
/// Every line is resolved to a ProductSize and checked against stock before
/// anything is written; on any failure the transaction is dropped without a
/// commit, so no partial order can ever be observed. The order total is the
/// sum of the lines at the products' current prices, which become the
/// per-item snapshots.
pub(crate) async fn place_order(
    db: &DatabaseConnection,
    user_id: i32,
    req: CheckoutRequest,
) -> Result<order::Model, ApiError> {
    let receiver = req.receiver.trim().to_string();
    let phone = req.phone.trim().to_string();
    let address = req.address.trim().to_string();
    let note = req
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    if receiver.is_empty() || phone.is_empty() || address.is_empty() {
        return Err(bad_request!("Please fill in receiver, phone and address"));
    }
    if req.items.is_empty() {
        return Err(bad_request!("Cart is empty"));
    }

    let txn = db.begin().await?;
    let now = Utc::now().naive_utc();

    // Resolve and validate every line before writing anything. Reserved
    // quantities are accumulated per variant so duplicate lines for the same
    // (product, size) pair are checked against stock together.
    let mut lines: Vec<ResolvedLine> = Vec::with_capacity(req.items.len());
    let mut reserved: HashMap<i32, (product_size::Model, i32)> = HashMap::new();
    let mut total_amount = 0.0;

    for item in &req.items {
        if item.quantity <= 0 {
            return Err(bad_request!("Quantities must be positive"));
        }

        let variant = resolve_variant(&txn, item)
            .await?
            .ok_or_else(|| bad_request!("Product or size does not exist"))?;

        let product = product::Entity::find_by_id(variant.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| internal!("Variant {} has no product", variant.id))?;

        let entry = reserved
            .entry(variant.id)
            .or_insert_with(|| (variant.clone(), 0));
        entry.1 += item.quantity;

        if entry.1 > variant.quantity {
            let size_name = size::Entity::find_by_id(variant.size_id)
                .one(&txn)
                .await?
                .map(|s| s.name)
                .unwrap_or_default();
            return Err(bad_request!(
                "Product {} (size {}) has insufficient stock: {} left",
                product.name,
                size_name,
                variant.quantity
            ));
        }

        total_amount += product.price * item.quantity as f64;
        lines.push(ResolvedLine {
            unit_price: product.price,
            quantity: item.quantity,
            variant,
        });
    }

    let placed = order::ActiveModel {
        user_id: Set(user_id),
        receiver: Set(receiver),
        phone: Set(phone),
        address: Set(address),
        note: Set(note),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for line in &lines {
        order_item::ActiveModel {
            order_id: Set(placed.id),
            product_size_id: Set(line.variant.id),
            quantity: Set(line.quantity),
            price: Set(line.unit_price),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    for (variant, quantity) in reserved.into_values() {
        let remaining = variant.quantity - quantity;
        let mut active: product_size::ActiveModel = variant.into();
        active.quantity = Set(remaining);
        active.update(&txn).await?;
    }

    txn.commit().await?;
    Ok(placed)
}

#[tracing::instrument(name = "POST /orders/process-checkout", skip(state, user, req))]
pub async fn process_checkout(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let user_id = user.user_id()?;
    let order = place_order(&state.db, user_id, req).await?;

    Ok(Json(CheckoutResponse {
        status: "success".to_string(),
        message: "Order placed successfully".to_string(),
        order_id: order.id,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

    use super::*;
    use crate::test_support::{self, Seeded};

    fn request(items: Vec<CheckoutItem>) -> CheckoutRequest {
        CheckoutRequest {
            receiver: "Alice".into(),
            phone: "0123456789".into(),
            address: "1 Main Street".into(),
            note: None,
            items,
            total_amount: 0.0,
        }
    }

    fn line(seeded: &Seeded, size_id: i32, quantity: i32) -> CheckoutItem {
        CheckoutItem {
            product_id: seeded.product.id,
            size_id: SizeRef::Id(size_id),
            quantity,
        }
    }

    #[tokio::test]
    async fn checkout_decrements_stock_and_totals_lines() {
        let db = test_support::setup_db().await;
        let seeded = test_support::seed_catalog(&db).await;
        let user = test_support::seed_user(&db, "alice", false).await;

        let mut req = request(vec![
            line(&seeded, seeded.size_m.id, 2),
            line(&seeded, seeded.size_l.id, 1),
        ]);
        // A lying client total must not be trusted.
        req.total_amount = 1.0;

        let order = place_order(&db, user.id, req).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, seeded.product.price * 3.0);

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
        assert_eq!(m.quantity, seeded.variant_m.quantity - 2);
        assert_eq!(l.quantity, seeded.variant_l.quantity - 1);
    }

    #[tokio::test]
    async fn insufficient_stock_rolls_back_everything() {
        let db = test_support::setup_db().await;
        let seeded = test_support::seed_catalog(&db).await;
        let user = test_support::seed_user(&db, "alice", false).await;

        let req = request(vec![
            line(&seeded, seeded.size_m.id, 1),
            line(&seeded, seeded.size_l.id, seeded.variant_l.quantity + 1),
        ]);

        let err = place_order(&db, user.id, req).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        // Nothing committed: no order, no items, stock untouched.
        assert_eq!(order::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(order_item::Entity::find().count(&db).await.unwrap(), 0);
        let m = product_size::Entity::find_by_id(seeded.variant_m.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.quantity, seeded.variant_m.quantity);
    }

    #[tokio::test]
    async fn duplicate_lines_are_checked_against_stock_together() {
        let db = test_support::setup_db().await;
        let seeded = test_support::seed_catalog(&db).await;
        let user = test_support::seed_user(&db, "alice", false).await;

        // Each line fits individually but not combined.
        let quantity = seeded.variant_m.quantity;
        let req = request(vec![
            line(&seeded, seeded.size_m.id, quantity),
            line(&seeded, seeded.size_m.id, 1),
        ]);

        let err = place_order(&db, user.id, req).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(order::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn size_may_be_referenced_by_name() {
        let db = test_support::setup_db().await;
        let seeded = test_support::seed_catalog(&db).await;
        let user = test_support::seed_user(&db, "alice", false).await;

        let req = request(vec![CheckoutItem {
            product_id: seeded.product.id,
            size_id: SizeRef::Name("M".into()),
            quantity: 1,
        }]);

        let order = place_order(&db, user.id, req).await.unwrap();
        let items = order_item::Entity::find().all(&db).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].order_id, order.id);
        assert_eq!(items[0].product_size_id, seeded.variant_m.id);
    }

    #[tokio::test]
    async fn item_price_is_a_snapshot() {
        let db = test_support::setup_db().await;
        let seeded = test_support::seed_catalog(&db).await;
        let user = test_support::seed_user(&db, "alice", false).await;

        let original_price = seeded.product.price;
        let req = request(vec![line(&seeded, seeded.size_m.id, 1)]);
        place_order(&db, user.id, req).await.unwrap();

        let mut active: product::ActiveModel = seeded.product.into();
        active.price = Set(original_price * 2.0);
        active.update(&db).await.unwrap();

        let items = order_item::Entity::find().all(&db).await.unwrap();
        assert_eq!(items[0].price, original_price);
    }

    #[tokio::test]
    async fn blank_shipping_fields_and_empty_carts_are_rejected() {
        let db = test_support::setup_db().await;
        let seeded = test_support::seed_catalog(&db).await;
        let user = test_support::seed_user(&db, "alice", false).await;

        let mut req = request(vec![line(&seeded, seeded.size_m.id, 1)]);
        req.receiver = "   ".into();
        let err = place_order(&db, user.id, req).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = place_order(&db, user.id, request(vec![])).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let req = request(vec![line(&seeded, seeded.size_m.id, 0)]);
        let err = place_order(&db, user.id, req).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_variants_are_rejected() {
        let db = test_support::setup_db().await;
        let seeded = test_support::seed_catalog(&db).await;
        let user = test_support::seed_user(&db, "alice", false).await;

        let req = request(vec![CheckoutItem {
            product_id: seeded.product.id,
            size_id: SizeRef::Name("XXL".into()),
            quantity: 1,
        }]);
        let err = place_order(&db, user.id, req).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}

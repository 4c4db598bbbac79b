use std::collections::HashMap;

use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::Serialize;

use crate::{
    entity::{order, order_item, product, product_size, sea_orm_active_enums::OrderStatus, size},
    error::ApiError,
    state::AppState,
};

pub mod get_order;
pub mod my_orders;
pub mod process_checkout;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/process-checkout", post(process_checkout::process_checkout))
        .route("/my-orders", get(my_orders::my_orders))
        .route("/order/{order_id}", get(get_order::get_order))
}

#[derive(Debug, Serialize)]
pub struct OrderItemDetail {
    pub name: String,
    pub size: String,
    pub quantity: i32,
    /// Unit price at order time, not the live product price
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub id: i32,
    pub receiver: String,
    pub phone: String,
    pub address: String,
    pub note: Option<String>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub status_display: &'static str,
    pub created_at: String,
    pub items: Vec<OrderItemDetail>,
}

/// Serialize orders with their line items, resolving product and size names
/// in batched queries.
pub(crate) async fn load_order_details(
    db: &impl ConnectionTrait,
    orders: Vec<order::Model>,
) -> Result<Vec<OrderDetail>, ApiError> {
    if orders.is_empty() {
        return Ok(vec![]);
    }

    let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.is_in(order_ids))
        .all(db)
        .await?;

    let variant_ids: Vec<i32> = items.iter().map(|i| i.product_size_id).collect();
    let variants = if variant_ids.is_empty() {
        vec![]
    } else {
        product_size::Entity::find()
            .filter(product_size::Column::Id.is_in(variant_ids))
            .all(db)
            .await?
    };

    let product_ids: Vec<i32> = variants.iter().map(|v| v.product_id).collect();
    let products = if product_ids.is_empty() {
        vec![]
    } else {
        product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(db)
            .await?
    };
    let product_names: HashMap<i32, String> =
        products.into_iter().map(|p| (p.id, p.name)).collect();

    let sizes = size::Entity::find().all(db).await?;
    let size_names: HashMap<i32, String> = sizes.into_iter().map(|s| (s.id, s.name)).collect();

    let variant_map: HashMap<i32, &product_size::Model> =
        variants.iter().map(|v| (v.id, v)).collect();

    let mut grouped: HashMap<i32, Vec<OrderItemDetail>> = HashMap::new();
    for item in items {
        let Some(variant) = variant_map.get(&item.product_size_id) else {
            continue;
        };
        grouped.entry(item.order_id).or_default().push(OrderItemDetail {
            name: product_names
                .get(&variant.product_id)
                .cloned()
                .unwrap_or_default(),
            size: size_names
                .get(&variant.size_id)
                .cloned()
                .unwrap_or_default(),
            quantity: item.quantity,
            price: item.price,
        });
    }

    Ok(orders
        .into_iter()
        .map(|o| OrderDetail {
            id: o.id,
            receiver: o.receiver,
            phone: o.phone,
            address: o.address,
            note: o.note,
            total_amount: o.total_amount,
            status: o.status,
            status_display: o.status.label(),
            created_at: o.created_at.to_string(),
            items: grouped.remove(&o.id).unwrap_or_default(),
        })
        .collect())
}

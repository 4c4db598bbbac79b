use axum::{
    Router,
    routing::{get, patch},
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::state::AppState;

pub mod create_product;
pub mod list_products;
pub mod update_product;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_products::list_products).post(create_product::create_product),
        )
        .route("/{product_id}", patch(update_product::update_product))
}

/// Desired stock for one size of a product.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct SizeQuantity {
    pub size_id: i32,
    pub quantity: i32,
}

use axum::{Router, routing::get};

use crate::state::AppState;

pub mod list_categories;
pub mod list_products;
pub mod list_sizes;
pub mod products_by_category;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products::list_products))
        .route("/categories", get(list_categories::list_categories))
        .route(
            "/category/{category_id}",
            get(products_by_category::products_by_category),
        )
        .route("/sizes", get(list_sizes::list_sizes))
}

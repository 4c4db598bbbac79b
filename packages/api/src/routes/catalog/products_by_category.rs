use axum::{
    Json,
    extract::{Path, State},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::{
    entity::{category, product},
    error::ApiError,
    not_found,
    routes::catalog::list_products::{ProductItem, load_product_items},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct CategoryProductsResponse {
    pub category: category::Model,
    pub products: Vec<ProductItem>,
}

/// Visible products of one category.
#[tracing::instrument(name = "GET /category/{category_id}", skip(state))]
pub async fn products_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<i32>,
) -> Result<Json<CategoryProductsResponse>, ApiError> {
    let category = category::Entity::find_by_id(category_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found!("Category {} does not exist", category_id))?;

    let products = product::Entity::find()
        .filter(product::Column::CategoryId.eq(category.id))
        .filter(product::Column::Hide.eq(false))
        .order_by_asc(product::Column::Id)
        .all(&state.db)
        .await?;

    let products = load_product_items(&state.db, products).await?;

    Ok(Json(CategoryProductsResponse { category, products }))
}

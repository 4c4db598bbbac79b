use std::collections::HashSet;

use axum::{Extension, Json, extract::State};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    bad_request,
    entity::{category, product, product_size, size},
    error::ApiError,
    middleware::jwt::AppUser,
    routes::{
        admin::products::SizeQuantity,
        catalog::list_products::{ProductItem, load_product_items},
    },
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: f64,
    pub category_id: i32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub hide: bool,
    pub sizes: Vec<SizeQuantity>,
}

#[utoipa::path(
    post,
    path = "/admin/products",
    tag = "admin",
    request_body = CreateProductRequest,
    responses(
        (status = 200, description = "Product created with its size variants"),
        (status = 400, description = "Invalid name, price, category or sizes"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "POST /admin/products", skip(state, user, req))]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(req): Json<CreateProductRequest>,
) -> Result<Json<ProductItem>, ApiError> {
    user.require_staff()?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(bad_request!("Product name is required"));
    }
    if !req.price.is_finite() || req.price <= 0.0 {
        return Err(bad_request!("Price must be a positive number"));
    }
    if req.sizes.is_empty() {
        return Err(bad_request!("At least one size is required"));
    }

    let mut seen = HashSet::new();
    for entry in &req.sizes {
        if entry.quantity < 0 {
            return Err(bad_request!("Stock quantities must not be negative"));
        }
        if !seen.insert(entry.size_id) {
            return Err(bad_request!("Duplicate size {} in request", entry.size_id));
        }
    }

    if category::Entity::find_by_id(req.category_id)
        .one(&state.db)
        .await?
        .is_none()
    {
        return Err(bad_request!("Category {} not found", req.category_id));
    }

    let size_ids: Vec<i32> = req.sizes.iter().map(|s| s.size_id).collect();
    let known = size::Entity::find()
        .filter(size::Column::Id.is_in(size_ids.clone()))
        .all(&state.db)
        .await?;
    if known.len() != size_ids.len() {
        let known: HashSet<i32> = known.into_iter().map(|s| s.id).collect();
        let missing = size_ids
            .into_iter()
            .find(|id| !known.contains(id))
            .unwrap_or_default();
        return Err(bad_request!("Size {} not found", missing));
    }

    let txn = state.db.begin().await?;

    let created = product::ActiveModel {
        category_id: Set(req.category_id),
        name: Set(name),
        price: Set(req.price),
        image: Set(req.image.filter(|i| !i.trim().is_empty())),
        hide: Set(req.hide),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for entry in &req.sizes {
        product_size::ActiveModel {
            product_id: Set(created.id),
            size_id: Set(entry.size_id),
            quantity: Set(entry.quantity),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    let mut items = load_product_items(&state.db, vec![created]).await?;
    items
        .pop()
        .map(Json)
        .ok_or_else(|| ApiError::internal("Created product vanished"))
}

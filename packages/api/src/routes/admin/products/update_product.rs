use std::collections::{HashMap, HashSet};

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    bad_request,
    entity::{category, order_item, product, product_size},
    error::ApiError,
    middleware::jwt::AppUser,
    not_found,
    routes::{
        admin::products::SizeQuantity,
        catalog::list_products::{ProductItem, load_product_items},
    },
    state::AppState,
};

/// All fields optional; omitted ones are left alone. When `sizes` is present
/// it is the complete desired variant set for the product.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<i32>,
    pub image: Option<String>,
    pub hide: Option<bool>,
    pub sizes: Option<Vec<SizeQuantity>>,
}

#[utoipa::path(
    patch,
    path = "/admin/products/{product_id}",
    tag = "admin",
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product"),
        (status = 400, description = "Invalid field value"),
        (status = 404, description = "No such product"),
        (status = 409, description = "A removed size variant has order history")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "PATCH /admin/products/{product_id}", skip(state, user, req))]
pub async fn update_product(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(product_id): Path<i32>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductItem>, ApiError> {
    user.require_staff()?;

    let existing = product::Entity::find_by_id(product_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found!("Product {} not found", product_id))?;

    let name = match req.name.as_deref().map(str::trim) {
        Some("") => return Err(bad_request!("Product name must not be empty")),
        Some(name) => Some(name.to_string()),
        None => None,
    };
    if let Some(price) = req.price {
        if !price.is_finite() || price <= 0.0 {
            return Err(bad_request!("Price must be a positive number"));
        }
    }
    if let Some(category_id) = req.category_id {
        if category::Entity::find_by_id(category_id)
            .one(&state.db)
            .await?
            .is_none()
        {
            return Err(bad_request!("Category {} not found", category_id));
        }
    }
    if let Some(sizes) = &req.sizes {
        if sizes.is_empty() {
            return Err(bad_request!("At least one size is required"));
        }
        let mut seen = HashSet::new();
        for entry in sizes {
            if entry.quantity < 0 {
                return Err(bad_request!("Stock quantities must not be negative"));
            }
            if !seen.insert(entry.size_id) {
                return Err(bad_request!("Duplicate size {} in request", entry.size_id));
            }
        }
    }

    let txn = state.db.begin().await?;

    let mut active: product::ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(price) = req.price {
        active.price = Set(price);
    }
    if let Some(category_id) = req.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(image) = req.image {
        active.image = Set(Some(image).filter(|i| !i.trim().is_empty()));
    }
    if let Some(hide) = req.hide {
        active.hide = Set(hide);
    }
    let updated = active.update(&txn).await?;

    if let Some(desired) = req.sizes {
        sync_variants(&txn, product_id, &desired).await?;
    }

    txn.commit().await?;

    let mut items = load_product_items(&state.db, vec![updated]).await?;
    items
        .pop()
        .map(Json)
        .ok_or_else(|| ApiError::internal("Updated product vanished"))
}

/// Reconcile a product's variant rows with the desired set. Surviving rows
/// are updated in place so order items keep pointing at them; rows being
/// removed are refused when any order references them.
async fn sync_variants(
    txn: &sea_orm::DatabaseTransaction,
    product_id: i32,
    desired: &[SizeQuantity],
) -> Result<(), ApiError> {
    let current = product_size::Entity::find()
        .filter(product_size::Column::ProductId.eq(product_id))
        .all(txn)
        .await?;
    let mut by_size: HashMap<i32, product_size::Model> =
        current.into_iter().map(|v| (v.size_id, v)).collect();

    for entry in desired {
        match by_size.remove(&entry.size_id) {
            Some(variant) => {
                if variant.quantity != entry.quantity {
                    let mut active: product_size::ActiveModel = variant.into();
                    active.quantity = Set(entry.quantity);
                    active.update(txn).await?;
                }
            }
            None => {
                product_size::ActiveModel {
                    product_id: Set(product_id),
                    size_id: Set(entry.size_id),
                    quantity: Set(entry.quantity),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
            }
        }
    }

    // Whatever is left in the map was not in the request and goes away.
    for (_, variant) in by_size {
        let referenced = order_item::Entity::find()
            .filter(order_item::Column::ProductSizeId.eq(variant.id))
            .count(txn)
            .await?;
        if referenced > 0 {
            return Err(ApiError::conflict(format!(
                "Size variant {} has order history and cannot be removed",
                variant.id
            )));
        }
        variant.delete(txn).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sea_orm::QueryOrder;

    use super::*;
    use crate::entity::{order, sea_orm_active_enums::OrderStatus};
    use crate::test_support;

    #[tokio::test]
    async fn sync_updates_survivors_and_drops_the_rest() {
        let db = test_support::setup_db().await;
        let seeded = test_support::seed_catalog(&db).await;

        let txn = db.begin().await.unwrap();
        sync_variants(
            &txn,
            seeded.product.id,
            &[SizeQuantity {
                size_id: seeded.size_m.id,
                quantity: 42,
            }],
        )
        .await
        .unwrap();
        txn.commit().await.unwrap();

        let variants = product_size::Entity::find()
            .filter(product_size::Column::ProductId.eq(seeded.product.id))
            .order_by_asc(product_size::Column::Id)
            .all(&db)
            .await
            .unwrap();
        assert_eq!(variants.len(), 1);
        // The surviving row keeps its id, only the quantity moved.
        assert_eq!(variants[0].id, seeded.variant_m.id);
        assert_eq!(variants[0].quantity, 42);
    }

    #[tokio::test]
    async fn variants_with_order_history_cannot_be_removed() {
        let db = test_support::setup_db().await;
        let seeded = test_support::seed_catalog(&db).await;
        let user = test_support::seed_user(&db, "alice", false).await;

        let now = Utc::now().naive_utc();
        let placed = order::ActiveModel {
            user_id: Set(user.id),
            receiver: Set("Alice".into()),
            phone: Set("0123456789".into()),
            address: Set("1 Main Street".into()),
            note: Set(None),
            total_amount: Set(19.99),
            status: Set(OrderStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        order_item::ActiveModel {
            order_id: Set(placed.id),
            product_size_id: Set(seeded.variant_l.id),
            quantity: Set(1),
            price: Set(19.99),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let txn = db.begin().await.unwrap();
        let err = sync_variants(
            &txn,
            seeded.product.id,
            &[SizeQuantity {
                size_id: seeded.size_m.id,
                quantity: 10,
            }],
        )
        .await
        .unwrap_err();
        txn.rollback().await.unwrap();

        assert_eq!(err.status(), axum::http::StatusCode::CONFLICT);
        // Nothing was deleted.
        let remaining = product_size::Entity::find()
            .filter(product_size::Column::ProductId.eq(seeded.product.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(remaining, 2);
    }

    #[tokio::test]
    async fn new_sizes_are_inserted_during_sync() {
        let db = test_support::setup_db().await;
        let seeded = test_support::seed_catalog(&db).await;

        let xl = crate::entity::size::ActiveModel {
            name: Set("XL".into()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let txn = db.begin().await.unwrap();
        sync_variants(
            &txn,
            seeded.product.id,
            &[
                SizeQuantity {
                    size_id: seeded.size_m.id,
                    quantity: seeded.variant_m.quantity,
                },
                SizeQuantity {
                    size_id: seeded.size_l.id,
                    quantity: seeded.variant_l.quantity,
                },
                SizeQuantity {
                    size_id: xl.id,
                    quantity: 3,
                },
            ],
        )
        .await
        .unwrap();
        txn.commit().await.unwrap();

        let variants = product_size::Entity::find()
            .filter(product_size::Column::ProductId.eq(seeded.product.id))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(variants.len(), 3);
        let added = variants.iter().find(|v| v.size_id == xl.id).unwrap();
        assert_eq!(added.quantity, 3);
    }
}

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State},
};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
    sea_query::{Expr, Func},
};
use serde::Serialize;

use crate::{
    entity::{category, product, product_size, size},
    error::ApiError,
    routes::PageParams,
    state::AppState,
};

pub const PAGE_SIZE: u64 = 12;

/// One size variant of a product, with live stock.
#[derive(Debug, Serialize)]
pub struct SizeStock {
    pub size_id: i32,
    pub name: String,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct ProductItem {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub image: Option<String>,
    pub category_id: i32,
    pub category_name: String,
    pub sizes: Vec<SizeStock>,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<ProductItem>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

/// Attach category names and size variants to a page of products.
pub(crate) async fn load_product_items(
    db: &impl ConnectionTrait,
    products: Vec<product::Model>,
) -> Result<Vec<ProductItem>, ApiError> {
    if products.is_empty() {
        return Ok(vec![]);
    }

    let category_ids: Vec<i32> = products.iter().map(|p| p.category_id).collect();
    let categories = category::Entity::find()
        .filter(category::Column::Id.is_in(category_ids))
        .all(db)
        .await?;
    let category_map: HashMap<i32, String> =
        categories.into_iter().map(|c| (c.id, c.name)).collect();

    let product_ids: Vec<i32> = products.iter().map(|p| p.id).collect();
    let variants = product_size::Entity::find()
        .filter(product_size::Column::ProductId.is_in(product_ids))
        .all(db)
        .await?;

    let sizes = size::Entity::find().all(db).await?;
    let size_map: HashMap<i32, String> = sizes.into_iter().map(|s| (s.id, s.name)).collect();

    let mut variant_map: HashMap<i32, Vec<SizeStock>> = HashMap::new();
    for variant in variants {
        let name = match size_map.get(&variant.size_id) {
            Some(name) => name.clone(),
            None => continue,
        };
        variant_map
            .entry(variant.product_id)
            .or_default()
            .push(SizeStock {
                size_id: variant.size_id,
                name,
                quantity: variant.quantity,
            });
    }

    Ok(products
        .into_iter()
        .map(|p| ProductItem {
            id: p.id,
            name: p.name,
            price: p.price,
            image: p.image,
            category_id: p.category_id,
            category_name: category_map
                .get(&p.category_id)
                .cloned()
                .unwrap_or_default(),
            sizes: variant_map.remove(&p.id).unwrap_or_default(),
        })
        .collect())
}

/// Visible products, optionally filtered by a search string matching the
/// product name or its category name, 12 per page.
#[tracing::instrument(name = "GET /", skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<ProductsResponse>, ApiError> {
    let mut select = product::Entity::find().filter(product::Column::Hide.eq(false));

    if let Some(query) = params.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", query.to_lowercase());
        select = select
            .join(JoinType::InnerJoin, product::Relation::Category.def())
            .filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            product::Entity,
                            product::Column::Name,
                        ))))
                        .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            category::Entity,
                            category::Column::Name,
                        ))))
                        .like(pattern),
                    ),
            );
    }

    let paginator = select
        .order_by_asc(product::Column::Id)
        .paginate(&state.db, PAGE_SIZE);
    let total = paginator.num_items().await?;
    let page = params.page.unwrap_or(1).max(1);
    let products = paginator.fetch_page(page - 1).await?;

    let products = load_product_items(&state.db, products).await?;

    Ok(Json(ProductsResponse {
        products,
        total,
        page,
        page_size: PAGE_SIZE,
    }))
}

#[cfg(test)]
mod tests {
    use sea_orm::{ActiveModelTrait, Set};

    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn hidden_products_are_excluded() {
        let db = test_support::setup_db().await;
        let seeded = test_support::seed_catalog(&db).await;

        product::ActiveModel {
            category_id: Set(seeded.category.id),
            name: Set("Hidden Tee".into()),
            price: Set(10.0),
            image: Set(None),
            hide: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let select = product::Entity::find().filter(product::Column::Hide.eq(false));
        let visible = select.all(&db).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, seeded.product.id);
    }

    #[tokio::test]
    async fn product_items_carry_category_and_stock() {
        let db = test_support::setup_db().await;
        let seeded = test_support::seed_catalog(&db).await;

        let items = load_product_items(&db, vec![seeded.product.clone()])
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.category_name, seeded.category.name);
        assert_eq!(item.sizes.len(), 2);
        let m = item.sizes.iter().find(|s| s.name == "M").unwrap();
        assert_eq!(m.quantity, seeded.variant_m.quantity);
    }
}

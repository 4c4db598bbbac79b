use axum::{
    Extension, Json,
    extract::{Query, State},
};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
    sea_query::{Expr, Func},
};

use crate::{
    entity::{category, product},
    error::ApiError,
    middleware::jwt::AppUser,
    routes::{
        PageParams,
        catalog::list_products::{PAGE_SIZE, ProductsResponse, load_product_items},
    },
    state::AppState,
};

/// Same shape as the storefront listing, but hidden products are included so
/// the back office can manage them.
#[utoipa::path(
    get,
    path = "/admin/products",
    tag = "admin",
    params(
        ("search" = Option<String>, Query, description = "Match against product or category name"),
        ("page" = Option<u64>, Query, description = "1-based page number")
    ),
    responses(
        (status = 200, description = "Products including hidden ones"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "GET /admin/products", skip(state, user))]
pub async fn list_products(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(params): Query<PageParams>,
) -> Result<Json<ProductsResponse>, ApiError> {
    user.require_staff()?;

    let mut select = product::Entity::find();

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

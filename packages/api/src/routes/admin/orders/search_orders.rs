use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::{Days, NaiveDate, NaiveTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;

use crate::{
    entity::order,
    error::ApiError,
    middleware::jwt::AppUser,
    routes::order::{OrderDetail, load_order_details},
    state::AppState,
};

const DEFAULT_RANGE_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
pub struct SearchOrdersQuery {
    /// Exact order id
    pub order_id: Option<i32>,
    /// Specific day, `YYYY-MM-DD`
    pub date: Option<String>,
    /// Trailing window in days; only applies when no specific day is given
    pub date_range: Option<i64>,
}

#[derive(Debug, serde::Serialize)]
pub struct SearchOrdersResponse {
    pub success: bool,
    pub orders: Vec<OrderDetail>,
    pub count: usize,
}

#[utoipa::path(
    get,
    path = "/admin/orders/search",
    tag = "admin",
    params(
        ("order_id" = Option<i32>, Query, description = "Exact order id"),
        ("date" = Option<String>, Query, description = "Specific day, YYYY-MM-DD"),
        ("date_range" = Option<i64>, Query, description = "Trailing window in days, default 7")
    ),
    responses(
        (status = 200, description = "Matching orders with line items"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "GET /admin/orders/search", skip(state, user))]
pub async fn search_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(query): Query<SearchOrdersQuery>,
) -> Result<Json<SearchOrdersResponse>, ApiError> {
    user.require_staff()?;

    let mut select = order::Entity::find();

    if let Some(order_id) = query.order_id {
        select = select.filter(order::Column::Id.eq(order_id));
    }

    match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => {
            // An unparseable day drops the date filter entirely rather than
            // falling back to the trailing window.
            if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                let start = day.and_time(NaiveTime::MIN);
                if let Some(next) = day.checked_add_days(Days::new(1)) {
                    let end = next.and_time(NaiveTime::MIN);
                    select = select
                        .filter(order::Column::CreatedAt.gte(start))
                        .filter(order::Column::CreatedAt.lt(end));
                }
            }
        }
        None => {
            let days = query.date_range.unwrap_or(DEFAULT_RANGE_DAYS).max(0);
            let start = Utc::now().naive_utc() - chrono::Duration::days(days);
            select = select.filter(order::Column::CreatedAt.gte(start));
        }
    }

    let orders = select
        .order_by_desc(order::Column::CreatedAt)
        .all(&state.db)
        .await?;
    let orders = load_order_details(&state.db, orders).await?;
    let count = orders.len();

    Ok(Json(SearchOrdersResponse {
        success: true,
        orders,
        count,
    }))
}

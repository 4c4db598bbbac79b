use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entity::{order, sea_orm_active_enums::OrderStatus},
    error::ApiError,
    middleware::jwt::AppUser,
    state::AppState,
};

const DEFAULT_RANGE_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    pub date_range: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStats {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub confirmed_orders: u64,
    pub shipping_orders: u64,
    pub completed_orders: u64,
    pub cancelled_orders: u64,
    /// Sum of `total_amount` over completed orders only
    pub total_revenue: f64,
    pub date_range_days: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatisticsResponse {
    pub success: bool,
    pub stats: OrderStats,
}

pub(crate) async fn collect_stats(
    db: &sea_orm::DatabaseConnection,
    days: i64,
) -> Result<OrderStats, ApiError> {
    let start = Utc::now().naive_utc() - chrono::Duration::days(days);
    let in_window = order::Entity::find().filter(order::Column::CreatedAt.gte(start));

    let total_orders = in_window.clone().count(db).await?;

    let mut by_status = [0_u64; 5];
    for (slot, status) in [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipping,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ]
    .into_iter()
    .enumerate()
    {
        by_status[slot] = in_window
            .clone()
            .filter(order::Column::Status.eq(status))
            .count(db)
            .await?;
    }

    let total_revenue: Option<f64> = in_window
        .filter(order::Column::Status.eq(OrderStatus::Completed))
        .select_only()
        .column_as(order::Column::TotalAmount.sum(), "total")
        .into_tuple()
        .one(db)
        .await?
        .flatten();

    Ok(OrderStats {
        total_orders,
        pending_orders: by_status[0],
        confirmed_orders: by_status[1],
        shipping_orders: by_status[2],
        completed_orders: by_status[3],
        cancelled_orders: by_status[4],
        total_revenue: total_revenue.unwrap_or(0.0),
        date_range_days: days,
    })
}

#[utoipa::path(
    get,
    path = "/admin/orders/statistics",
    tag = "admin",
    params(
        ("date_range" = Option<i64>, Query, description = "Trailing window in days, default 7")
    ),
    responses(
        (status = 200, description = "Order statistics over the window", body = StatisticsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "GET /admin/orders/statistics", skip(state, user))]
pub async fn order_statistics(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    user.require_staff()?;

    let days = query.date_range.unwrap_or(DEFAULT_RANGE_DAYS).max(0);
    let stats = collect_stats(&state.db, days).await?;

    Ok(Json(StatisticsResponse {
        success: true,
        stats,
    }))
}

#[cfg(test)]
mod tests {
    use sea_orm::{ActiveModelTrait, Set};

    use super::*;
    use crate::test_support;

    async fn insert_order(
        db: &sea_orm::DatabaseConnection,
        user_id: i32,
        status: OrderStatus,
        amount: f64,
        age_days: i64,
    ) {
        let at = Utc::now().naive_utc() - chrono::Duration::days(age_days);
        order::ActiveModel {
            user_id: Set(user_id),
            receiver: Set("Alice".into()),
            phone: Set("0123456789".into()),
            address: Set("1 Main Street".into()),
            note: Set(None),
            total_amount: Set(amount),
            status: Set(status),
            created_at: Set(at),
            updated_at: Set(at),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn revenue_counts_only_completed_orders_in_the_window() {
        let db = test_support::setup_db().await;
        let user = test_support::seed_user(&db, "alice", false).await;

        insert_order(&db, user.id, OrderStatus::Completed, 100.0, 1).await;
        insert_order(&db, user.id, OrderStatus::Completed, 50.0, 2).await;
        insert_order(&db, user.id, OrderStatus::Pending, 999.0, 1).await;
        insert_order(&db, user.id, OrderStatus::Cancelled, 999.0, 1).await;
        // Outside the 7-day window entirely.
        insert_order(&db, user.id, OrderStatus::Completed, 777.0, 30).await;

        let stats = collect_stats(&db, 7).await.unwrap();
        assert_eq!(stats.total_orders, 4);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.completed_orders, 2);
        assert_eq!(stats.cancelled_orders, 1);
        assert_eq!(stats.total_revenue, 150.0);
        assert_eq!(stats.date_range_days, 7);
    }

    #[tokio::test]
    async fn empty_windows_report_zero_revenue() {
        let db = test_support::setup_db().await;
        let stats = collect_stats(&db, 7).await.unwrap();
        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.total_revenue, 0.0);
    }
}

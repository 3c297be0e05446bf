use crate::{
    db::DbPool,
    dto::analytics::{
        AnalyticsQuery, RevenuePoint, RevenueSeries, SalesSummary, StatusBreakdown, StatusCount,
        TopProduct, TopProducts,
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
};

fn window_days(query: &AnalyticsQuery) -> i32 {
    query.days.unwrap_or(30).clamp(1, 365) as i32
}

pub async fn sales_summary(
    pool: &DbPool,
    user: &AuthUser,
    query: AnalyticsQuery,
) -> AppResult<ApiResponse<SalesSummary>> {
    ensure_admin(user)?;
    let days = window_days(&query);

    let (orders_count, pending_count): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COUNT(*) FILTER (WHERE status = 'pending')
        FROM orders
        WHERE created_at >= now() - make_interval(days => $1::int)
        "#,
    )
    .bind(days)
    .fetch_one(pool)
    .await?;

    let (captured_revenue,): (Option<i64>,) = sqlx::query_as(
        r#"
        SELECT SUM(amount)::bigint
        FROM payments
        WHERE status = 'captured'
          AND created_at >= now() - make_interval(days => $1::int)
        "#,
    )
    .bind(days)
    .fetch_one(pool)
    .await?;
    let captured_revenue = captured_revenue.unwrap_or(0);

    let average_order_value = if orders_count > 0 {
        let (total,): (Option<i64>,) = sqlx::query_as(
            r#"
            SELECT SUM(total_amount)::bigint
            FROM orders
            WHERE created_at >= now() - make_interval(days => $1::int)
            "#,
        )
        .bind(days)
        .fetch_one(pool)
        .await?;
        total.unwrap_or(0) / orders_count
    } else {
        0
    };

    Ok(ApiResponse::success(
        "Sales summary",
        SalesSummary {
            orders_count,
            pending_count,
            captured_revenue,
            average_order_value,
        },
        Some(Meta::empty()),
    ))
}

/// Captured revenue and order counts bucketed per day over the window.
pub async fn revenue_by_day(
    pool: &DbPool,
    user: &AuthUser,
    query: AnalyticsQuery,
) -> AppResult<ApiResponse<RevenueSeries>> {
    ensure_admin(user)?;
    let days = window_days(&query);

    let items = sqlx::query_as::<_, RevenuePoint>(
        r#"
        SELECT DATE(p.created_at) AS day,
               COALESCE(SUM(p.amount), 0)::bigint AS revenue,
               COUNT(DISTINCT p.order_id) AS orders_count
        FROM payments p
        WHERE p.status = 'captured'
          AND p.created_at >= now() - make_interval(days => $1::int)
        GROUP BY DATE(p.created_at)
        ORDER BY day
        "#,
    )
    .bind(days)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "Revenue by day",
        RevenueSeries { items },
        Some(Meta::empty()),
    ))
}

pub async fn top_products(
    pool: &DbPool,
    user: &AuthUser,
    query: AnalyticsQuery,
) -> AppResult<ApiResponse<TopProducts>> {
    ensure_admin(user)?;
    let days = window_days(&query);

    let items = sqlx::query_as::<_, TopProduct>(
        r#"
        SELECT oi.product_id,
               oi.title,
               SUM(oi.quantity)::bigint AS total_quantity,
               SUM(oi.quantity * oi.price)::bigint AS total_revenue
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        WHERE o.created_at >= now() - make_interval(days => $1::int)
          AND o.status <> 'cancelled'
        GROUP BY oi.product_id, oi.title
        ORDER BY total_quantity DESC
        LIMIT 10
        "#,
    )
    .bind(days)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "Top products",
        TopProducts { items },
        Some(Meta::empty()),
    ))
}

pub async fn order_status_breakdown(
    pool: &DbPool,
    user: &AuthUser,
    query: AnalyticsQuery,
) -> AppResult<ApiResponse<StatusBreakdown>> {
    ensure_admin(user)?;
    let days = window_days(&query);

    let items = sqlx::query_as::<_, StatusCount>(
        r#"
        SELECT status, COUNT(*) AS count
        FROM orders
        WHERE created_at >= now() - make_interval(days => $1::int)
        GROUP BY status
        ORDER BY count DESC
        "#,
    )
    .bind(days)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "Order status breakdown",
        StatusBreakdown { items },
        Some(Meta::empty()),
    ))
}

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::analytics::{
        AnalyticsQuery, RevenueSeries, SalesSummary, StatusBreakdown, TopProducts,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::analytics_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(sales_summary))
        .route("/revenue", get(revenue_by_day))
        .route("/top-products", get(top_products))
        .route("/status-breakdown", get(order_status_breakdown))
}

#[utoipa::path(
    get,
    path = "/api/analytics/summary",
    params(
        ("days" = Option<i64>, Query, description = "Window in days, default 30")
    ),
    responses(
        (status = 200, description = "Sales summary", body = ApiResponse<SalesSummary>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
pub async fn sales_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<ApiResponse<SalesSummary>>> {
    let resp = analytics_service::sales_summary(&state.pool, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/analytics/revenue",
    params(
        ("days" = Option<i64>, Query, description = "Window in days, default 30")
    ),
    responses(
        (status = 200, description = "Captured revenue per day", body = ApiResponse<RevenueSeries>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
pub async fn revenue_by_day(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<ApiResponse<RevenueSeries>>> {
    let resp = analytics_service::revenue_by_day(&state.pool, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/analytics/top-products",
    params(
        ("days" = Option<i64>, Query, description = "Window in days, default 30")
    ),
    responses(
        (status = 200, description = "Best sellers by quantity", body = ApiResponse<TopProducts>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
pub async fn top_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<ApiResponse<TopProducts>>> {
    let resp = analytics_service::top_products(&state.pool, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/analytics/status-breakdown",
    params(
        ("days" = Option<i64>, Query, description = "Window in days, default 30")
    ),
    responses(
        (status = 200, description = "Order counts per status", body = ApiResponse<StatusBreakdown>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
pub async fn order_status_breakdown(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<ApiResponse<StatusBreakdown>>> {
    let resp = analytics_service::order_status_breakdown(&state.pool, &user, query).await?;
    Ok(Json(resp))
}

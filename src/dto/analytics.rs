use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyticsQuery {
    /// Window size in days, default 30.
    pub days: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesSummary {
    pub orders_count: i64,
    pub pending_count: i64,
    /// Sum of captured payment amounts, minor units.
    pub captured_revenue: i64,
    pub average_order_value: i64,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct RevenuePoint {
    pub day: NaiveDate,
    pub revenue: i64,
    pub orders_count: i64,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub title: String,
    pub total_quantity: i64,
    pub total_revenue: i64,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RevenueSeries {
    pub items: Vec<RevenuePoint>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopProducts {
    pub items: Vec<TopProduct>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusBreakdown {
    pub items: Vec<StatusCount>,
}

use axum::{Json, Router, extract::State, routing::get};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    audit,
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::Currency,
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertCurrencyRequest {
    pub code: String,
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_rate")]
    pub rate_to_base: f64,
    #[serde(default)]
    pub is_default: bool,
}

fn default_rate() -> f64 {
    1.0
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct CurrencyList {
    pub items: Vec<Currency>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_currencies).put(upsert_currency))
}

#[utoipa::path(
    get,
    path = "/api/currencies",
    responses(
        (status = 200, description = "List currencies", body = ApiResponse<CurrencyList>)
    ),
    tag = "Currencies"
)]
pub async fn list_currencies(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CurrencyList>>> {
    let items = sqlx::query_as::<_, Currency>(
        "SELECT * FROM currencies ORDER BY is_default DESC, code",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(
        "Currencies",
        CurrencyList { items },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    put,
    path = "/api/currencies",
    request_body = UpsertCurrencyRequest,
    responses(
        (status = 200, description = "Currency upserted", body = ApiResponse<Currency>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Currencies"
)]
pub async fn upsert_currency(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpsertCurrencyRequest>,
) -> AppResult<Json<ApiResponse<Currency>>> {
    ensure_admin(&user)?;

    let mut txn = state.pool.begin().await?;

    // Only one currency can be the default.
    if payload.is_default {
        sqlx::query("UPDATE currencies SET is_default = FALSE WHERE code <> $1")
            .bind(&payload.code)
            .execute(&mut *txn)
            .await?;
    }

    let currency = sqlx::query_as::<_, Currency>(
        r#"
        INSERT INTO currencies (code, name, symbol, rate_to_base, is_default)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (code) DO UPDATE
        SET name = EXCLUDED.name, symbol = EXCLUDED.symbol,
            rate_to_base = EXCLUDED.rate_to_base, is_default = EXCLUDED.is_default
        RETURNING *
        "#,
    )
    .bind(&payload.code)
    .bind(&payload.name)
    .bind(&payload.symbol)
    .bind(payload.rate_to_base)
    .bind(payload.is_default)
    .fetch_one(&mut *txn)
    .await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "currency_upsert",
        Some("currencies"),
        Some(serde_json::json!({ "code": currency.code })),
    )
    .await;

    Ok(Json(ApiResponse::success(
        "Currency saved",
        currency,
        Some(Meta::empty()),
    )))
}

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::payments::{
        CreatePaymentRequest, PaymentCheckout, PaymentFailureRequest, VerifyPaymentRequest,
    },
    error::AppResult,
    models::Payment,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/verify", post(verify_payment))
        .route("/{id}/failed", post(record_failure))
}

#[utoipa::path(
    post,
    path = "/api/payments/checkout",
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "Provider order created", body = ApiResponse<PaymentCheckout>),
        (status = 400, description = "Order is not pending"),
        (status = 404, description = "Order not found"),
        (status = 502, description = "Provider error"),
    ),
    tag = "Payments"
)]
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<Json<ApiResponse<PaymentCheckout>>> {
    let resp = payment_service::create_checkout(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payments/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Signature verified, payment captured", body = ApiResponse<Payment>),
        (status = 400, description = "Signature mismatch; payment marked failed"),
        (status = 404, description = "No payment for that provider order"),
    ),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    let resp = payment_service::verify_payment(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payments/{id}/failed",
    params(
        ("id" = Uuid, Path, description = "Payment ID")
    ),
    request_body = PaymentFailureRequest,
    responses(
        (status = 200, description = "Failure recorded", body = ApiResponse<Payment>),
        (status = 404, description = "Payment not found"),
    ),
    tag = "Payments"
)]
pub async fn record_failure(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaymentFailureRequest>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    let resp = payment_service::record_failure(&state, id, payload).await?;
    Ok(Json(resp))
}

use uuid::Uuid;

use crate::{
    audit,
    dto::payments::{
        CreatePaymentRequest, PaymentCheckout, PaymentFailureRequest, PaymentList,
        VerifyPaymentRequest,
    },
    error::{AppError, AppResult},
    models::{Order, Payment},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Create a provider order for an existing pending order and record the
/// attempt as a `created` payment row. The storefront opens the provider
/// checkout with what this returns.
pub async fn create_checkout(
    state: &AppState,
    payload: CreatePaymentRequest,
) -> AppResult<ApiResponse<PaymentCheckout>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(payload.order_id)
        .fetch_optional(&state.pool)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if order.status != "pending" {
        return Err(AppError::BadRequest(format!(
            "order is {}, expected pending",
            order.status
        )));
    }

    let receipt = format!("order_{}", order.id.simple());
    let provider_order = state
        .razorpay
        .create_order(order.total_amount, &payload.currency, &receipt)
        .await?;

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (id, order_id, provider_order_id, amount, currency, status)
        VALUES ($1, $2, $3, $4, $5, 'created')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(order.id)
    .bind(&provider_order.id)
    .bind(order.total_amount)
    .bind(&payload.currency)
    .fetch_one(&state.pool)
    .await?;

    audit::record(
        &state.pool,
        None,
        "payment_checkout_create",
        Some("payments"),
        Some(serde_json::json!({
            "order_id": order.id,
            "payment_id": payment.id,
            "provider_order_id": provider_order.id,
        })),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkout created",
        PaymentCheckout {
            payment_id: payment.id,
            provider_order_id: payment.provider_order_id,
            amount: payment.amount,
            currency: payment.currency,
            key_id: state.razorpay.key_id().to_string(),
        },
        Some(Meta::empty()),
    ))
}

/// Verify the signature the storefront got back from the provider.
/// On success the payment becomes `captured` and the order moves to
/// `processing`; a bad signature marks the payment `failed` and is a 400.
pub async fn verify_payment(
    state: &AppState,
    payload: VerifyPaymentRequest,
) -> AppResult<ApiResponse<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE provider_order_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(&payload.razorpay_order_id)
    .fetch_optional(&state.pool)
    .await?;
    let payment = match payment {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    if payment.status == "captured" {
        return Err(AppError::BadRequest("payment already captured".into()));
    }

    let valid = state.razorpay.verify_signature(
        &payload.razorpay_order_id,
        &payload.razorpay_payment_id,
        &payload.razorpay_signature,
    );

    if !valid {
        sqlx::query(
            r#"
            UPDATE payments
            SET status = 'failed', provider_payment_id = $2,
                error_code = 'SIGNATURE_MISMATCH',
                error_description = 'checkout signature did not verify',
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(payment.id)
        .bind(&payload.razorpay_payment_id)
        .execute(&state.pool)
        .await?;

        audit::record(
            &state.pool,
            None,
            "payment_verify_failed",
            Some("payments"),
            Some(serde_json::json!({ "payment_id": payment.id })),
        )
        .await;

        return Err(AppError::BadRequest("invalid payment signature".into()));
    }

    let mut txn = state.pool.begin().await?;

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        UPDATE payments
        SET status = 'captured', provider_payment_id = $2, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(payment.id)
    .bind(&payload.razorpay_payment_id)
    .fetch_one(&mut *txn)
    .await?;

    sqlx::query("UPDATE orders SET status = 'processing', updated_at = now() WHERE id = $1")
        .bind(payment.order_id)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        None,
        "payment_captured",
        Some("payments"),
        Some(serde_json::json!({
            "payment_id": payment.id,
            "order_id": payment.order_id,
        })),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment verified",
        payment,
        Some(Meta::empty()),
    ))
}

/// Record a client-reported provider failure as a terminal `failed` status.
pub async fn record_failure(
    state: &AppState,
    id: Uuid,
    payload: PaymentFailureRequest,
) -> AppResult<ApiResponse<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(
        r#"
        UPDATE payments
        SET status = 'failed', error_code = $2, error_description = $3, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&payload.error_code)
    .bind(&payload.error_description)
    .fetch_optional(&state.pool)
    .await?;
    let payment = match payment {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    audit::record(
        &state.pool,
        None,
        "payment_failed",
        Some("payments"),
        Some(serde_json::json!({
            "payment_id": payment.id,
            "error_code": payment.error_code,
        })),
    )
    .await;

    Ok(ApiResponse::success(
        "Failure recorded",
        payment,
        Some(Meta::empty()),
    ))
}

/// All payment attempts for one order, oldest first.
pub async fn list_for_order(state: &AppState, order_id: Uuid) -> AppResult<ApiResponse<PaymentList>> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound);
    }

    let items = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE order_id = $1 ORDER BY created_at",
    )
    .bind(order_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Payments",
        PaymentList { items },
        Some(Meta::empty()),
    ))
}

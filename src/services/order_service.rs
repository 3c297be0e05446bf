use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::orders::{
        CreateOrderRequest, OrderDetail, OrderList, OrderWithItems, UpdateOrderStatusRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{ORDER_STATUSES, Order, OrderItem, Payment, Product, ProductVariant},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
};

/// Storefront checkout: reprice every line from the catalog inside one
/// transaction, snapshot titles and unit prices, and decrement stock.
pub async fn create_order(
    pool: &DbPool,
    user: Option<&AuthUser>,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("order has no items".into()));
    }
    if payload.customer_email.trim().is_empty() {
        return Err(AppError::BadRequest("customer_email is required".into()));
    }

    let mut txn = pool.begin().await?;

    let mut lines: Vec<(Product, i64, i32)> = Vec::new();
    for item in &payload.items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest("quantity must be greater than 0".into()));
        }

        let product =
            sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
                .bind(item.product_id)
                .fetch_optional(&mut *txn)
                .await?;
        let product = match product {
            Some(p) => p,
            None => {
                return Err(AppError::BadRequest(format!(
                    "product {} not found",
                    item.product_id
                )));
            }
        };

        if product.stock < item.quantity {
            return Err(AppError::BadRequest(format!(
                "insufficient stock for product {}",
                product.id
            )));
        }

        // Variant may override the unit price; the product discount applies
        // either way.
        let base_price = match item.variant_id {
            Some(variant_id) => {
                let variant = sqlx::query_as::<_, ProductVariant>(
                    "SELECT * FROM product_variants WHERE id = $1 AND product_id = $2",
                )
                .bind(variant_id)
                .bind(product.id)
                .fetch_optional(&mut *txn)
                .await?;
                match variant {
                    Some(v) => v.price.unwrap_or(product.price),
                    None => {
                        return Err(AppError::BadRequest(format!(
                            "variant {variant_id} not found for product {}",
                            product.id
                        )));
                    }
                }
            }
            None => product.price,
        };

        let unit_price = discounted(base_price, product.discount);
        lines.push((product, unit_price, item.quantity));
    }

    let total_amount: i64 = lines
        .iter()
        .map(|(_, unit_price, quantity)| unit_price * (*quantity as i64))
        .sum();

    let order = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders
            (id, user_id, customer_name, customer_email, shipping_address,
             total_amount, status)
        VALUES ($1, $2, $3, $4, $5, $6, 'pending')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.map(|u| u.user_id))
    .bind(&payload.customer_name)
    .bind(&payload.customer_email)
    .bind(&payload.shipping_address)
    .bind(total_amount)
    .fetch_one(&mut *txn)
    .await?;

    let mut items = Vec::new();
    for (product, unit_price, quantity) in &lines {
        let item = sqlx::query_as::<_, OrderItem>(
            r#"
            INSERT INTO order_items (id, order_id, product_id, title, quantity, price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order.id)
        .bind(product.id)
        .bind(&product.title)
        .bind(quantity)
        .bind(unit_price)
        .fetch_one(&mut *txn)
        .await?;
        items.push(item);

        sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1")
            .bind(product.id)
            .bind(quantity)
            .execute(&mut *txn)
            .await?;
    }

    txn.commit().await?;

    audit::record(
        pool,
        user.map(|u| u.user_id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": total_amount })),
    )
    .await;

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

fn discounted(price: i64, discount_percent: i32) -> i64 {
    let discount = i64::from(discount_percent.clamp(0, 100));
    price * (100 - discount) / 100
}

pub async fn list_orders(
    pool: &DbPool,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let status = query.status.as_deref().filter(|s| !s.is_empty());
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let sql = format!(
        "SELECT * FROM orders WHERE ($1::text IS NULL OR status = $1) \
         ORDER BY created_at {} LIMIT $2 OFFSET $3",
        sort_order.as_sql()
    );
    let items = sqlx::query_as::<_, Order>(&sql)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let total: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR status = $1)")
            .bind(status)
            .fetch_one(pool)
            .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(meta),
    ))
}

pub async fn get_order(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_admin(user)?;

    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at",
    )
    .bind(order.id)
    .fetch_all(pool)
    .await?;

    let payments = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE order_id = $1 ORDER BY created_at",
    )
    .bind(order.id)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "Order",
        OrderDetail {
            order,
            items,
            payments,
        },
        Some(Meta::empty()),
    ))
}

/// Admin-driven status change: any status from the allowed set can be set at
/// any time, there is no transition table.
pub async fn update_order_status(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    if !ORDER_STATUSES.contains(&payload.status.as_str()) {
        return Err(AppError::BadRequest(format!(
            "unknown status '{}'",
            payload.status
        )));
    }

    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&payload.status)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    audit::record(
        pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id, "status": payload.status })),
    )
    .await;

    Ok(ApiResponse::success(
        "Status updated",
        order,
        Some(Meta::empty()),
    ))
}

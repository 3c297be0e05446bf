use axum_storefront_api::{
    config::AppConfig,
    db::{DbPool, create_pool},
    dto::collections::{CollectionProductsRequest, CreateCollectionRequest, UpdateCollectionRequest},
    dto::orders::{CheckoutItem, CreateOrderRequest, UpdateOrderStatusRequest},
    dto::payments::PaymentFailureRequest,
    dto::products::CreateProductRequest,
    error::AppError,
    middleware::auth::AuthUser,
    services::{collection_service, order_service, payment_service, product_service},
    state::AppState,
};
use uuid::Uuid;

// Integration flow over the collection hierarchy: build a three-level tree,
// attach products, and verify upward propagation, roll-up counts, the
// full-update diff, cascading removal, and the cycle guard. Finishes with a
// checkout and a recorded payment failure.
#[tokio::test]
async fn collection_tree_and_order_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;
    let pool = &state.pool;

    let admin = AuthUser {
        user_id: Uuid::new_v4(),
        role: "admin".into(),
    };

    // Electronics -> Phones -> Smartphones
    let electronics = create_collection(pool, &admin, "Electronics", "electronics", None).await?;
    let phones = create_collection(pool, &admin, "Phones", "phones", Some(electronics)).await?;
    let smartphones =
        create_collection(pool, &admin, "Smartphones", "smartphones", Some(phones)).await?;

    let phone_a = create_product(pool, &admin, "Phone A", "phone-a", 100_000, 10).await?;
    let phone_b = create_product(pool, &admin, "Phone B", "phone-b", 200_000, 5).await?;

    // Adding to the deepest collection must propagate membership to every
    // ancestor.
    collection_service::update_collection_products(
        pool,
        &admin,
        smartphones,
        CollectionProductsRequest {
            product_ids: vec![phone_a, phone_b],
            full_update: false,
            remove_from_parents: false,
        },
    )
    .await?;

    for collection in [smartphones, phones, electronics] {
        assert!(is_member(pool, phone_a, collection).await?);
        assert!(is_member(pool, phone_b, collection).await?);
    }

    // Counts roll up: the root totals everything below even though nothing is
    // attached to it directly beyond the propagated rows.
    let tree = collection_service::collection_tree(pool).await?;
    let tree = tree.data.expect("tree data");
    let root = tree
        .items
        .iter()
        .find(|n| n.collection.id == electronics)
        .expect("root node");
    assert_eq!(root.products_count, 2);
    assert_eq!(root.total_products_count, 6);
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].children[0].total_products_count, 2);

    // Full update: phone_b disappears from the target but stays in ancestors.
    collection_service::update_collection_products(
        pool,
        &admin,
        smartphones,
        CollectionProductsRequest {
            product_ids: vec![phone_a],
            full_update: true,
            remove_from_parents: false,
        },
    )
    .await?;
    assert!(!is_member(pool, phone_b, smartphones).await?);
    assert!(is_member(pool, phone_b, phones).await?);
    assert!(is_member(pool, phone_b, electronics).await?);

    // Cascading removal clears the whole ancestor chain.
    collection_service::remove_collection_product(pool, &admin, smartphones, phone_a, true)
        .await?;
    for collection in [smartphones, phones, electronics] {
        assert!(!is_member(pool, phone_a, collection).await?);
    }

    // Reparenting the root under its own grandchild must be rejected.
    let result = collection_service::update_collection(
        pool,
        &admin,
        electronics,
        UpdateCollectionRequest {
            name: None,
            slug: None,
            description: None,
            parent_id: Some(Some(smartphones)),
            collection_type: None,
            is_active: None,
            is_featured: None,
            image_url: None,
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    // Reparenting Smartphones directly under Electronics shifts its level.
    collection_service::update_collection(
        pool,
        &admin,
        smartphones,
        UpdateCollectionRequest {
            name: None,
            slug: None,
            description: None,
            parent_id: Some(Some(electronics)),
            collection_type: None,
            is_active: None,
            is_featured: None,
            image_url: None,
        },
    )
    .await?;
    let moved = collection_service::get_collection(pool, smartphones).await?;
    assert_eq!(moved.data.expect("collection").level, 1);

    // Storefront checkout reprices server-side and decrements stock.
    let order_resp = order_service::create_order(
        pool,
        None,
        CreateOrderRequest {
            customer_name: "Test Customer".into(),
            customer_email: "customer@example.com".into(),
            shipping_address: "1 Test Lane".into(),
            items: vec![CheckoutItem {
                product_id: phone_a,
                variant_id: None,
                quantity: 2,
            }],
        },
    )
    .await?;
    let order = order_resp.data.expect("order data").order;
    assert_eq!(order.total_amount, 200_000);
    assert_eq!(order.status, "pending");

    let (stock,): (i32,) = sqlx::query_as("SELECT stock FROM products WHERE id = $1")
        .bind(phone_a)
        .fetch_one(pool)
        .await?;
    assert_eq!(stock, 8);

    // Admin can move the order to any allowed status.
    let updated = order_service::update_order_status(
        pool,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "completed".into(),
        },
    )
    .await?;
    assert_eq!(updated.data.expect("order").status, "completed");

    // A failed provider attempt ends as a terminal failed payment.
    let payment_id = insert_payment(pool, order.id, order.total_amount).await?;
    let failed = payment_service::record_failure(
        &state,
        payment_id,
        PaymentFailureRequest {
            error_code: Some("BAD_CARD".into()),
            error_description: Some("card declined".into()),
        },
    )
    .await?;
    assert_eq!(failed.data.expect("payment").status, "failed");

    let attempts = payment_service::list_for_order(&state, order.id).await?;
    assert_eq!(attempts.data.expect("payments").items.len(), 1);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Clean tables between runs
    sqlx::query(
        "TRUNCATE TABLE payments, order_items, orders, product_collections, product_images, \
         product_variants, mega_menu_items, products, collections, currencies, audit_logs, users \
         RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        upload_dir: "uploads".into(),
        razorpay_key_id: String::new(),
        razorpay_key_secret: String::new(),
    };

    Ok(AppState::new(pool, config))
}

async fn create_collection(
    pool: &DbPool,
    admin: &AuthUser,
    name: &str,
    slug: &str,
    parent_id: Option<Uuid>,
) -> anyhow::Result<Uuid> {
    let resp = collection_service::create_collection(
        pool,
        admin,
        CreateCollectionRequest {
            name: name.into(),
            slug: slug.into(),
            description: None,
            parent_id,
            collection_type: "category".into(),
            is_active: true,
            is_featured: false,
            image_url: None,
        },
    )
    .await?;
    Ok(resp.data.expect("collection data").id)
}

async fn create_product(
    pool: &DbPool,
    admin: &AuthUser,
    title: &str,
    slug: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let resp = product_service::create_product(
        pool,
        admin,
        CreateProductRequest {
            title: title.into(),
            slug: slug.into(),
            description: None,
            price,
            brand: String::new(),
            category: String::new(),
            stock,
            is_new: false,
            is_sale: false,
            is_featured: false,
            discount: 0,
            images: Vec::new(),
            variants: Vec::new(),
        },
    )
    .await?;
    Ok(resp.data.expect("product data").product.id)
}

async fn is_member(pool: &DbPool, product_id: Uuid, collection_id: Uuid) -> anyhow::Result<bool> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT product_id FROM product_collections WHERE product_id = $1 AND collection_id = $2",
    )
    .bind(product_id)
    .bind(collection_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

async fn insert_payment(pool: &DbPool, order_id: Uuid, amount: i64) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO payments (id, order_id, provider_order_id, amount, currency, status)
        VALUES ($1, $2, $3, $4, 'INR', 'created')
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(format!("order_test_{}", order_id.simple()))
    .bind(amount)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::products::{
        CreateProductRequest, ImageInput, ProductCollections, ProductDetail, ProductList,
        UpdateProductRequest, VariantInput,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Product, ProductImage, ProductVariant},
    response::{ApiResponse, Meta},
    routes::params::{FilterQuery, ProductQuery, ProductSortBy, SortOrder},
};

pub async fn list_products(
    pool: &DbPool,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM products WHERE 1=1");
    push_search_filters(&mut qb, query.q.as_deref(), query.min_price, query.max_price);

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    qb.push(" ORDER BY ")
        .push(sort_by.as_sql())
        .push(" ")
        .push(sort_order.as_sql());
    qb.push(" LIMIT ").push_bind(limit);
    qb.push(" OFFSET ").push_bind(offset);

    let items = qb.build_query_as::<Product>().fetch_all(pool).await?;

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE 1=1");
    push_search_filters(
        &mut count_qb,
        query.q.as_deref(),
        query.min_price,
        query.max_price,
    );
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

fn push_search_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    q: Option<&str>,
    min_price: Option<i64>,
    max_price: Option<i64>,
) {
    if let Some(q) = q.filter(|s| !s.is_empty()) {
        let pattern = format!("%{q}%");
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(min_price) = min_price {
        qb.push(" AND price >= ").push_bind(min_price);
    }
    if let Some(max_price) = max_price {
        qb.push(" AND price <= ").push_bind(max_price);
    }
}

/// Storefront filter listing. One predicate builder feeds both the page query
/// and the count query, so the two can never disagree.
pub async fn filter_products(
    pool: &DbPool,
    query: FilterQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut qb = QueryBuilder::<Postgres>::new("SELECT products.* FROM products WHERE 1=1");
    push_filter_predicates(&mut qb, &query);

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    qb.push(" ORDER BY ")
        .push(sort_by.as_sql())
        .push(" ")
        .push(sort_order.as_sql());
    qb.push(" LIMIT ").push_bind(limit);
    qb.push(" OFFSET ").push_bind(offset);

    let items = qb.build_query_as::<Product>().fetch_all(pool).await?;

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE 1=1");
    push_filter_predicates(&mut count_qb, &query);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

/// The shared WHERE clause for the filter endpoint.
///
/// Category matching is deliberately fuzzy, mirroring storefront behavior:
/// the product's own category field, the name of any directly-linked
/// collection, or the name of such a collection's parent — each compared
/// case-insensitively, collections also by prefix.
fn push_filter_predicates(qb: &mut QueryBuilder<'_, Postgres>, query: &FilterQuery) {
    push_search_filters(qb, query.q.as_deref(), query.min_price, query.max_price);

    if let Some(category) = query.category.as_deref().filter(|s| !s.is_empty()) {
        let prefix = format!("{category}%");
        qb.push(" AND (LOWER(products.category) = LOWER(")
            .push_bind(category.to_string())
            .push(")");
        qb.push(
            r#" OR EXISTS (
                SELECT 1 FROM product_collections pc
                JOIN collections linked ON linked.id = pc.collection_id
                WHERE pc.product_id = products.id
                  AND (LOWER(linked.name) = LOWER("#,
        )
        .push_bind(category.to_string())
        .push(") OR linked.name ILIKE ")
        .push_bind(prefix.clone())
        .push("))");
        qb.push(
            r#" OR EXISTS (
                SELECT 1 FROM product_collections pc
                JOIN collections linked ON linked.id = pc.collection_id
                JOIN collections parent ON parent.id = linked.parent_id
                WHERE pc.product_id = products.id
                  AND (LOWER(parent.name) = LOWER("#,
        )
        .push_bind(category.to_string())
        .push(") OR parent.name ILIKE ")
        .push_bind(prefix)
        .push("))");
        qb.push(")");
    }

    if let Some(brands) = query.brands.as_deref().filter(|s| !s.is_empty()) {
        let brands: Vec<String> = brands
            .split(',')
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();
        if !brands.is_empty() {
            qb.push(" AND products.brand = ANY(").push_bind(brands).push(")");
        }
    }

    if let Some(color) = query.color.as_deref().filter(|s| !s.is_empty()) {
        qb.push(
            r#" AND EXISTS (
                SELECT 1 FROM product_variants pv
                WHERE pv.product_id = products.id AND LOWER(pv.color) = LOWER("#,
        )
        .push_bind(color.to_string())
        .push("))");
    }

    if let Some(is_new) = query.is_new {
        qb.push(" AND products.is_new = ").push_bind(is_new);
    }
    if let Some(is_sale) = query.is_sale {
        qb.push(" AND products.is_sale = ").push_bind(is_sale);
    }
    if let Some(is_featured) = query.is_featured {
        qb.push(" AND products.is_featured = ").push_bind(is_featured);
    }
}

pub async fn get_product(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    let detail = load_detail(pool, product).await?;
    Ok(ApiResponse::success("Product", detail, None))
}

pub async fn get_product_by_slug(
    pool: &DbPool,
    slug: &str,
) -> AppResult<ApiResponse<ProductDetail>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    let detail = load_detail(pool, product).await?;
    Ok(ApiResponse::success("Product", detail, None))
}

async fn load_detail(pool: &DbPool, product: Product) -> AppResult<ProductDetail> {
    let images = sqlx::query_as::<_, ProductImage>(
        "SELECT * FROM product_images WHERE product_id = $1 ORDER BY position",
    )
    .bind(product.id)
    .fetch_all(pool)
    .await?;

    let variants = sqlx::query_as::<_, ProductVariant>(
        "SELECT * FROM product_variants WHERE product_id = $1 ORDER BY id",
    )
    .bind(product.id)
    .fetch_all(pool)
    .await?;

    Ok(ProductDetail {
        product,
        images,
        variants,
    })
}

pub async fn create_product(
    pool: &DbPool,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductDetail>> {
    ensure_admin(user)?;

    let mut txn = pool.begin().await?;

    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products
            (id, title, slug, description, price, brand, category, stock,
             is_new, is_sale, is_featured, discount)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.title)
    .bind(payload.slug)
    .bind(payload.description)
    .bind(payload.price)
    .bind(payload.brand)
    .bind(payload.category)
    .bind(payload.stock)
    .bind(payload.is_new)
    .bind(payload.is_sale)
    .bind(payload.is_featured)
    .bind(payload.discount)
    .fetch_one(&mut *txn)
    .await?;

    insert_images(&mut txn, product.id, &payload.images).await?;
    insert_variants(&mut txn, product.id, &payload.variants).await?;

    txn.commit().await?;

    audit::record(
        pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    let detail = load_detail(pool, product).await?;
    Ok(ApiResponse::success(
        "Product created",
        detail,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<ProductDetail>> {
    ensure_admin(user)?;

    let mut txn = pool.begin().await?;

    let existing = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *txn)
        .await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET title = $2, slug = $3, description = $4, price = $5, brand = $6,
            category = $7, stock = $8, is_new = $9, is_sale = $10,
            is_featured = $11, discount = $12, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.title.unwrap_or(existing.title))
    .bind(payload.slug.unwrap_or(existing.slug))
    .bind(payload.description.or(existing.description))
    .bind(payload.price.unwrap_or(existing.price))
    .bind(payload.brand.unwrap_or(existing.brand))
    .bind(payload.category.unwrap_or(existing.category))
    .bind(payload.stock.unwrap_or(existing.stock))
    .bind(payload.is_new.unwrap_or(existing.is_new))
    .bind(payload.is_sale.unwrap_or(existing.is_sale))
    .bind(payload.is_featured.unwrap_or(existing.is_featured))
    .bind(payload.discount.unwrap_or(existing.discount))
    .fetch_one(&mut *txn)
    .await?;

    // Owned sets are replaced wholesale when the payload carries them.
    if let Some(images) = &payload.images {
        sqlx::query("DELETE FROM product_images WHERE product_id = $1")
            .bind(id)
            .execute(&mut *txn)
            .await?;
        insert_images(&mut txn, id, images).await?;
    }
    if let Some(variants) = &payload.variants {
        sqlx::query("DELETE FROM product_variants WHERE product_id = $1")
            .bind(id)
            .execute(&mut *txn)
            .await?;
        insert_variants(&mut txn, id, variants).await?;
    }

    txn.commit().await?;

    audit::record(
        pool,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await;

    let detail = load_detail(pool, product).await?;
    Ok(ApiResponse::success("Updated", detail, Some(Meta::empty())))
}

pub async fn delete_product(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        pool,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Ids of every collection a product is directly attached to.
pub async fn list_product_collections(
    pool: &DbPool,
    id: Uuid,
) -> AppResult<ApiResponse<ProductCollections>> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound);
    }

    let rows: Vec<(Uuid,)> =
        sqlx::query_as("SELECT collection_id FROM product_collections WHERE product_id = $1")
            .bind(id)
            .fetch_all(pool)
            .await?;

    Ok(ApiResponse::success(
        "Product collections",
        ProductCollections {
            product_id: id,
            collection_ids: rows.into_iter().map(|(c,)| c).collect(),
        },
        Some(Meta::empty()),
    ))
}

async fn insert_images(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product_id: Uuid,
    images: &[ImageInput],
) -> Result<(), sqlx::Error> {
    for image in images {
        sqlx::query(
            r#"
            INSERT INTO product_images (id, product_id, url, alt_text, position)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(&image.url)
        .bind(&image.alt_text)
        .bind(image.position)
        .execute(&mut **txn)
        .await?;
    }
    Ok(())
}

async fn insert_variants(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product_id: Uuid,
    variants: &[VariantInput],
) -> Result<(), sqlx::Error> {
    for variant in variants {
        sqlx::query(
            r#"
            INSERT INTO product_variants (id, product_id, size, color, price, image_url, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(&variant.size)
        .bind(&variant.color)
        .bind(variant.price)
        .bind(&variant.image_url)
        .bind(variant.stock)
        .execute(&mut **txn)
        .await?;
    }
    Ok(())
}

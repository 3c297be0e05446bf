use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::collections::{
        CollectionList, CollectionProductsRequest, CollectionTree, CreateCollectionRequest,
        MembershipChange, UpdateCollectionRequest,
    },
    dto::products::ProductList,
    error::{AppError, AppResult},
    hierarchy,
    middleware::auth::{AuthUser, ensure_admin},
    models::{COLLECTION_TYPES, Collection, Product},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
};

pub async fn list_collections(
    pool: &DbPool,
    pagination: Pagination,
) -> AppResult<ApiResponse<CollectionList>> {
    let (page, limit, offset) = pagination.normalize();
    let items = sqlx::query_as::<_, Collection>(
        "SELECT * FROM collections ORDER BY level, name LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM collections")
        .fetch_one(pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Collections",
        CollectionList { items },
        Some(meta),
    ))
}

/// The nested collection forest with per-node direct and rolled-up product
/// counts.
pub async fn collection_tree(pool: &DbPool) -> AppResult<ApiResponse<CollectionTree>> {
    let rows = sqlx::query_as::<_, Collection>("SELECT * FROM collections ORDER BY name")
        .fetch_all(pool)
        .await?;

    let counts: Vec<(Uuid, i64)> = sqlx::query_as(
        "SELECT collection_id, COUNT(*) FROM product_collections GROUP BY collection_id",
    )
    .fetch_all(pool)
    .await?;
    let direct_counts: HashMap<Uuid, i64> = counts.into_iter().collect();

    let items = hierarchy::build_collection_tree(&rows, &direct_counts);
    Ok(ApiResponse::success(
        "Collection tree",
        CollectionTree { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_collection(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<Collection>> {
    let collection = sqlx::query_as::<_, Collection>("SELECT * FROM collections WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let collection = match collection {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Collection", collection, None))
}

pub async fn get_collection_by_slug(
    pool: &DbPool,
    slug: &str,
) -> AppResult<ApiResponse<Collection>> {
    let collection = sqlx::query_as::<_, Collection>("SELECT * FROM collections WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    let collection = match collection {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Collection", collection, None))
}

pub async fn create_collection(
    pool: &DbPool,
    user: &AuthUser,
    payload: CreateCollectionRequest,
) -> AppResult<ApiResponse<Collection>> {
    ensure_admin(user)?;

    if !COLLECTION_TYPES.contains(&payload.collection_type.as_str()) {
        return Err(AppError::BadRequest(format!(
            "unknown collection_type '{}'",
            payload.collection_type
        )));
    }

    let level = match payload.parent_id {
        Some(parent_id) => {
            let parent: Option<(i32,)> =
                sqlx::query_as("SELECT level FROM collections WHERE id = $1")
                    .bind(parent_id)
                    .fetch_optional(pool)
                    .await?;
            match parent {
                Some((parent_level,)) => parent_level + 1,
                None => return Err(AppError::BadRequest("parent collection not found".into())),
            }
        }
        None => 0,
    };

    let collection = sqlx::query_as::<_, Collection>(
        r#"
        INSERT INTO collections
            (id, name, slug, description, parent_id, collection_type, level,
             is_active, is_featured, image_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.name)
    .bind(payload.slug)
    .bind(payload.description)
    .bind(payload.parent_id)
    .bind(payload.collection_type)
    .bind(level)
    .bind(payload.is_active)
    .bind(payload.is_featured)
    .bind(payload.image_url)
    .fetch_one(pool)
    .await?;

    audit::record(
        pool,
        Some(user.user_id),
        "collection_create",
        Some("collections"),
        Some(serde_json::json!({ "collection_id": collection.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Collection created",
        collection,
        Some(Meta::empty()),
    ))
}

pub async fn update_collection(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCollectionRequest,
) -> AppResult<ApiResponse<Collection>> {
    ensure_admin(user)?;

    let mut txn = pool.begin().await?;

    let existing = sqlx::query_as::<_, Collection>("SELECT * FROM collections WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *txn)
        .await?;
    let existing = match existing {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    if let Some(collection_type) = payload.collection_type.as_deref() {
        if !COLLECTION_TYPES.contains(&collection_type) {
            return Err(AppError::BadRequest(format!(
                "unknown collection_type '{collection_type}'"
            )));
        }
    }

    // Reparenting changes this node's level; the whole subtree shifts by the
    // same delta so the level invariant keeps holding.
    let (parent_id, new_level) = match payload.parent_id {
        None => (existing.parent_id, existing.level),
        Some(None) => (None, 0),
        Some(Some(new_parent)) => {
            let parents = parent_map(&mut txn).await?;
            if hierarchy::would_create_cycle(&parents, id, new_parent) {
                return Err(AppError::BadRequest(
                    "cannot move a collection under its own descendant".into(),
                ));
            }
            let parent_level: Option<(i32,)> =
                sqlx::query_as("SELECT level FROM collections WHERE id = $1")
                    .bind(new_parent)
                    .fetch_optional(&mut *txn)
                    .await?;
            match parent_level {
                Some((level,)) => (Some(new_parent), level + 1),
                None => return Err(AppError::BadRequest("parent collection not found".into())),
            }
        }
    };

    let collection = sqlx::query_as::<_, Collection>(
        r#"
        UPDATE collections
        SET name = $2, slug = $3, description = $4, parent_id = $5,
            collection_type = $6, level = $7, is_active = $8, is_featured = $9,
            image_url = $10, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.name.unwrap_or(existing.name))
    .bind(payload.slug.unwrap_or(existing.slug))
    .bind(payload.description.or(existing.description))
    .bind(parent_id)
    .bind(payload.collection_type.unwrap_or(existing.collection_type))
    .bind(new_level)
    .bind(payload.is_active.unwrap_or(existing.is_active))
    .bind(payload.is_featured.unwrap_or(existing.is_featured))
    .bind(payload.image_url.or(existing.image_url))
    .fetch_one(&mut *txn)
    .await?;

    let delta = new_level - existing.level;
    if delta != 0 {
        let parents = parent_map(&mut txn).await?;
        let descendants = hierarchy::descendant_ids(&parents, id);
        if !descendants.is_empty() {
            sqlx::query("UPDATE collections SET level = level + $1 WHERE id = ANY($2)")
                .bind(delta)
                .bind(&descendants)
                .execute(&mut *txn)
                .await?;
        }
    }

    txn.commit().await?;

    audit::record(
        pool,
        Some(user.user_id),
        "collection_update",
        Some("collections"),
        Some(serde_json::json!({ "collection_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        collection,
        Some(Meta::empty()),
    ))
}

/// Delete a collection. Children are re-parented onto the deleted node's
/// parent and every orphaned subtree moves up one level.
pub async fn delete_collection(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let mut txn = pool.begin().await?;

    let existing = sqlx::query_as::<_, Collection>("SELECT * FROM collections WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *txn)
        .await?;
    let existing = match existing {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    let parents = parent_map(&mut txn).await?;
    let descendants = hierarchy::descendant_ids(&parents, id);

    sqlx::query("UPDATE collections SET parent_id = $2 WHERE parent_id = $1")
        .bind(id)
        .bind(existing.parent_id)
        .execute(&mut *txn)
        .await?;

    if !descendants.is_empty() {
        sqlx::query("UPDATE collections SET level = level - 1 WHERE id = ANY($1)")
            .bind(&descendants)
            .execute(&mut *txn)
            .await?;
    }

    sqlx::query("DELETE FROM collections WHERE id = $1")
        .bind(id)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    audit::record(
        pool,
        Some(user.user_id),
        "collection_delete",
        Some("collections"),
        Some(serde_json::json!({ "collection_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Products directly attached to a collection, paginated.
pub async fn list_collection_products(
    pool: &DbPool,
    id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM collections WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound);
    }

    let (page, limit, offset) = pagination.normalize();
    let items = sqlx::query_as::<_, Product>(
        r#"
        SELECT p.*
        FROM product_collections pc
        JOIN products p ON p.id = pc.product_id
        WHERE pc.collection_id = $1
        ORDER BY p.title
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM product_collections WHERE collection_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Collection products",
        ProductList { items },
        Some(meta),
    ))
}

/// Add products to a collection, or with `full_update` reconcile the
/// collection's direct membership against the submitted set. Additions always
/// propagate to every ancestor collection; removals touch ancestors only when
/// `remove_from_parents` is set.
pub async fn update_collection_products(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: CollectionProductsRequest,
) -> AppResult<ApiResponse<MembershipChange>> {
    ensure_admin(user)?;

    let mut txn = pool.begin().await?;

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM collections WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *txn)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound);
    }

    let desired: HashSet<Uuid> = payload.product_ids.iter().copied().collect();

    let known: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = ANY($1)")
        .bind(&payload.product_ids)
        .fetch_all(&mut *txn)
        .await?;
    if known.len() != desired.len() {
        let known: HashSet<Uuid> = known.into_iter().map(|(id,)| id).collect();
        let missing: Vec<Uuid> = desired.difference(&known).copied().collect();
        return Err(AppError::BadRequest(format!(
            "unknown product ids: {missing:?}"
        )));
    }

    let parents = parent_map(&mut txn).await?;
    let ancestors = hierarchy::ancestor_chain(&parents, id);

    let current: Vec<(Uuid,)> =
        sqlx::query_as("SELECT product_id FROM product_collections WHERE collection_id = $1")
            .bind(id)
            .fetch_all(&mut *txn)
            .await?;
    let current: HashSet<Uuid> = current.into_iter().map(|(p,)| p).collect();

    // The whole submitted list goes through the conflict-skipping insert:
    // products already attached are no-ops on the target but still repair any
    // ancestor collection missing them.
    let added = insert_memberships(&mut txn, id, &ancestors, &payload.product_ids).await?;

    let mut removed = 0_i64;
    if payload.full_update {
        let removals: Vec<Uuid> = current.difference(&desired).copied().collect();
        if !removals.is_empty() {
            let result = sqlx::query(
                "DELETE FROM product_collections WHERE collection_id = $1 AND product_id = ANY($2)",
            )
            .bind(id)
            .bind(&removals)
            .execute(&mut *txn)
            .await?;
            removed = result.rows_affected() as i64;

            if payload.remove_from_parents && !ancestors.is_empty() {
                sqlx::query(
                    "DELETE FROM product_collections WHERE collection_id = ANY($1) AND product_id = ANY($2)",
                )
                .bind(&ancestors)
                .bind(&removals)
                .execute(&mut *txn)
                .await?;
            }
        }
    }

    txn.commit().await?;

    audit::record(
        pool,
        Some(user.user_id),
        "collection_products_update",
        Some("product_collections"),
        Some(serde_json::json!({
            "collection_id": id,
            "added": added,
            "removed": removed,
            "full_update": payload.full_update,
        })),
    )
    .await;

    Ok(ApiResponse::success(
        "Membership updated",
        MembershipChange {
            collection_id: id,
            added,
            removed,
        },
        Some(Meta::empty()),
    ))
}

/// Remove one product from a collection. With `remove_from_parents`, the
/// membership is also deleted from every ancestor reachable at removal time.
/// Without it, ancestor memberships stay — there is deliberately no downward
/// re-validation.
pub async fn remove_collection_product(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    product_id: Uuid,
    remove_from_parents: bool,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let mut txn = pool.begin().await?;

    let result = sqlx::query(
        "DELETE FROM product_collections WHERE collection_id = $1 AND product_id = $2",
    )
    .bind(id)
    .bind(product_id)
    .execute(&mut *txn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if remove_from_parents {
        let parents = parent_map(&mut txn).await?;
        let ancestors = hierarchy::ancestor_chain(&parents, id);
        if !ancestors.is_empty() {
            sqlx::query(
                "DELETE FROM product_collections WHERE collection_id = ANY($1) AND product_id = $2",
            )
            .bind(&ancestors)
            .bind(product_id)
            .execute(&mut *txn)
            .await?;
        }
    }

    txn.commit().await?;

    audit::record(
        pool,
        Some(user.user_id),
        "collection_product_remove",
        Some("product_collections"),
        Some(serde_json::json!({
            "collection_id": id,
            "product_id": product_id,
            "remove_from_parents": remove_from_parents,
        })),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Insert membership rows for the target collection and all its ancestors,
/// skipping pairs that already exist. Returns the number of rows added to the
/// target collection itself.
async fn insert_memberships(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    collection_id: Uuid,
    ancestors: &[Uuid],
    product_ids: &[Uuid],
) -> Result<i64, sqlx::Error> {
    if product_ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        r#"
        INSERT INTO product_collections (product_id, collection_id)
        SELECT pid, $2 FROM UNNEST($1::uuid[]) AS pid
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(product_ids)
    .bind(collection_id)
    .execute(&mut **txn)
    .await?;

    for ancestor in ancestors {
        sqlx::query(
            r#"
            INSERT INTO product_collections (product_id, collection_id)
            SELECT pid, $2 FROM UNNEST($1::uuid[]) AS pid
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(product_ids)
        .bind(ancestor)
        .execute(&mut **txn)
        .await?;
    }

    Ok(result.rows_affected() as i64)
}

async fn parent_map(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
) -> Result<HashMap<Uuid, Option<Uuid>>, sqlx::Error> {
    let rows: Vec<(Uuid, Option<Uuid>)> =
        sqlx::query_as("SELECT id, parent_id FROM collections")
            .fetch_all(&mut **txn)
            .await?;
    Ok(rows.into_iter().collect())
}

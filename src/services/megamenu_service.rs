use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::megamenu::{
        CreateMenuItemRequest, MenuItemList, MenuTree, ReorderMenuRequest, UpdateMenuItemRequest,
    },
    error::{AppError, AppResult},
    hierarchy::{self, MenuRow},
    middleware::auth::{AuthUser, ensure_admin},
    models::MegaMenuItem,
    response::{ApiResponse, Meta},
};

const MENU_ROW_SELECT: &str = r#"
    SELECT m.id, m.collection_id, m.parent_menu_item_id, m.position, m.level,
           m.is_active, m.is_featured, m.display_subcollections,
           c.name AS collection_name, c.slug AS collection_slug, c.collection_type
    FROM mega_menu_items m
    JOIN collections c ON c.id = m.collection_id
"#;

/// The storefront navigation tree: active entries only, children ordered by
/// position, featured brands flattened per top-level node.
pub async fn menu_tree(pool: &DbPool) -> AppResult<ApiResponse<MenuTree>> {
    let rows = sqlx::query_as::<_, MenuRow>(&format!(
        "{MENU_ROW_SELECT} WHERE m.is_active AND c.is_active ORDER BY m.position"
    ))
    .fetch_all(pool)
    .await?;

    let items = hierarchy::build_menu_tree(&rows);
    Ok(ApiResponse::success(
        "Mega menu",
        MenuTree { items },
        Some(Meta::empty()),
    ))
}

/// Flat admin listing, inactive entries included.
pub async fn list_menu_items(pool: &DbPool) -> AppResult<ApiResponse<MenuItemList>> {
    let items = sqlx::query_as::<_, MegaMenuItem>(
        "SELECT * FROM mega_menu_items ORDER BY level, position",
    )
    .fetch_all(pool)
    .await?;
    Ok(ApiResponse::success(
        "Menu items",
        MenuItemList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_menu_item(
    pool: &DbPool,
    user: &AuthUser,
    payload: CreateMenuItemRequest,
) -> AppResult<ApiResponse<MegaMenuItem>> {
    ensure_admin(user)?;

    let mut txn = pool.begin().await?;

    let collection: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM collections WHERE id = $1")
        .bind(payload.collection_id)
        .fetch_optional(&mut *txn)
        .await?;
    if collection.is_none() {
        return Err(AppError::BadRequest("collection not found".into()));
    }

    let level = match payload.parent_menu_item_id {
        Some(parent_id) => {
            let parent: Option<(i32,)> =
                sqlx::query_as("SELECT level FROM mega_menu_items WHERE id = $1")
                    .bind(parent_id)
                    .fetch_optional(&mut *txn)
                    .await?;
            match parent {
                Some((parent_level,)) => parent_level + 1,
                None => return Err(AppError::BadRequest("parent menu item not found".into())),
            }
        }
        None => 0,
    };

    let item = sqlx::query_as::<_, MegaMenuItem>(
        r#"
        INSERT INTO mega_menu_items
            (id, collection_id, parent_menu_item_id, position, level,
             is_active, is_featured, display_subcollections)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.collection_id)
    .bind(payload.parent_menu_item_id)
    .bind(payload.position)
    .bind(level)
    .bind(payload.is_active)
    .bind(payload.is_featured)
    .bind(payload.display_subcollections)
    .fetch_one(&mut *txn)
    .await?;

    // A parent that just gained a subcollection starts displaying them.
    if let Some(parent_id) = payload.parent_menu_item_id {
        sqlx::query("UPDATE mega_menu_items SET display_subcollections = TRUE WHERE id = $1")
            .bind(parent_id)
            .execute(&mut *txn)
            .await?;
    }

    txn.commit().await?;

    audit::record(
        pool,
        Some(user.user_id),
        "megamenu_create",
        Some("mega_menu_items"),
        Some(serde_json::json!({ "menu_item_id": item.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Menu item created",
        item,
        Some(Meta::empty()),
    ))
}

pub async fn update_menu_item(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateMenuItemRequest,
) -> AppResult<ApiResponse<MegaMenuItem>> {
    ensure_admin(user)?;

    let mut txn = pool.begin().await?;

    let existing = sqlx::query_as::<_, MegaMenuItem>("SELECT * FROM mega_menu_items WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *txn)
        .await?;
    let existing = match existing {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };

    let (parent_id, new_level) = match payload.parent_menu_item_id {
        None => (existing.parent_menu_item_id, existing.level),
        Some(None) => (None, 0),
        Some(Some(new_parent)) => {
            let parents = menu_parent_map(&mut txn).await?;
            if hierarchy::would_create_cycle(&parents, id, new_parent) {
                return Err(AppError::BadRequest(
                    "cannot move a menu item under its own descendant".into(),
                ));
            }
            let parent: Option<(i32,)> =
                sqlx::query_as("SELECT level FROM mega_menu_items WHERE id = $1")
                    .bind(new_parent)
                    .fetch_optional(&mut *txn)
                    .await?;
            match parent {
                Some((level,)) => (Some(new_parent), level + 1),
                None => return Err(AppError::BadRequest("parent menu item not found".into())),
            }
        }
    };

    let item = sqlx::query_as::<_, MegaMenuItem>(
        r#"
        UPDATE mega_menu_items
        SET parent_menu_item_id = $2, position = $3, level = $4, is_active = $5,
            is_featured = $6, display_subcollections = $7
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(parent_id)
    .bind(payload.position.unwrap_or(existing.position))
    .bind(new_level)
    .bind(payload.is_active.unwrap_or(existing.is_active))
    .bind(payload.is_featured.unwrap_or(existing.is_featured))
    .bind(
        payload
            .display_subcollections
            .unwrap_or(existing.display_subcollections),
    )
    .fetch_one(&mut *txn)
    .await?;

    let delta = new_level - existing.level;
    if delta != 0 {
        let parents = menu_parent_map(&mut txn).await?;
        let descendants = hierarchy::descendant_ids(&parents, id);
        if !descendants.is_empty() {
            sqlx::query("UPDATE mega_menu_items SET level = level + $1 WHERE id = ANY($2)")
                .bind(delta)
                .bind(&descendants)
                .execute(&mut *txn)
                .await?;
        }
    }

    if let Some(Some(new_parent)) = payload.parent_menu_item_id {
        sqlx::query("UPDATE mega_menu_items SET display_subcollections = TRUE WHERE id = $1")
            .bind(new_parent)
            .execute(&mut *txn)
            .await?;
    }

    txn.commit().await?;

    audit::record(
        pool,
        Some(user.user_id),
        "megamenu_update",
        Some("mega_menu_items"),
        Some(serde_json::json!({ "menu_item_id": id })),
    )
    .await;

    Ok(ApiResponse::success("Updated", item, Some(Meta::empty())))
}

/// Delete an entry; the database cascades over the whole menu subtree.
pub async fn delete_menu_item(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let result = sqlx::query("DELETE FROM mega_menu_items WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        pool,
        Some(user.user_id),
        "megamenu_delete",
        Some("mega_menu_items"),
        Some(serde_json::json!({ "menu_item_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Apply a batch of `(id, position)` pairs in one transaction.
pub async fn reorder_menu(
    pool: &DbPool,
    user: &AuthUser,
    payload: ReorderMenuRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let mut txn = pool.begin().await?;
    for entry in &payload.items {
        let result = sqlx::query("UPDATE mega_menu_items SET position = $2 WHERE id = $1")
            .bind(entry.id)
            .bind(entry.position)
            .execute(&mut *txn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::BadRequest(format!(
                "unknown menu item {}",
                entry.id
            )));
        }
    }
    txn.commit().await?;

    audit::record(
        pool,
        Some(user.user_id),
        "megamenu_reorder",
        Some("mega_menu_items"),
        Some(serde_json::json!({ "count": payload.items.len() })),
    )
    .await;

    Ok(ApiResponse::success(
        "Reordered",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn menu_parent_map(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
) -> Result<HashMap<Uuid, Option<Uuid>>, sqlx::Error> {
    let rows: Vec<(Uuid, Option<Uuid>)> =
        sqlx::query_as("SELECT id, parent_menu_item_id FROM mega_menu_items")
            .fetch_all(&mut **txn)
            .await?;
    Ok(rows.into_iter().collect())
}

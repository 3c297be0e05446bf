use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::megamenu::{
        CreateMenuItemRequest, MenuItemList, MenuTree, ReorderMenuRequest, UpdateMenuItemRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::MegaMenuItem,
    response::ApiResponse,
    services::megamenu_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_menu_items).post(create_menu_item))
        .route("/tree", get(menu_tree))
        .route("/reorder", put(reorder_menu))
        .route(
            "/{id}",
            axum::routing::patch(update_menu_item).delete(delete_menu_item),
        )
}

#[utoipa::path(
    get,
    path = "/api/megamenu/tree",
    responses(
        (status = 200, description = "Navigation tree with flattened featured brands", body = ApiResponse<MenuTree>)
    ),
    tag = "Mega menu"
)]
pub async fn menu_tree(State(state): State<AppState>) -> AppResult<Json<ApiResponse<MenuTree>>> {
    let resp = megamenu_service::menu_tree(&state.pool).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/megamenu",
    responses(
        (status = 200, description = "Flat list of menu entries", body = ApiResponse<MenuItemList>)
    ),
    tag = "Mega menu"
)]
pub async fn list_menu_items(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<MenuItemList>>> {
    let resp = megamenu_service::list_menu_items(&state.pool).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/megamenu",
    request_body = CreateMenuItemRequest,
    responses(
        (status = 201, description = "Menu item created; parent starts displaying subcollections", body = ApiResponse<MegaMenuItem>),
        (status = 400, description = "Unknown collection or parent"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Mega menu"
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateMenuItemRequest>,
) -> AppResult<Json<ApiResponse<MegaMenuItem>>> {
    let resp = megamenu_service::create_menu_item(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/megamenu/{id}",
    params(
        ("id" = Uuid, Path, description = "Menu item ID")
    ),
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Updated menu item", body = ApiResponse<MegaMenuItem>),
        (status = 400, description = "Circular parent reference"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Menu item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Mega menu"
)]
pub async fn update_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMenuItemRequest>,
) -> AppResult<Json<ApiResponse<MegaMenuItem>>> {
    let resp = megamenu_service::update_menu_item(&state.pool, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/megamenu/{id}",
    params(
        ("id" = Uuid, Path, description = "Menu item ID")
    ),
    responses(
        (status = 200, description = "Deleted with its whole subtree"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Menu item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Mega menu"
)]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = megamenu_service::delete_menu_item(&state.pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/megamenu/reorder",
    request_body = ReorderMenuRequest,
    responses(
        (status = 200, description = "Positions applied in one transaction"),
        (status = 400, description = "Unknown menu item id"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Mega menu"
)]
pub async fn reorder_menu(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ReorderMenuRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = megamenu_service::reorder_menu(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

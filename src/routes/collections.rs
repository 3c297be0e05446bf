use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::collections::{
        CollectionList, CollectionProductsRequest, CollectionTree, CreateCollectionRequest,
        MembershipChange, RemoveProductParams, UpdateCollectionRequest,
    },
    dto::products::ProductList,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Collection,
    response::ApiResponse,
    routes::params::Pagination,
    services::collection_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_collections).post(create_collection))
        .route("/tree", get(collection_tree))
        .route("/slug/{slug}", get(get_collection_by_slug))
        .route(
            "/{id}",
            get(get_collection)
                .put(update_collection)
                .delete(delete_collection),
        )
        .route(
            "/{id}/products",
            get(list_collection_products).post(update_collection_products),
        )
        .route("/{id}/products/{product_id}", axum::routing::delete(remove_collection_product))
}

#[utoipa::path(
    get,
    path = "/api/collections",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "List collections", body = ApiResponse<CollectionList>)
    ),
    tag = "Collections"
)]
pub async fn list_collections(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CollectionList>>> {
    let resp = collection_service::list_collections(&state.pool, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/collections/tree",
    responses(
        (status = 200, description = "Nested collection tree with rolled-up product counts", body = ApiResponse<CollectionTree>)
    ),
    tag = "Collections"
)]
pub async fn collection_tree(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CollectionTree>>> {
    let resp = collection_service::collection_tree(&state.pool).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/collections/{id}",
    params(
        ("id" = Uuid, Path, description = "Collection ID")
    ),
    responses(
        (status = 200, description = "Get collection", body = ApiResponse<Collection>),
        (status = 404, description = "Collection not found"),
    ),
    tag = "Collections"
)]
pub async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Collection>>> {
    let resp = collection_service::get_collection(&state.pool, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/collections/slug/{slug}",
    params(
        ("slug" = String, Path, description = "Collection slug")
    ),
    responses(
        (status = 200, description = "Get collection by slug", body = ApiResponse<Collection>),
        (status = 404, description = "Collection not found"),
    ),
    tag = "Collections"
)]
pub async fn get_collection_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<Collection>>> {
    let resp = collection_service::get_collection_by_slug(&state.pool, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/collections",
    request_body = CreateCollectionRequest,
    responses(
        (status = 201, description = "Create collection", body = ApiResponse<Collection>),
        (status = 400, description = "Invalid parent or type"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn create_collection(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCollectionRequest>,
) -> AppResult<Json<ApiResponse<Collection>>> {
    let resp = collection_service::create_collection(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/collections/{id}",
    params(
        ("id" = Uuid, Path, description = "Collection ID")
    ),
    request_body = UpdateCollectionRequest,
    responses(
        (status = 200, description = "Updated collection", body = ApiResponse<Collection>),
        (status = 400, description = "Circular parent reference"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Collection not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn update_collection(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCollectionRequest>,
) -> AppResult<Json<ApiResponse<Collection>>> {
    let resp = collection_service::update_collection(&state.pool, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/collections/{id}",
    params(
        ("id" = Uuid, Path, description = "Collection ID")
    ),
    responses(
        (status = 200, description = "Deleted; children re-parented one level up"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Collection not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn delete_collection(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = collection_service::delete_collection(&state.pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/collections/{id}/products",
    params(
        ("id" = Uuid, Path, description = "Collection ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Products directly attached to the collection", body = ApiResponse<ProductList>),
        (status = 404, description = "Collection not found"),
    ),
    tag = "Collections"
)]
pub async fn list_collection_products(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = collection_service::list_collection_products(&state.pool, id, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/collections/{id}/products",
    params(
        ("id" = Uuid, Path, description = "Collection ID")
    ),
    request_body = CollectionProductsRequest,
    responses(
        (status = 200, description = "Membership updated; additions propagate to ancestors", body = ApiResponse<MembershipChange>),
        (status = 400, description = "Unknown product ids"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Collection not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn update_collection_products(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CollectionProductsRequest>,
) -> AppResult<Json<ApiResponse<MembershipChange>>> {
    let resp =
        collection_service::update_collection_products(&state.pool, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/collections/{id}/products/{product_id}",
    params(
        ("id" = Uuid, Path, description = "Collection ID"),
        ("product_id" = Uuid, Path, description = "Product ID"),
        ("remove_from_parents" = Option<bool>, Query, description = "Also remove from every ancestor collection"),
    ),
    responses(
        (status = 200, description = "Membership removed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Membership not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn remove_collection_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
    Query(params): Query<RemoveProductParams>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = collection_service::remove_collection_product(
        &state.pool,
        &user,
        id,
        product_id,
        params.remove_from_parents,
    )
    .await?;
    Ok(Json(resp))
}

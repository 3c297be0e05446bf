use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::post,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    audit,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    state::AppState,
};

const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

const UPLOAD_KINDS: &[&str] = &["product-images", "collection-images"];

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{kind}", post(upload_image))
}

#[utoipa::path(
    post,
    path = "/api/uploads/{kind}",
    params(
        ("kind" = String, Path, description = "product-images or collection-images")
    ),
    responses(
        (status = 200, description = "File stored, public URL returned", body = ApiResponse<UploadResponse>),
        (status = 400, description = "Missing file or unsupported extension"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Uploads"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path(kind): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadResponse>>> {
    ensure_admin(&user)?;

    if !UPLOAD_KINDS.contains(&kind.as_str()) {
        return Err(AppError::BadRequest(format!("unknown upload kind '{kind}'")));
    }

    let mut file_data: Option<Vec<u8>> = None;
    let mut original_filename: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("multipart error: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        if name.as_deref() == Some("file") || name.as_deref() == Some("") {
            original_filename = field.file_name().map(|s| s.to_string());
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("multipart error: {e}")))?
                    .to_vec(),
            );
        }
    }

    let data = file_data.ok_or_else(|| AppError::BadRequest("missing 'file' field".into()))?;
    if data.is_empty() {
        return Err(AppError::BadRequest("empty file".into()));
    }

    let extension = original_filename
        .as_deref()
        .and_then(|f| f.rsplit('.').next())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::BadRequest(format!(
            "unsupported file extension '{extension}'"
        )));
    }

    let filename = format!("{}.{extension}", Uuid::new_v4().simple());
    let dir = std::path::Path::new(&state.config.upload_dir).join(&kind);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    tokio::fs::write(dir.join(&filename), &data)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "image_upload",
        Some("uploads"),
        Some(serde_json::json!({ "kind": kind, "filename": filename })),
    )
    .await;

    Ok(Json(ApiResponse::success(
        "Uploaded",
        UploadResponse {
            url: format!("/uploads/{kind}/{filename}"),
            filename,
        },
        Some(Meta::empty()),
    )))
}

use anyhow::anyhow;
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use collegium_core::{ApiResponse, AppError};
use collegium_models::ImageRef;
use tracing::instrument;

use crate::middleware::auth::AdminUser;
use crate::modules::uploads::service::UploadService;
use crate::state::AppState;

/// Field name of the multipart part carrying the image.
const IMAGE_FIELD: &str = "image";

/// Upload an image and get back the `{url, public_id}` to reference it by
#[utoipa::path(
    post,
    path = "/api/uploads/{folder}",
    params(("folder" = String, Path, description = "Upload category, e.g. events")),
    request_body(content_type = "multipart/form-data", description = "Multipart form with an `image` part"),
    responses(
        (status = 201, description = "Image uploaded", body = ApiResponse<ImageRef>),
        (status = 400, description = "Missing, oversized or unsupported image"),
        (status = 403, description = "Forbidden"),
        (status = 502, description = "Image provider error")
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(folder): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ImageRef>>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(anyhow!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(anyhow!("Failed to read image: {}", e)))?;

        let image = UploadService::upload_image(
            state.image_storage.as_ref(),
            &state.storage_config,
            &folder,
            &file_name,
            &bytes,
            &content_type,
        )
        .await?;
        return Ok((
            StatusCode::CREATED,
            Json(ApiResponse::with_message("Image uploaded successfully", image)),
        ));
    }

    Err(AppError::bad_request(anyhow!("No image file provided")))
}

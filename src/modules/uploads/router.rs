use axum::{Router, extract::DefaultBodyLimit, routing::post};

use crate::state::AppState;

use super::controller::upload_image;
use super::service::MAX_UPLOAD_BYTES;

pub fn init_uploads_router() -> Router<AppState> {
    Router::new()
        .route("/{folder}", post(upload_image))
        // room for multipart framing around the largest accepted image
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
}

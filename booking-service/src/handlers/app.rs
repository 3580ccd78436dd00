use axum::{http::Uri, Json};
use service_core::error::AppError;

use crate::models::MessageResponse;

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Hello World"))
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(anyhow::anyhow!("No route for {}", uri.path()))
}

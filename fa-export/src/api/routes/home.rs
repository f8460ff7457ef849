use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::api::error::ApiError;
use crate::api::request::document;
use crate::format::{self, ResponseFormat};

/// Liveness marker kept for clients that probe the root.
pub async fn home() -> Response {
    match format::render_json(&json!({ "test": "hello world" })) {
        Ok(body) => document(ResponseFormat::Json, body),
        Err(_) => ApiError::internal().into_response(),
    }
}

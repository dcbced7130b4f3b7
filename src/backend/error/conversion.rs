/**
 * Error Conversion
 *
 * `ApiError` implements `IntoResponse` so handlers can return it directly.
 *
 * # Response Format
 *
 * Validation errors are returned as the field map itself:
 * ```json
 * { "password": ["This password is too common."] }
 * ```
 *
 * Every other error is returned as:
 * ```json
 * { "error": "Error message", "status": 500 }
 * ```
 */

use axum::response::{IntoResponse, Json, Response};

use crate::backend::error::types::ApiError;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Request failed with {}: {}", status, self);
        }

        match self {
            ApiError::Validation(errors) => (status, Json(errors)).into_response(),
            other => {
                let body = serde_json::json!({
                    "error": other.public_message(),
                    "status": status.as_u16(),
                });
                (status, Json(body)).into_response()
            }
        }
    }
}

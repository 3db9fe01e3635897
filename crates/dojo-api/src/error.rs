use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dojo_messaging::MessagingError;
use serde_json::json;
use tracing::error;

/// Response mapping for core errors. The body always carries a `detail`
/// field; storage internals are logged but never echoed to the client.
pub struct ApiError(MessagingError);

impl From<MessagingError> for ApiError {
    fn from(err: MessagingError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            MessagingError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            MessagingError::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            MessagingError::Forbidden(denial) => (StatusCode::FORBIDDEN, denial.to_string()),
            MessagingError::Conflict => (StatusCode::CONFLICT, self.0.to_string()),
            MessagingError::Storage(err) => {
                error!("storage error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

//! Error types for the HTTP surface.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use brickwall_core::HubError;

/// Errors that can occur in the REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested brick does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A brick id could not be parsed from the request path.
    #[error("invalid brick id: {0}")]
    InvalidId(String),

    /// The hub is not accepting commands.
    #[error("hub unavailable: {0}")]
    Unavailable(#[from] HubError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidId(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unavailable(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

//! HTTP error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::auth::AuthError;
use crate::tunnel::ResolutionError;

/// Errors surfaced to HTTP callers as `{code, message}` bodies.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unable to resolve tunnel: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{principal} may not {action} {resource}")]
    Forbidden {
        principal: String,
        action: String,
        resource: String,
    },

    #[error("Authorization failed: {0}")]
    Auth(#[from] AuthError),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Resolution(_) | Self::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "code": status.as_u16(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

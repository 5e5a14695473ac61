//! HTTP mapping of the domain error taxonomy.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domains::DomainError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The auth layer did not attach an acting user.
    #[error("missing acting user")]
    MissingIdentity,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain(DomainError::InvalidContent(_)) => StatusCode::BAD_REQUEST,
            ApiError::Domain(DomainError::SubjectNotFound(..)) => StatusCode::NOT_FOUND,
            ApiError::Domain(DomainError::Forbidden(_)) => StatusCode::FORBIDDEN,
            ApiError::Domain(DomainError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Domain(DomainError::StorageUnavailable(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MissingIdentity => StatusCode::UNAUTHORIZED,
        }
    }
}

// Unreadable bodies (bad JSON, wrong types, missing content type) are the
// client's fault and answer like any other invalid payload.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Domain(DomainError::InvalidContent(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

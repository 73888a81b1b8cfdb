//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use playbook_core::CoreError;
use playbook_renderer::ExportError;
use thiserror::Error;

use crate::store::StoreError;
use crate::validation::ValidationError;

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A path segment or body failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The store or widget rejected the request.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Export failed.
    #[error(transparent)]
    Export(#[from] ExportError),
    /// The request is malformed in some other way.
    #[error("{0}")]
    BadRequest(String),
    /// Unexpected server failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for the error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::WidgetNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Core(e)) => core_status(e),
            Self::Export(ExportError::MissingElement(_)) => StatusCode::NOT_FOUND,
            Self::Export(ExportError::Unsupported(_)) => StatusCode::NOT_IMPLEMENTED,
            Self::Export(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn core_status(error: &CoreError) -> StatusCode {
    match error {
        CoreError::UnknownCollection(_) | CoreError::UnknownFramework(_) => StatusCode::NOT_FOUND,
        CoreError::ReadOnly(_) => StatusCode::FORBIDDEN,
        CoreError::UnknownField { .. }
        | CoreError::TypeMismatch { .. }
        | CoreError::InvalidChoice { .. }
        | CoreError::EmptyBaseText(_)
        | CoreError::MissingField { .. }
        | CoreError::DuplicateId(_)
        | CoreError::Serialization(_) => StatusCode::BAD_REQUEST,
        CoreError::InvalidSchema { .. } | CoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        } else {
            tracing::debug!("Request rejected ({status}): {self}");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

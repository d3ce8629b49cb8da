//! API error types.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;
use vgen_models::{CredentialError, UnknownProvider};
use vgen_storage::StorageError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Shown instead of internal error details in production.
const REDACTED_DETAIL: &str = "An internal error occurred";

/// Marks an error response whose detail is hidden in production.
#[derive(Debug, Clone, Copy)]
pub struct RedactableDetail;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Provider error: {0}")]
    Provider(#[from] vgen_providers::ProviderError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_)
            | ApiError::Validation(_)
            | ApiError::Storage(StorageError::UploadFailed(_)) => StatusCode::BAD_REQUEST,
            ApiError::Storage(StorageError::NotFound(_) | StorageError::InvalidKey(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Internal(_) | ApiError::Storage(_) | ApiError::Provider(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message.
    fn detail(&self, production: bool) -> String {
        match self {
            ApiError::BadRequest(msg) | ApiError::Validation(msg) => msg.clone(),
            ApiError::Storage(StorageError::NotFound(_) | StorageError::InvalidKey(_)) => {
                "Video not found".to_string()
            }
            ApiError::Storage(e @ StorageError::UploadFailed(_)) => e.to_string(),
            _ if production => REDACTED_DETAIL.to_string(),
            ApiError::Internal(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| errors.to_string());
        Self::Validation(message)
    }
}

impl From<UnknownProvider> for ApiError {
    fn from(_: UnknownProvider) -> Self {
        Self::BadRequest("Invalid API provider".to_string())
    }
}

impl From<CredentialError> for ApiError {
    fn from(e: CredentialError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::BadRequest(e.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let detail = self.detail(false);
        let redactable = self.detail(true) != detail;

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let mut response = (status, Json(ErrorResponse { detail })).into_response();
        if redactable {
            response.extensions_mut().insert(RedactableDetail);
        }
        response
    }
}

/// Same status, generic detail.
pub(crate) fn redacted_response(status: StatusCode) -> Response {
    (
        status,
        Json(ErrorResponse {
            detail: REDACTED_DETAIL.to_string(),
        }),
    )
        .into_response()
}

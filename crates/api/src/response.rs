//! Response envelope.
//!
//! Success bodies are `{"success": true, "data": ...}` (or `message` for deletes).
//! Failures are `{"success": false, "error": "..."}`, except delete which reports
//! failures under `message`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use mirrorcut_core::images::ImageError;
use mirrorcut_shared::AppError;

/// Wrap `data` in a success envelope.
pub fn data<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(json!({ "success": true, "data": data }))).into_response()
}

/// Success envelope carrying a message.
pub fn message(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "success": true, "message": message.into() })),
    )
        .into_response()
}

/// Body key under which the failure text is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorKey {
    Error,
    Message,
}

/// Handler error converted to the failure envelope.
#[derive(Debug)]
pub struct ApiError {
    inner: AppError,
    key: ErrorKey,
}

impl ApiError {
    /// Report the failure under `message` instead of `error`.
    #[must_use]
    pub fn with_message_key(mut self) -> Self {
        self.key = ErrorKey::Message;
        self
    }
}

impl From<AppError> for ApiError {
    fn from(inner: AppError) -> Self {
        Self {
            inner,
            key: ErrorKey::Error,
        }
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        AppError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let text = self.inner.to_string();

        error!(
            status = status.as_u16(),
            code = self.inner.error_code(),
            error = %text,
            "Request failed"
        );

        let body = match self.key {
            ErrorKey::Error => json!({ "success": false, "error": text }),
            ErrorKey::Message => json!({ "success": false, "message": text }),
        };
        (status, Json(body)).into_response()
    }
}

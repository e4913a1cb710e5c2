// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::CodecError;
use crate::storage::LedgerError;
use crate::validation::ValidationError;

/// Error returned by every API endpoint.
///
/// `code` is reported as `error_message`, `message` is human readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    error_message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn request_too_large(limit: usize) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "request_too_large",
            format!("Request size is too large. Maximum is {limit} bytes."),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    /// JSON body as sent to the client (before optional sealing).
    pub fn body_json(&self) -> serde_json::Value {
        serde_json::json!({
            "message": self.message,
            "error_message": self.code,
        })
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let reportable = matches!(err, LedgerError::Busy | LedgerError::IdGenerationExhausted);
        if err.is_domain() || reportable {
            return Self::new(err.status_code(), err.error_code(), err.to_string());
        }
        // Storage faults are logged in full but not echoed to the client
        tracing::error!(error = %err, "Ledger storage failure");
        Self::internal("Internal storage error.")
    }
}

impl From<CodecError> for ApiError {
    fn from(err: CodecError) -> Self {
        if err.status_code() == StatusCode::BAD_REQUEST {
            return Self::bad_request(err.error_code(), err.to_string());
        }
        tracing::error!(error = %err, "Transport encryption failure");
        Self::internal("Internal encryption error.")
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.error_code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            message: &self.message,
            error_message: &self.code,
        });
        (self.status, body).into_response()
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sealed request extractor and sealed reply.
//!
//! Request bodies are chunked RSA ciphertext addressed to the server's
//! current (or previous) transport key. Replies are sealed to the one-time
//! `encryption_key` carried inside the request, when it is usable.
//!
//! ```rust,ignore
//! async fn handler(State(state): State<AppState>, request: SealedRequest) -> SealedReply {
//!     let result = do_work(&state, &request.fields).await;
//!     SealedReply::new(request.reply_key, result)
//! }
//! ```

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_LENGTH, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rsa::RsaPublicKey;
use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::{seal, CodecError};
use crate::error::ApiError;
use crate::state::{unix_now, AppState};
use crate::validation::{check_for, CheckContext, Field, RequestFields, ValidationError};

/// Decrypted request body.
#[derive(Debug, Clone)]
pub struct SealedRequest {
    pub fields: RequestFields,
    /// Key the reply is sealed to; `None` sends the reply in plaintext
    pub reply_key: Option<RsaPublicKey>,
}

impl SealedRequest {
    pub fn new(fields: RequestFields) -> Self {
        let reply_key = fields.reply_key();
        Self { fields, reply_key }
    }
}

fn declared_length(req: &Request) -> Option<usize> {
    req.headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

impl FromRequest<AppState> for SealedRequest {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let limit = state.max_request_size;
        if declared_length(&req).is_some_and(|length| length > limit) {
            return Err(ApiError::request_too_large(limit));
        }

        let body = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::request_too_large(limit)
            } else {
                ApiError::bad_request("invalid_data", rejection.body_text())
            }
        })?;
        if body.len() > limit {
            return Err(ApiError::request_too_large(limit));
        }

        let now = unix_now();
        let field = Field::Data;
        let sealed = String::from_utf8(body.to_vec()).map_err(|_| {
            ValidationError::invalid(
                field.name(),
                "data contains invalid characters. It should only contain base64 characters.",
            )
        })?;
        let ctx = CheckContext {
            now,
            policy: &state.policy,
        };
        check_for(field.kind())(field.name(), &sealed, &ctx)
            .map_err(|reason| ValidationError::invalid(field.name(), reason))?;

        let keyring = state.keyring.clone();
        let plaintext = tokio::task::spawn_blocking(move || keyring.decrypt(&sealed, now))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Decryption task failed");
                ApiError::internal("Internal encryption error.")
            })??;
        let text = String::from_utf8(plaintext).map_err(|_| CodecError::InvalidText)?;

        Ok(Self::new(RequestFields::parse(&text)?))
    }
}

/// Response sealed to the caller's one-time key.
///
/// Errors are sealed the same way as successes once the request has been
/// decrypted.
#[derive(Debug)]
pub struct SealedReply {
    status: StatusCode,
    body: Value,
    key: Option<RsaPublicKey>,
}

impl SealedReply {
    pub fn new<T: Serialize>(key: Option<RsaPublicKey>, result: Result<T, ApiError>) -> Self {
        let outcome = result.and_then(|body| {
            serde_json::to_value(body).map_err(|e| {
                tracing::error!(error = %e, "Failed to serialize response body");
                ApiError::internal("Internal serialization error.")
            })
        });
        match outcome {
            Ok(body) => Self {
                status: StatusCode::OK,
                body,
                key,
            },
            Err(err) => Self {
                status: err.status,
                body: err.body_json(),
                key,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for SealedReply {
    fn into_response(self) -> Response {
        let Some(key) = self.key else {
            return (self.status, Json(self.body)).into_response();
        };
        let sealed = serde_json::to_vec(&self.body)
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to serialize response body");
                ApiError::internal("Internal serialization error.")
            })
            .and_then(|plaintext| seal(&key, &plaintext).map_err(ApiError::from));
        match sealed {
            Ok(data) => (self.status, Json(json!({ "data": data }))).into_response(),
            Err(err) => err.into_response(),
        }
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::error::ApiError;
use crate::models::{ErrorResponse, PublicKeyResponse};
use crate::state::{unix_now, AppState};

/// Current transport public key.
///
/// Fetching the key may rotate it; requests sealed to the previous key are
/// still accepted for a while after rotation.
#[utoipa::path(
    get,
    path = "/api/get-key",
    tag = "Transport",
    responses(
        (status = 200, description = "Base64 DER RSA public key", body = PublicKeyResponse),
        (status = 500, description = "Key task failed", body = ErrorResponse)
    )
)]
pub async fn get_key(State(state): State<AppState>) -> Result<Json<PublicKeyResponse>, ApiError> {
    let keyring = state.keyring.clone();
    let key = tokio::task::spawn_blocking(move || keyring.public_key(unix_now()))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Key rotation task failed");
            ApiError::internal("Internal encryption error.")
        })?;
    Ok(Json(PublicKeyResponse { key }))
}

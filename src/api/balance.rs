// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed balance and wallet queries.
//!
//! Queries consume a request id like any other signed request, so a captured
//! query cannot be replayed to observe later balances.

use axum::extract::State;

use super::sealed::{SealedReply, SealedRequest};
use crate::error::ApiError;
use crate::ledger::LedgerEngine;
use crate::models::{BalanceResponse, ErrorResponse, SealedResponse, WalletInfoResponse, SUCCESS};
use crate::state::{unix_now, AppState};
use crate::storage::LedgerResult;
use crate::validation::{Field, RequestFields, VerifiedRequest, WALLET_QUERY};

/// Balance of `master_key`; unknown addresses report zero.
#[utoipa::path(
    post,
    path = "/api/get-balance",
    tag = "Wallet",
    request_body(
        content = String,
        content_type = "text/plain",
        description = "Sealed get-balance request"
    ),
    responses(
        (status = 200, description = "Current balance", body = SealedResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn get_balance(State(state): State<AppState>, request: SealedRequest) -> SealedReply {
    let result = query_balance(&state, &request.fields).await;
    SealedReply::new(request.reply_key, result)
}

async fn query_balance(
    state: &AppState,
    fields: &RequestFields,
) -> Result<BalanceResponse, ApiError> {
    let verified = state.validator.verify(&WALLET_QUERY, fields, unix_now())?;
    let address = verified.text(Field::MasterKey)?.to_string();

    let balance = run_query(state, &verified, move |ledger| ledger.get_balance(&address)).await?;
    Ok(BalanceResponse {
        message: SUCCESS.to_string(),
        balance: balance.to_string(),
    })
}

/// Balance, owned transactions and aliases of `master_key`.
#[utoipa::path(
    post,
    path = "/api/get-wallet-info",
    tag = "Wallet",
    request_body(
        content = String,
        content_type = "text/plain",
        description = "Sealed get-wallet-info request"
    ),
    responses(
        (status = 200, description = "Wallet summary", body = SealedResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn get_wallet_info(State(state): State<AppState>, request: SealedRequest) -> SealedReply {
    let result = query_wallet(&state, &request.fields).await;
    SealedReply::new(request.reply_key, result)
}

async fn query_wallet(
    state: &AppState,
    fields: &RequestFields,
) -> Result<WalletInfoResponse, ApiError> {
    let verified = state.validator.verify(&WALLET_QUERY, fields, unix_now())?;
    let address = verified.text(Field::MasterKey)?.to_string();

    let info = run_query(state, &verified, move |ledger| ledger.wallet_info(&address)).await?;
    Ok(WalletInfoResponse::from(info))
}

async fn run_query<T, F>(
    state: &AppState,
    verified: &VerifiedRequest<'_>,
    op: F,
) -> Result<T, ApiError>
where
    F: FnOnce(&LedgerEngine<'_>) -> LedgerResult<T> + Send + 'static,
    T: Send + 'static,
{
    state
        .run_signed(
            verified.text(Field::RequestId)?,
            verified.timestamp(Field::RequestExpiryTime)?,
            op,
        )
        .await
}

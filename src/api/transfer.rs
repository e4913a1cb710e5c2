// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Direct transfers between addresses.

use axum::extract::State;

use super::sealed::{SealedReply, SealedRequest};
use crate::error::ApiError;
use crate::models::{ErrorResponse, MessageResponse, SealedResponse};
use crate::state::{unix_now, AppState};
use crate::validation::{Field, RequestFields, TRANSFER};

/// Transfer funds from `sender_key` to `recipient_key`.
///
/// Both sides may be aliases. The fee is deducted from the amount the
/// recipient receives.
#[utoipa::path(
    post,
    path = "/api/transfer",
    tag = "Ledger",
    request_body(
        content = String,
        content_type = "text/plain",
        description = "Sealed transfer request signed by sender_key"
    ),
    responses(
        (status = 200, description = "Transfer applied", body = SealedResponse),
        (
            status = 400,
            description = "Invalid request or insufficient balance",
            body = ErrorResponse
        ),
        (status = 413, description = "Request too large", body = ErrorResponse),
        (status = 503, description = "Storage busy", body = ErrorResponse)
    )
)]
pub async fn transfer(State(state): State<AppState>, request: SealedRequest) -> SealedReply {
    let result = apply_transfer(&state, &request.fields).await;
    SealedReply::new(request.reply_key, result)
}

async fn apply_transfer(
    state: &AppState,
    fields: &RequestFields,
) -> Result<MessageResponse, ApiError> {
    let verified = state.validator.verify(&TRANSFER, fields, unix_now())?;
    let sender = verified.text(Field::SenderKey)?.to_string();
    let recipient = verified.text(Field::RecipientKey)?.to_string();
    let amount = verified.amount(Field::TransferAmount)?;

    state
        .run_signed(
            verified.text(Field::RequestId)?,
            verified.timestamp(Field::RequestExpiryTime)?,
            move |ledger| ledger.transfer(&sender, &recipient, amount),
        )
        .await?;
    Ok(MessageResponse::success())
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pending transaction endpoints.
//!
//! A transaction is an open SEND or RECEIVE offer created by its owner and
//! completed by any counterpart before it expires.

use axum::extract::State;

use super::sealed::{SealedReply, SealedRequest};
use crate::error::ApiError;
use crate::models::{
    CreateTransactionResponse, ErrorResponse, MessageResponse, SealedResponse, TransactionSummary,
    TransactionsResponse, SUCCESS,
};
use crate::state::{unix_now, AppState};
use crate::validation::{
    Field, RequestFields, CREATE_TRANSACTION, GET_TRANSACTIONS, TRANSACTION_ACTION,
};

/// Open a pending transaction owned by `master_key`.
///
/// Charges the creation fee. If no unique id can be generated the fee is
/// refunded and `unknown_error` is returned.
#[utoipa::path(
    post,
    path = "/api/create-transaction",
    tag = "Transactions",
    request_body(
        content = String,
        content_type = "text/plain",
        description = "Sealed create-transaction request"
    ),
    responses(
        (status = 200, description = "Transaction created", body = SealedResponse),
        (
            status = 400,
            description = "Invalid request or insufficient balance",
            body = ErrorResponse
        ),
        (
            status = 500,
            description = "No unique transaction id could be generated",
            body = ErrorResponse
        )
    )
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    request: SealedRequest,
) -> SealedReply {
    let result = apply_create(&state, &request.fields).await;
    SealedReply::new(request.reply_key, result)
}

async fn apply_create(
    state: &AppState,
    fields: &RequestFields,
) -> Result<CreateTransactionResponse, ApiError> {
    let verified = state.validator.verify(&CREATE_TRANSACTION, fields, unix_now())?;
    let owner = verified.text(Field::MasterKey)?.to_string();
    let transaction_type = verified.transaction_type()?;
    let amount = verified.amount(Field::TransactionAmount)?;
    let expiry_time = verified.timestamp(Field::TransactionExpiryTime)?;

    let tx = state
        .run_signed(
            verified.text(Field::RequestId)?,
            verified.timestamp(Field::RequestExpiryTime)?,
            move |ledger| ledger.insert_transaction(transaction_type, &owner, amount, expiry_time),
        )
        .await?;

    Ok(CreateTransactionResponse {
        message: SUCCESS.to_string(),
        transaction_id: tx.transaction_id,
        transaction_amount: tx.amount.to_string(),
    })
}

/// Complete a pending transaction as its counterpart.
#[utoipa::path(
    post,
    path = "/api/complete-transaction",
    tag = "Transactions",
    request_body(
        content = String,
        content_type = "text/plain",
        description = "Sealed complete-transaction request"
    ),
    responses(
        (status = 200, description = "Transaction completed", body = SealedResponse),
        (
            status = 400,
            description = "Not found,
            expired,
            already completed or insufficient balance",
            body = ErrorResponse
        )
    )
)]
pub async fn complete_transaction(
    State(state): State<AppState>,
    request: SealedRequest,
) -> SealedReply {
    let result = apply_complete(&state, &request.fields).await;
    SealedReply::new(request.reply_key, result)
}

async fn apply_complete(
    state: &AppState,
    fields: &RequestFields,
) -> Result<MessageResponse, ApiError> {
    let now = unix_now();
    let verified = state.validator.verify(&TRANSACTION_ACTION, fields, now)?;
    let actor = verified.text(Field::MasterKey)?.to_string();
    let transaction_id = verified.text(Field::TransactionId)?.to_string();

    state
        .run_signed(
            verified.text(Field::RequestId)?,
            verified.timestamp(Field::RequestExpiryTime)?,
            move |ledger| ledger.complete_transaction(&transaction_id, &actor, now),
        )
        .await?;
    Ok(MessageResponse::success())
}

/// Delete a transaction owned by `master_key`.
#[utoipa::path(
    post,
    path = "/api/delete-transaction",
    tag = "Transactions",
    request_body(
        content = String,
        content_type = "text/plain",
        description = "Sealed delete-transaction request"
    ),
    responses(
        (status = 200, description = "Transaction deleted", body = SealedResponse),
        (status = 400, description = "Unknown transaction or not the owner", body = ErrorResponse)
    )
)]
pub async fn delete_transaction(
    State(state): State<AppState>,
    request: SealedRequest,
) -> SealedReply {
    let result = apply_delete(&state, &request.fields).await;
    SealedReply::new(request.reply_key, result)
}

async fn apply_delete(
    state: &AppState,
    fields: &RequestFields,
) -> Result<MessageResponse, ApiError> {
    let verified = state.validator.verify(&TRANSACTION_ACTION, fields, unix_now())?;
    let actor = verified.text(Field::MasterKey)?.to_string();
    let transaction_id = verified.text(Field::TransactionId)?.to_string();

    state
        .run_signed(
            verified.text(Field::RequestId)?,
            verified.timestamp(Field::RequestExpiryTime)?,
            move |ledger| ledger.delete_transaction(&transaction_id, &actor),
        )
        .await?;
    Ok(MessageResponse::success())
}

/// Look up transactions by id. Unsigned; unknown ids are omitted.
#[utoipa::path(
    post,
    path = "/api/get-transactions",
    tag = "Transactions",
    request_body(
        content = String,
        content_type = "text/plain",
        description = "Sealed get-transactions request"
    ),
    responses(
        (status = 200, description = "Known transactions keyed by id", body = SealedResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn get_transactions(
    State(state): State<AppState>,
    request: SealedRequest,
) -> SealedReply {
    let result = lookup_transactions(&state, &request.fields).await;
    SealedReply::new(request.reply_key, result)
}

async fn lookup_transactions(
    state: &AppState,
    fields: &RequestFields,
) -> Result<TransactionsResponse, ApiError> {
    let now = unix_now();
    let verified = state.validator.verify(&GET_TRANSACTIONS, fields, now)?;
    let ids = verified.id_list(Field::TransactionIds)?;

    let found = state
        .run_unsigned(move |ledger| ledger.get_transactions(&ids, now))
        .await?;

    Ok(TransactionsResponse {
        message: SUCCESS.to_string(),
        transactions: found
            .iter()
            .map(|(id, tx)| (id.clone(), TransactionSummary::from(tx)))
            .collect(),
    })
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Alias endpoints.

use axum::extract::State;

use super::sealed::{SealedReply, SealedRequest};
use crate::error::ApiError;
use crate::models::{ErrorResponse, MessageResponse, SealedResponse};
use crate::state::{unix_now, AppState};
use crate::validation::{Field, RequestFields, ADD_ALIAS, DELETE_ALIAS};

/// Register `alias_address` as an alias of `master_key` until
/// `alias_expiry_time`. Charges the alias fee.
#[utoipa::path(
    post,
    path = "/api/add-alias",
    tag = "Aliases",
    request_body(
        content = String,
        content_type = "text/plain",
        description = "Sealed add-alias request"
    ),
    responses(
        (status = 200, description = "Alias registered", body = SealedResponse),
        (status = 400, description = "Alias taken or insufficient balance", body = ErrorResponse)
    )
)]
pub async fn add_alias(State(state): State<AppState>, request: SealedRequest) -> SealedReply {
    let result = apply_add(&state, &request.fields).await;
    SealedReply::new(request.reply_key, result)
}

async fn apply_add(state: &AppState, fields: &RequestFields) -> Result<MessageResponse, ApiError> {
    let verified = state.validator.verify(&ADD_ALIAS, fields, unix_now())?;
    let owner = verified.text(Field::MasterKey)?.to_string();
    let alias = verified.text(Field::AliasAddress)?.to_string();
    let expiry_time = verified.timestamp(Field::AliasExpiryTime)?;

    state
        .run_signed(
            verified.text(Field::RequestId)?,
            verified.timestamp(Field::RequestExpiryTime)?,
            move |ledger| ledger.add_alias(&alias, &owner, expiry_time),
        )
        .await?;
    Ok(MessageResponse::success())
}

#[utoipa::path(
    post,
    path = "/api/delete-alias",
    tag = "Aliases",
    request_body(
        content = String,
        content_type = "text/plain",
        description = "Sealed delete-alias request"
    ),
    responses(
        (status = 200, description = "Alias removed", body = SealedResponse),
        (status = 400, description = "Alias does not point at master_key", body = ErrorResponse)
    )
)]
pub async fn delete_alias(State(state): State<AppState>, request: SealedRequest) -> SealedReply {
    let result = apply_delete(&state, &request.fields).await;
    SealedReply::new(request.reply_key, result)
}

async fn apply_delete(
    state: &AppState,
    fields: &RequestFields,
) -> Result<MessageResponse, ApiError> {
    let verified = state.validator.verify(&DELETE_ALIAS, fields, unix_now())?;
    let actor = verified.text(Field::MasterKey)?.to_string();
    let alias = verified.text(Field::AliasAddress)?.to_string();

    state
        .run_signed(
            verified.text(Field::RequestId)?,
            verified.timestamp(Field::RequestExpiryTime)?,
            move |ledger| ledger.delete_alias(&alias, &actor),
        )
        .await?;
    Ok(MessageResponse::success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{balance, fund, open_reply, sealed_request, test_ledger, Wallet};
    use crate::api::transfer::transfer;
    use crate::validation::TRANSFER;
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};

    fn add(owner: &Wallet, alias: &str) -> Value {
        owner.request(
            &ADD_ALIAS,
            json!({
                "alias_address": alias,
                "alias_expiry_time": unix_now() + 3600,
            }),
        )
    }

    fn remove(actor: &Wallet, alias: &str) -> Value {
        actor.request(&DELETE_ALIAS, json!({ "alias_address": alias }))
    }

    #[tokio::test]
    async fn transfers_to_an_alias_reach_the_owner() {
        let ledger = test_ledger();
        let state = ledger.state.clone();
        let alice = Wallet::new();
        let bob = Wallet::new();
        let bob_alias = Wallet::new().address;
        fund(&state, &alice.address, dec!(10)).await;
        fund(&state, &bob.address, dec!(1)).await;

        let reply = add_alias(State(state.clone()), sealed_request(add(&bob, &bob_alias))).await;
        let (status, body) = open_reply(reply).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(balance(&state, &bob.address).await, dec!(0.99999));

        let body = alice.request(
            &TRANSFER,
            json!({
                "sender_key": alice.address,
                "recipient_key": bob_alias,
                "transfer_amount": "2",
            }),
        );
        let reply = transfer(State(state.clone()), sealed_request(body)).await;
        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(balance(&state, &bob.address).await, dec!(2.97999));
        assert_eq!(balance(&state, &bob_alias).await, dec!(0));
    }

    #[tokio::test]
    async fn duplicate_alias_is_refunded() {
        let ledger = test_ledger();
        let state = ledger.state.clone();
        let alice = Wallet::new();
        let bob = Wallet::new();
        let alias = Wallet::new().address;
        fund(&state, &alice.address, dec!(1)).await;
        fund(&state, &bob.address, dec!(1)).await;

        let reply = add_alias(State(state.clone()), sealed_request(add(&alice, &alias))).await;
        assert_eq!(reply.status(), StatusCode::OK);

        let reply = add_alias(State(state.clone()), sealed_request(add(&bob, &alias))).await;
        let (status, body) = open_reply(reply).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_message"], "invalid_alias_address");
        assert_eq!(balance(&state, &bob.address).await, dec!(1));
    }

    #[tokio::test]
    async fn only_the_owner_can_delete_an_alias() {
        let ledger = test_ledger();
        let state = ledger.state.clone();
        let alice = Wallet::new();
        let bob = Wallet::new();
        let alias = Wallet::new().address;
        fund(&state, &alice.address, dec!(1)).await;

        let reply = add_alias(State(state.clone()), sealed_request(add(&alice, &alias))).await;
        assert_eq!(reply.status(), StatusCode::OK);

        let reply = delete_alias(State(state.clone()), sealed_request(remove(&bob, &alias))).await;
        let (status, body) = open_reply(reply).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_message"], "alias_address_not_found");

        let request = sealed_request(remove(&alice, &alias));
        let reply = delete_alias(State(state.clone()), request).await;
        assert_eq!(reply.status(), StatusCode::OK);

        let resolved = state.pool.read(move |db| db.resolve(&alias)).await.unwrap();
        assert_ne!(resolved, alice.address);
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP API.
//!
//! `GET /api/get-key` publishes the transport key. Every other `/api`
//! endpoint is a `POST` whose body is a [`sealed::SealedRequest`] and whose
//! response is a [`sealed::SealedReply`].

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        BalanceResponse, CreateTransactionResponse, ErrorResponse, MessageResponse,
        PublicKeyResponse, SealedResponse, TransactionSummary, TransactionsResponse,
        WalletInfoResponse,
    },
    state::AppState,
    storage::{TxStatus, TxType},
};

pub mod aliases;
pub mod balance;
pub mod health;
pub mod key;
pub mod sealed;
pub mod transactions;
pub mod transfer;

#[cfg(test)]
pub(crate) mod test_support;

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_request_size;

    let api_routes = Router::new()
        .route("/get-key", get(key::get_key))
        .route("/transfer", post(transfer::transfer))
        .route("/create-transaction", post(transactions::create_transaction))
        .route("/complete-transaction", post(transactions::complete_transaction))
        .route("/delete-transaction", post(transactions::delete_transaction))
        .route("/get-transactions", post(transactions::get_transactions))
        .route("/add-alias", post(aliases::add_alias))
        .route("/delete-alias", post(aliases::delete_alias))
        .route("/get-balance", post(balance::get_balance))
        .route("/get-wallet-info", post(balance::get_wallet_info));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        key::get_key,
        transfer::transfer,
        transactions::create_transaction,
        transactions::complete_transaction,
        transactions::delete_transaction,
        transactions::get_transactions,
        aliases::add_alias,
        aliases::delete_alias,
        balance::get_balance,
        balance::get_wallet_info,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            PublicKeyResponse,
            MessageResponse,
            CreateTransactionResponse,
            BalanceResponse,
            TransactionSummary,
            TransactionsResponse,
            WalletInfoResponse,
            ErrorResponse,
            SealedResponse,
            TxType,
            TxStatus,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Transport", description = "Transport key distribution"),
        (name = "Ledger", description = "Direct transfers"),
        (name = "Transactions", description = "Pending SEND/RECEIVE transactions"),
        (name = "Aliases", description = "Address aliases"),
        (name = "Wallet", description = "Balance and wallet queries"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{fund, open_response, seal_for_server, test_ledger, Wallet};
    use crate::auth::codec::tests::test_keys;
    use crate::auth::seal;
    use crate::validation::WALLET_QUERY;
    use axum::body::{to_bytes, Body};
    use axum::http::{header::CONTENT_LENGTH, Request, StatusCode};
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn post_sealed(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_LENGTH, body.len().to_string())
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn get_key_returns_transport_key() {
        let ledger = test_ledger();
        let app = router(ledger.state.clone());

        let response = app
            .oneshot(Request::builder().uri("/api/get-key").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["key"].as_str().unwrap().len(), 392);
    }

    #[tokio::test]
    async fn sealed_request_round_trip() {
        let ledger = test_ledger();
        let state = ledger.state.clone();
        let alice = Wallet::new();
        fund(&state, &alice.address, dec!(3)).await;

        let body = seal_for_server(&alice.request(&WALLET_QUERY, json!({})));
        let response = router(state)
            .oneshot(post_sealed("/api/get-balance", body))
            .await
            .unwrap();

        let (status, body) = open_response(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "success", "balance": "3.00000"}));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let ledger = test_ledger();
        let mut state = ledger.state.clone();
        state.max_request_size = 100;

        let response = router(state)
            .oneshot(post_sealed("/api/get-balance", "A".repeat(344)))
            .await
            .unwrap();

        let (status, body) = open_response(response).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error_message"], "request_too_large");
    }

    #[tokio::test]
    async fn malformed_payload_is_invalid_data() {
        let ledger = test_ledger();

        let response = router(ledger.state.clone())
            .oneshot(post_sealed("/api/transfer", "not base64!".to_string()))
            .await
            .unwrap();

        let (status, body) = open_response(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_message"], "invalid_data");
    }

    #[tokio::test]
    async fn payload_for_another_key_is_rejected() {
        let ledger = test_ledger();
        let sealed = seal(&test_keys()[1].to_public_key(), br#"{"request_id":"1"}"#).unwrap();

        let response = router(ledger.state.clone())
            .oneshot(post_sealed("/api/transfer", sealed))
            .await
            .unwrap();

        let (status, body) = open_response(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_message"], "invalid_encrypted_data");
    }

    #[tokio::test]
    async fn non_object_payload_is_invalid_json() {
        let ledger = test_ledger();

        let response = router(ledger.state.clone())
            .oneshot(post_sealed("/api/transfer", seal_for_server(&json!([1, 2, 3]))))
            .await
            .unwrap();

        let (status, body) = open_response(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_message"], "invalid_json");
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let ledger = test_ledger();

        let response = router(ledger.state.clone())
            .oneshot(Request::builder().uri("/api-doc/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(doc["paths"]["/api/transfer"]["post"].is_object());
    }
}

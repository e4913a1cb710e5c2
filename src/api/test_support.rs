// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for handler and router tests.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::body::to_bytes;
use axum::response::{IntoResponse, Response};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tempfile::TempDir;

use super::sealed::{SealedReply, SealedRequest};
use crate::auth::codec::{open, tests::test_keys};
use crate::auth::{encode_public_key, seal, KeyGeneration, KeyRing};
use crate::config::ServerConfig;
use crate::state::{unix_now, AppState};
use crate::storage::ledger_db::change_balance;
use crate::storage::LedgerDb;
use crate::validation::{canonical_message, EndpointSpec, RequestFields};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Fresh 32-digit request id.
pub fn request_id() -> String {
    format!("{:032}", NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
}

pub struct TestLedger {
    pub state: AppState,
    _dir: TempDir,
}

/// State backed by a throwaway database and the fixture transport key.
pub fn test_ledger() -> TestLedger {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig {
        data_dir: dir.path().to_path_buf(),
        ..ServerConfig::default()
    };
    let db = LedgerDb::open(&config.ledger_db_path()).unwrap();
    let generation = KeyGeneration::from_private_key(test_keys()[0].clone(), unix_now()).unwrap();
    let keyring = KeyRing::from_generations(generation, None);
    TestLedger {
        state: AppState::new(&config, db, keyring),
        _dir: dir,
    }
}

/// Credit `amount` to `address` outside of any request.
pub async fn fund(state: &AppState, address: &str, amount: Decimal) {
    let address = address.to_string();
    state
        .pool
        .write(move |db| db.write(|txn| change_balance(txn, &address, amount)))
        .await
        .unwrap();
}

pub async fn balance(state: &AppState, address: &str) -> Decimal {
    let address = address.to_string();
    state.pool.read(move |db| db.balance(&address)).await.unwrap()
}

/// Base64 of the reply key clients put in `encryption_key`.
pub fn reply_key_b64() -> String {
    encode_public_key(&test_keys()[1].to_public_key()).unwrap()
}

/// Seal a JSON body to the server's fixture transport key.
pub fn seal_for_server(body: &Value) -> String {
    seal(&test_keys()[0].to_public_key(), body.to_string().as_bytes()).unwrap()
}

/// Ed25519 client wallet.
pub struct Wallet {
    pair: Ed25519KeyPair,
    pub address: String,
}

impl Wallet {
    pub fn new() -> Self {
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&SystemRandom::new()).unwrap();
        let pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap();
        let address = STANDARD.encode(pair.public_key().as_ref());
        Self { pair, address }
    }

    /// Add `signature` over the endpoint's signed fields of `body`.
    pub fn sign(&self, spec: &EndpointSpec, mut body: Value) -> Value {
        let fields = RequestFields::from_json(body.clone()).unwrap();
        let message = canonical_message(&fields, spec.signed_fields());
        body["signature"] = json!(STANDARD.encode(self.pair.sign(message.as_bytes()).as_ref()));
        body
    }

    /// Signed request for an endpoint whose signer is `master_key`.
    pub fn request(&self, spec: &EndpointSpec, extra: Value) -> Value {
        let mut body = json!({
            "request_id": request_id(),
            "request_expiry_time": unix_now() + 30,
            "master_key": self.address,
            "encryption_key": reply_key_b64(),
        });
        if let (Some(target), Value::Object(extra)) = (body.as_object_mut(), extra) {
            target.extend(extra);
        }
        self.sign(spec, body)
    }
}

/// Decrypted request as the extractor would produce it.
pub fn sealed_request(body: Value) -> SealedRequest {
    SealedRequest::new(RequestFields::from_json(body).unwrap())
}

/// Status and decrypted body of a reply.
pub async fn open_reply(reply: SealedReply) -> (axum::http::StatusCode, Value) {
    open_response(reply.into_response()).await
}

pub async fn open_response(response: Response) -> (axum::http::StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let outer: Value = serde_json::from_slice(&bytes).unwrap();
    let Some(sealed) = outer.get("data").and_then(Value::as_str) else {
        return (status, outer);
    };
    let plaintext = open(&[&test_keys()[1]], sealed).unwrap();
    (status, serde_json::from_slice(&plaintext).unwrap())
}

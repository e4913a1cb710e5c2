// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Canonical request message and Ed25519 signature check.
//!
//! The signed message is a minified JSON object holding exactly the signed
//! fields of the endpoint, keys sorted lexicographically, values as strings:
//!
//! ```text
//! {"master_key":"...","request_expiry_time":"1700000030","request_id":"..."}
//! ```
//!
//! The order in which fields appeared in the request body is irrelevant.

use std::collections::BTreeMap;

use base64ct::{Base64, Encoding};
use ring::signature::{UnparsedPublicKey, ED25519};

use super::error::ValidationError;
use super::fields::Field;
use super::RequestFields;

/// Build the canonical message over `signed` fields.
///
/// Fields missing from `request` are left out; verification only runs after
/// presence has been checked.
pub fn canonical_message(
    request: &RequestFields,
    signed: impl IntoIterator<Item = Field>,
) -> String {
    let message: BTreeMap<&'static str, &str> = signed
        .into_iter()
        .filter_map(|field| request.get(field).map(|value| (field.name(), value)))
        .collect();
    // A map of strings always serializes
    serde_json::to_string(&message).unwrap_or_default()
}

/// Verify a base64 Ed25519 signature over `message` with a base64 public key.
pub fn verify_signature(
    public_key_b64: &str,
    signature_b64: &str,
    message: &[u8],
) -> Result<(), ValidationError> {
    let public_key =
        Base64::decode_vec(public_key_b64).map_err(|_| ValidationError::InvalidSignature)?;
    let signature =
        Base64::decode_vec(signature_b64).map_err(|_| ValidationError::InvalidSignature)?;
    UnparsedPublicKey::new(&ED25519, &public_key)
        .verify(message, &signature)
        .map_err(|_| ValidationError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::rand::SystemRandom;
    use ring::signature::{Ed25519KeyPair, KeyPair};
    use serde_json::json;

    fn keypair() -> Ed25519KeyPair {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
        Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap()
    }

    fn fields(value: serde_json::Value) -> RequestFields {
        RequestFields::from_json(value).unwrap()
    }

    const SIGNED: [Field; 3] = [Field::RequestId, Field::RequestExpiryTime, Field::MasterKey];

    #[test]
    fn message_is_sorted_and_minified() {
        let request = fields(json!({
            "request_id": "1",
            "master_key": "k",
            "request_expiry_time": 1700000030,
            "signature": "ignored",
        }));
        assert_eq!(
            canonical_message(&request, SIGNED),
            r#"{"master_key":"k","request_expiry_time":"1700000030","request_id":"1"}"#
        );
    }

    #[test]
    fn body_order_does_not_matter() {
        let a = fields(json!({"request_id": "1", "master_key": "k", "request_expiry_time": "5"}));
        let b = fields(json!({"request_expiry_time": "5", "request_id": "1", "master_key": "k"}));
        assert_eq!(canonical_message(&a, SIGNED), canonical_message(&b, SIGNED));
    }

    #[test]
    fn undeclared_fields_are_never_signed() {
        let request = fields(json!({"request_id": "1", "extra": "x", "encryption_key": "e"}));
        assert_eq!(canonical_message(&request, SIGNED), r#"{"request_id":"1"}"#);
    }

    #[test]
    fn signature_round_trip_and_mutation() {
        let pair = keypair();
        let public = Base64::encode_string(pair.public_key().as_ref());
        let message = br#"{"request_id":"1"}"#;
        let signature = Base64::encode_string(pair.sign(message).as_ref());

        assert!(verify_signature(&public, &signature, message).is_ok());

        let mut mutated = message.to_vec();
        mutated[14] ^= 0x01;
        assert_eq!(
            verify_signature(&public, &signature, &mutated),
            Err(ValidationError::InvalidSignature)
        );

        let other = Base64::encode_string(keypair().public_key().as_ref());
        assert!(verify_signature(&other, &signature, message).is_err());
    }
}

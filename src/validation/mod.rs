// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Request Validation
//!
//! Decrypted requests are flat JSON objects. Values are normalized to text
//! (strings as-is, numbers and arrays as compact JSON) and then checked
//! against the endpoint's declared field list:
//!
//! 1. All missing fields are reported at once (`missing_keys`)
//! 2. Field checks run in declaration order; the first failure is returned
//! 3. If the endpoint is signed, the Ed25519 signature is verified over the
//!    canonical message built from the signed fields
//!
//! The signed fields are derived from the declared fields, so an endpoint
//! cannot sign a field it does not validate.

pub mod error;
pub mod fields;
pub mod signature;

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use rsa::RsaPublicKey;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::auth::{parse_public_key, PUBLIC_KEY_B64_LEN};
use crate::config::LedgerPolicy;
use crate::storage::TxType;

pub use error::ValidationError;
pub use fields::{check_for, is_address, CheckContext, Field, FieldKind};
pub use signature::{canonical_message, verify_signature};

// =============================================================================
// Request fields
// =============================================================================

/// Decrypted request body with every value as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFields {
    values: HashMap<String, String>,
}

impl RequestFields {
    /// Normalize a JSON object; anything else is `invalid_json`.
    pub fn from_json(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(map) = value else {
            return Err(ValidationError::InvalidJson);
        };
        let values = map
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect();
        Ok(Self { values })
    }

    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_str(text).map_err(|_| ValidationError::InvalidJson)?;
        Self::from_json(value)
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(field.name()).map(String::as_str)
    }

    /// One-time reply key, if the request carries a usable one.
    ///
    /// Parsed independently of validation so that failed requests still get
    /// a sealed reply.
    pub fn reply_key(&self) -> Option<RsaPublicKey> {
        self.get(Field::EncryptionKey)
            .filter(|key| key.len() == PUBLIC_KEY_B64_LEN)
            .and_then(|key| parse_public_key(key).ok())
    }
}

// =============================================================================
// Endpoint declarations
// =============================================================================

/// Fields an endpoint requires, in validation order, and the field holding
/// the signing key (unsigned endpoints have none).
#[derive(Debug, Clone, Copy)]
pub struct EndpointSpec {
    pub fields: &'static [Field],
    pub signer: Option<Field>,
}

impl EndpointSpec {
    /// Fields covered by the signature.
    pub fn signed_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields.iter().copied().filter(|field| field.is_signed())
    }
}

pub const TRANSFER: EndpointSpec = EndpointSpec {
    fields: &[
        Field::RequestId,
        Field::RequestExpiryTime,
        Field::TransferAmount,
        Field::SenderKey,
        Field::RecipientKey,
        Field::Signature,
        Field::EncryptionKey,
    ],
    signer: Some(Field::SenderKey),
};

pub const CREATE_TRANSACTION: EndpointSpec = EndpointSpec {
    fields: &[
        Field::RequestId,
        Field::RequestExpiryTime,
        Field::TransactionExpiryTime,
        Field::TransactionAmount,
        Field::TransactionType,
        Field::MasterKey,
        Field::Signature,
        Field::EncryptionKey,
    ],
    signer: Some(Field::MasterKey),
};

/// Shared by complete-transaction and delete-transaction.
pub const TRANSACTION_ACTION: EndpointSpec = EndpointSpec {
    fields: &[
        Field::RequestId,
        Field::RequestExpiryTime,
        Field::TransactionId,
        Field::MasterKey,
        Field::Signature,
        Field::EncryptionKey,
    ],
    signer: Some(Field::MasterKey),
};

pub const ADD_ALIAS: EndpointSpec = EndpointSpec {
    fields: &[
        Field::RequestId,
        Field::RequestExpiryTime,
        Field::AliasExpiryTime,
        Field::AliasAddress,
        Field::MasterKey,
        Field::Signature,
        Field::EncryptionKey,
    ],
    signer: Some(Field::MasterKey),
};

pub const DELETE_ALIAS: EndpointSpec = EndpointSpec {
    fields: &[
        Field::RequestId,
        Field::RequestExpiryTime,
        Field::AliasAddress,
        Field::MasterKey,
        Field::Signature,
        Field::EncryptionKey,
    ],
    signer: Some(Field::MasterKey),
};

/// Shared by get-balance and get-wallet-info.
pub const WALLET_QUERY: EndpointSpec = EndpointSpec {
    fields: &[
        Field::RequestId,
        Field::RequestExpiryTime,
        Field::MasterKey,
        Field::Signature,
        Field::EncryptionKey,
    ],
    signer: Some(Field::MasterKey),
};

pub const GET_TRANSACTIONS: EndpointSpec = EndpointSpec {
    fields: &[Field::TransactionIds, Field::EncryptionKey],
    signer: None,
};

// =============================================================================
// Validator
// =============================================================================

/// Syntax and signature checks for decrypted requests.
#[derive(Clone)]
pub struct RequestValidator {
    policy: Arc<LedgerPolicy>,
}

impl RequestValidator {
    pub fn new(policy: Arc<LedgerPolicy>) -> Self {
        Self { policy }
    }

    pub fn verify<'r>(
        &self,
        spec: &EndpointSpec,
        request: &'r RequestFields,
        now: i64,
    ) -> Result<VerifiedRequest<'r>, ValidationError> {
        let missing: Vec<&'static str> = spec
            .fields
            .iter()
            .filter(|field| request.get(**field).is_none())
            .map(|field| field.name())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingKeys(missing));
        }

        let ctx = CheckContext {
            now,
            policy: &self.policy,
        };
        for field in spec.fields {
            let value = request.get(*field).unwrap_or_default();
            check_for(field.kind())(field.name(), value, &ctx)
                .map_err(|reason| ValidationError::invalid(field.name(), reason))?;
        }

        if let Some(signer) = spec.signer {
            let message = canonical_message(request, spec.signed_fields());
            verify_signature(
                request.get(signer).unwrap_or_default(),
                request.get(Field::Signature).unwrap_or_default(),
                message.as_bytes(),
            )?;
        }

        Ok(VerifiedRequest { fields: request })
    }
}

/// Request that passed [`RequestValidator::verify`], with typed accessors.
#[derive(Debug, Clone, Copy)]
pub struct VerifiedRequest<'r> {
    fields: &'r RequestFields,
}

impl<'r> VerifiedRequest<'r> {
    pub fn text(&self, field: Field) -> Result<&'r str, ValidationError> {
        self.fields
            .get(field)
            .ok_or_else(|| ValidationError::MissingKeys(vec![field.name()]))
    }

    pub fn timestamp(&self, field: Field) -> Result<i64, ValidationError> {
        self.text(field)?.parse().map_err(|_| {
            ValidationError::invalid(field.name(), format!("{} must be an integer.", field.name()))
        })
    }

    pub fn amount(&self, field: Field) -> Result<Decimal, ValidationError> {
        Decimal::from_str(self.text(field)?).map_err(|_| {
            let reason = format!("{} must be a valid decimal.", field.name());
            ValidationError::invalid(field.name(), reason)
        })
    }

    pub fn transaction_type(&self) -> Result<TxType, ValidationError> {
        let field = Field::TransactionType;
        TxType::from_str(self.text(field)?)
            .map_err(|reason| ValidationError::invalid(field.name(), reason))
    }

    pub fn id_list(&self, field: Field) -> Result<Vec<String>, ValidationError> {
        fields::parse_id_list(self.text(field)?).ok_or_else(|| {
            ValidationError::invalid(field.name(), format!("{} must be a list.", field.name()))
        })
    }
}

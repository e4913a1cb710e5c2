// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request fields and their syntax checks.
//!
//! Each [`Field`] has a [`FieldKind`]; [`check_for`] maps a kind to a pure
//! check function. Checks see the normalized text of the field and return a
//! human-readable reason on failure.

use std::str::FromStr;

use base64ct::{Base64, Encoding};
use rust_decimal::Decimal;

use crate::auth::{parse_public_key, CIPHERTEXT_CHUNK_SIZE, PUBLIC_KEY_B64_LEN};
use crate::config::LedgerPolicy;
use crate::storage::TxType;

pub const ID_LENGTH: usize = 32;
pub const ADDRESS_LENGTH: usize = 44;
pub const ADDRESS_BYTES: usize = 32;
pub const SIGNATURE_LENGTH: usize = 88;

/// Every field a request may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    RequestId,
    RequestExpiryTime,
    TransactionExpiryTime,
    AliasExpiryTime,
    TransactionId,
    TransactionIds,
    TransferAmount,
    TransactionAmount,
    TransactionType,
    SenderKey,
    RecipientKey,
    MasterKey,
    AliasAddress,
    Signature,
    EncryptionKey,
    /// The sealed request body itself
    Data,
}

/// Expiry bound a timestamp field is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryScope {
    Request,
    Transaction,
    Alias,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Id,
    IdList,
    Address,
    Expiry(ExpiryScope),
    Amount,
    TransactionType,
    Signature,
    EncryptedPayload,
    EncryptionKey,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::RequestId => "request_id",
            Field::RequestExpiryTime => "request_expiry_time",
            Field::TransactionExpiryTime => "transaction_expiry_time",
            Field::AliasExpiryTime => "alias_expiry_time",
            Field::TransactionId => "transaction_id",
            Field::TransactionIds => "transaction_ids",
            Field::TransferAmount => "transfer_amount",
            Field::TransactionAmount => "transaction_amount",
            Field::TransactionType => "transaction_type",
            Field::SenderKey => "sender_key",
            Field::RecipientKey => "recipient_key",
            Field::MasterKey => "master_key",
            Field::AliasAddress => "alias_address",
            Field::Signature => "signature",
            Field::EncryptionKey => "encryption_key",
            Field::Data => "data",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::RequestId | Field::TransactionId => FieldKind::Id,
            Field::TransactionIds => FieldKind::IdList,
            Field::SenderKey | Field::RecipientKey | Field::MasterKey | Field::AliasAddress => {
                FieldKind::Address
            }
            Field::RequestExpiryTime => FieldKind::Expiry(ExpiryScope::Request),
            Field::TransactionExpiryTime => FieldKind::Expiry(ExpiryScope::Transaction),
            Field::AliasExpiryTime => FieldKind::Expiry(ExpiryScope::Alias),
            Field::TransferAmount | Field::TransactionAmount => FieldKind::Amount,
            Field::TransactionType => FieldKind::TransactionType,
            Field::Signature => FieldKind::Signature,
            Field::Data => FieldKind::EncryptedPayload,
            Field::EncryptionKey => FieldKind::EncryptionKey,
        }
    }

    /// Whether the field takes part in the signed message.
    pub fn is_signed(self) -> bool {
        !matches!(self, Field::Signature | Field::EncryptionKey | Field::Data)
    }
}

/// Inputs a check may depend on besides the value.
pub struct CheckContext<'a> {
    pub now: i64,
    pub policy: &'a LedgerPolicy,
}

/// Pure syntax check: `(field name, value, context) -> reason on failure`.
pub type FieldCheck = fn(&str, &str, &CheckContext<'_>) -> Result<(), String>;

/// Check function for a field kind.
pub fn check_for(kind: FieldKind) -> FieldCheck {
    match kind {
        FieldKind::Id => check_id,
        FieldKind::IdList => check_id_list,
        FieldKind::Address => check_address,
        FieldKind::Expiry(ExpiryScope::Request) => check_request_expiry,
        FieldKind::Expiry(ExpiryScope::Transaction) => check_transaction_expiry,
        FieldKind::Expiry(ExpiryScope::Alias) => check_alias_expiry,
        FieldKind::Amount => check_amount,
        FieldKind::TransactionType => check_transaction_type,
        FieldKind::Signature => check_signature,
        FieldKind::EncryptedPayload => check_encrypted_payload,
        FieldKind::EncryptionKey => check_encryption_key,
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn is_base64(value: &str) -> bool {
    Base64::decode_vec(value).is_ok()
}

/// Whether `value` is a 44-character base64 token decoding to 32 bytes.
pub fn is_address(value: &str) -> bool {
    value.len() == ADDRESS_LENGTH
        && Base64::decode_vec(value).is_ok_and(|bytes| bytes.len() == ADDRESS_BYTES)
}

/// Parse an id list: a JSON array of ids given as strings or integers.
pub fn parse_id_list(value: &str) -> Option<Vec<String>> {
    let items: Vec<serde_json::Value> = serde_json::from_str(value).ok()?;
    Some(
        items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
    )
}

// =============================================================================
// Checks
// =============================================================================

fn check_id(name: &str, value: &str, _ctx: &CheckContext<'_>) -> Result<(), String> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("{name} must be an integer."));
    }
    if value.len() != ID_LENGTH {
        return Err(format!(
            "{name} length is incorrect. It should be exactly {ID_LENGTH} characters."
        ));
    }
    Ok(())
}

fn check_id_list(name: &str, value: &str, ctx: &CheckContext<'_>) -> Result<(), String> {
    let ids = parse_id_list(value).ok_or_else(|| format!("{name} must be a list."))?;
    if ids.is_empty() {
        return Err("Transaction id list is empty.".to_string());
    }
    ids.iter().try_for_each(|id| check_id(name, id, ctx))
}

fn check_address(name: &str, value: &str, _ctx: &CheckContext<'_>) -> Result<(), String> {
    if value.len() != ADDRESS_LENGTH {
        return Err(format!(
            "{name} length is incorrect. It should be exactly {ADDRESS_LENGTH} characters."
        ));
    }
    let bytes = Base64::decode_vec(value).map_err(|_| {
        format!("{name} contains invalid characters. It should only contain base64 digits.")
    })?;
    if bytes.len() != ADDRESS_BYTES {
        return Err(format!(
            "{name} length is incorrect. It should be exactly {ADDRESS_BYTES} bytes."
        ));
    }
    Ok(())
}

fn check_expiry(name: &str, value: &str, now: i64, max_offset: i64) -> Result<(), String> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("{name} must be an integer."));
    }
    let too_far = || format!("{name} is too far in the future. Maximum of {max_offset} seconds.");
    let expiry = value.parse::<i64>().map_err(|_| too_far())?;
    if expiry <= now {
        return Err(format!("{name} must be in the future."));
    }
    if expiry > now.saturating_add(max_offset) {
        return Err(too_far());
    }
    Ok(())
}

fn check_request_expiry(name: &str, value: &str, ctx: &CheckContext<'_>) -> Result<(), String> {
    check_expiry(name, value, ctx.now, ctx.policy.max_request_expiry)
}

fn check_transaction_expiry(name: &str, value: &str, ctx: &CheckContext<'_>) -> Result<(), String> {
    check_expiry(name, value, ctx.now, ctx.policy.max_transaction_expiry)
}

fn check_alias_expiry(name: &str, value: &str, ctx: &CheckContext<'_>) -> Result<(), String> {
    check_expiry(name, value, ctx.now, ctx.policy.max_alias_expiry)
}

fn check_amount(name: &str, value: &str, ctx: &CheckContext<'_>) -> Result<(), String> {
    let policy = ctx.policy;
    let amount =
        Decimal::from_str(value).map_err(|_| format!("{name} must be a valid decimal."))?;
    // Parsing rounds beyond 28 digits, so the text is counted as well
    if amount.normalize().scale() > policy.amount_precision
        || fractional_digits(value) > policy.amount_precision as usize
    {
        return Err(format!(
            "{name} has too many decimal places. Max is {}.",
            policy.amount_precision
        ));
    }
    if amount > policy.max_amount {
        return Err(format!("{name} is too large. Max is {}.", policy.max_amount));
    }
    if amount < policy.min_amount {
        return Err(format!("{name} is too small. Min is {}.", policy.min_amount));
    }
    Ok(())
}

/// Significant fractional digits as written, ignoring trailing zeros.
fn fractional_digits(value: &str) -> usize {
    value
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.trim_end_matches('0').len())
}

fn check_transaction_type(name: &str, value: &str, _ctx: &CheckContext<'_>) -> Result<(), String> {
    TxType::from_str(value)
        .map(|_| ())
        .map_err(|_| format!("{name} must be one of the following: ['SEND', 'RECEIVE']"))
}

fn check_signature(name: &str, value: &str, _ctx: &CheckContext<'_>) -> Result<(), String> {
    if value.len() != SIGNATURE_LENGTH {
        return Err(format!(
            "{name} length is incorrect. It should be exactly {SIGNATURE_LENGTH} characters."
        ));
    }
    if !is_base64(value) {
        return Err(format!(
            "{name} contains invalid characters. It should only contain base64 digits."
        ));
    }
    Ok(())
}

fn check_encrypted_payload(name: &str, value: &str, _ctx: &CheckContext<'_>) -> Result<(), String> {
    if !is_base64(value) {
        return Err(format!(
            "{name} contains invalid characters. It should only contain base64 characters."
        ));
    }
    if value.len() % CIPHERTEXT_CHUNK_SIZE != 0 {
        return Err(format!(
            "{name} length is incorrect. It should be a multiple of {CIPHERTEXT_CHUNK_SIZE}."
        ));
    }
    Ok(())
}

fn check_encryption_key(name: &str, value: &str, _ctx: &CheckContext<'_>) -> Result<(), String> {
    if !is_base64(value) {
        return Err(format!(
            "{name} contains invalid characters. It should only contain base64 characters."
        ));
    }
    if value.len() != PUBLIC_KEY_B64_LEN {
        return Err(format!(
            "{name} length is incorrect. It should be a {PUBLIC_KEY_B64_LEN} characters long."
        ));
    }
    parse_public_key(value)
        .map(|_| ())
        .map_err(|_| format!("{name} is not a valid RSA public key."))
}

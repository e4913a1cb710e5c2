// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Response bodies of the ledger API.
//!
//! Every body is sealed to the caller's `encryption_key` when the request
//! carried a usable one; the schemas below describe the plaintext.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::ledger::WalletInfo;
use crate::storage::{StoredTransaction, TxStatus, TxType};

pub const SUCCESS: &str = "success";

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn success() -> Self {
        Self {
            message: SUCCESS.to_string(),
        }
    }
}

/// Current transport public key.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicKeyResponse {
    /// Base64 DER (SubjectPublicKeyInfo) RSA-2048 public key
    pub key: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateTransactionResponse {
    pub message: String,
    /// 32-digit transaction id
    pub transaction_id: String,
    /// Amount as a decimal string
    pub transaction_amount: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub message: String,
    /// Balance as a decimal string with five fractional digits
    pub balance: String,
}

/// Public view of a stored transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TransactionSummary {
    pub transaction_type: TxType,
    pub transaction_amount: String,
    /// Unix timestamp as a string
    pub expiry_time: String,
    pub status: TxStatus,
}

impl From<&StoredTransaction> for TransactionSummary {
    fn from(tx: &StoredTransaction) -> Self {
        Self {
            transaction_type: tx.transaction_type,
            transaction_amount: tx.amount.to_string(),
            expiry_time: tx.expiry_time.to_string(),
            status: tx.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionsResponse {
    pub message: String,
    /// Found transactions keyed by id; unknown ids are omitted
    pub transactions: BTreeMap<String, TransactionSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalletInfoResponse {
    pub message: String,
    pub balance: String,
    pub transaction_ids: Vec<String>,
    pub aliases: Vec<String>,
}

impl From<WalletInfo> for WalletInfoResponse {
    fn from(info: WalletInfo) -> Self {
        Self {
            message: SUCCESS.to_string(),
            balance: info.balance.to_string(),
            transaction_ids: info.transaction_ids,
            aliases: info.aliases,
        }
    }
}

/// Error body.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    /// Machine readable error code
    pub error_message: String,
}

/// Body sealed to the request's `encryption_key`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SealedResponse {
    /// Concatenated 344-character base64 RSA chunks
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn summary_renders_amount_and_expiry_as_text() {
        let tx = StoredTransaction::new_pending(
            "1".repeat(32),
            TxType::Receive,
            "owner".into(),
            dec!(2.50000),
            1_700_000_000,
        );
        let summary = TransactionSummary::from(&tx);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["transaction_type"], "RECEIVE");
        assert_eq!(json["transaction_amount"], "2.50000");
        assert_eq!(json["expiry_time"], "1700000000");
        assert_eq!(json["status"], "PENDING");
    }

    #[test]
    fn wallet_info_is_a_success_body() {
        let body = WalletInfoResponse::from(WalletInfo {
            balance: dec!(1.00000),
            transaction_ids: vec!["1".repeat(32)],
            aliases: vec![],
        });
        assert_eq!(body.message, "success");
        assert_eq!(body.balance, "1.00000");
    }
}

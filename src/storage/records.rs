// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persisted ledger records.
//!
//! Transactions and aliases are stored as JSON bytes keyed by their id, the
//! same way the store keeps every structured row.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Direction of a pending transaction, seen from its creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxType {
    /// Creator pays whoever completes the transaction.
    Send,
    /// Creator collects from whoever completes the transaction.
    Receive,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Send => "SEND",
            TxType::Receive => "RECEIVE",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SEND" => Ok(TxType::Send),
            "RECEIVE" => Ok(TxType::Receive),
            other => Err(format!("unknown transaction type {other}")),
        }
    }
}

/// Transaction lifecycle status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxStatus {
    /// Waiting for a counterpart to complete it
    #[default]
    Pending,
    /// Completion in progress; never written to storage
    Processing,
    /// Funds moved (terminal)
    Completed,
    /// Read after its expiry without being completed
    Expired,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Pending => "PENDING",
            TxStatus::Processing => "PROCESSING",
            TxStatus::Completed => "COMPLETED",
            TxStatus::Expired => "EXPIRED",
        }
    }
}

/// Stored transaction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTransaction {
    /// 32-digit identifier
    pub transaction_id: String,
    pub transaction_type: TxType,
    /// Owning (creating) address
    pub address: String,
    pub amount: Decimal,
    /// Unix timestamp after which the transaction can no longer complete
    pub expiry_time: i64,
    pub status: TxStatus,
}

impl StoredTransaction {
    /// Create a new pending transaction record.
    pub fn new_pending(
        transaction_id: String,
        transaction_type: TxType,
        address: String,
        amount: Decimal,
        expiry_time: i64,
    ) -> Self {
        Self {
            transaction_id,
            transaction_type,
            address,
            amount,
            expiry_time,
            status: TxStatus::default(),
        }
    }

    pub fn is_past_expiry(&self, now: i64) -> bool {
        self.expiry_time < now
    }

    /// Whether the grace window after expiry has also elapsed.
    pub fn is_past_deletion(&self, now: i64, deletion_delay: i64) -> bool {
        self.expiry_time.saturating_add(deletion_delay) < now
    }

    /// Sending and receiving addresses when `actor` completes this transaction.
    pub fn parties<'a>(&'a self, actor: &'a str) -> (&'a str, &'a str) {
        match self.transaction_type {
            TxType::Send => (self.address.as_str(), actor),
            TxType::Receive => (actor, self.address.as_str()),
        }
    }
}

/// Stored alias row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    /// Address the alias redirects to
    pub main_address: String,
    pub expiry_time: i64,
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Errors raised by the ledger store and the transaction engine.

use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Insufficient balance.")]
    InsufficientBalance,

    #[error("Transaction not found.")]
    TransactionNotFound,

    #[error("Transaction is already completed.")]
    TransactionCompleted,

    #[error("Transaction has expired.")]
    TransactionExpired,

    #[error("Invalid transaction id.")]
    InvalidTransactionId,

    #[error("Invalid alias address.")]
    InvalidAliasAddress,

    #[error("Alias address not found.")]
    AliasNotFound,

    #[error("Request id has already been used.")]
    RequestIdReused,

    #[error("Unknown error occurred while creating transaction. You have not been charged.")]
    IdGenerationExhausted,

    #[error("Storage is busy, retry the request.")]
    Busy,

    #[error("Balance overflow for {0}")]
    BalanceOverflow(String),

    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("data directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("storage task failed: {0}")]
    Task(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    /// Wire error code reported in `error_message`.
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::InsufficientBalance => "insufficient_balance",
            LedgerError::TransactionNotFound => "transaction_not_found",
            LedgerError::TransactionCompleted => "transaction_completed",
            LedgerError::TransactionExpired => "transaction_expired",
            LedgerError::InvalidTransactionId => "invalid_transaction_id",
            LedgerError::InvalidAliasAddress => "invalid_alias_address",
            LedgerError::AliasNotFound => "alias_address_not_found",
            LedgerError::RequestIdReused => "invalid_id",
            LedgerError::IdGenerationExhausted => "unknown_error",
            LedgerError::Busy => "storage_busy",
            _ => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::InsufficientBalance
            | LedgerError::TransactionNotFound
            | LedgerError::TransactionCompleted
            | LedgerError::TransactionExpired
            | LedgerError::InvalidTransactionId
            | LedgerError::InvalidAliasAddress
            | LedgerError::AliasNotFound
            | LedgerError::RequestIdReused => StatusCode::BAD_REQUEST,
            LedgerError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the error reflects the caller's request rather than a fault.
    pub fn is_domain(&self) -> bool {
        self.status_code() == StatusCode::BAD_REQUEST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_bad_request() {
        assert_eq!(LedgerError::InsufficientBalance.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(LedgerError::RequestIdReused.error_code(), "invalid_id");
        assert_eq!(LedgerError::AliasNotFound.error_code(), "alias_address_not_found");
        assert!(LedgerError::TransactionExpired.is_domain());
    }

    #[test]
    fn exhausted_ids_are_fatal() {
        let err = LedgerError::IdGenerationExhausted;
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "unknown_error");
        assert!(!err.is_domain());
    }

    #[test]
    fn busy_is_retryable() {
        assert_eq!(LedgerError::Busy.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(LedgerError::Busy.error_code(), "storage_busy");
    }
}

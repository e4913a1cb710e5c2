// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ledger Storage
//!
//! Persistent ledger state lives in a single redb file under `DATA_DIR`.
//!
//! ## Storage Layout
//!
//! ```text
//! $DATA_DIR/
//!   ledger.redb
//!     balances       address -> balance
//!     transactions   transaction id -> record
//!     aliases        alias -> main address + expiry
//!     request_ids    request id -> expiry
//! ```
//!
//! All mutations go through [`LedgerDb::write`], which makes a multi-step
//! operation (debit, credit, fee, status change) commit or roll back as one
//! unit. Async callers reach the database through [`StoragePool`].

pub mod error;
pub mod ledger_db;
pub mod pool;
pub mod records;

pub use error::{LedgerError, LedgerResult};
pub use ledger_db::{to_ledger_scale, LedgerDb, BALANCE_SCALE};
pub use pool::StoragePool;
pub use records::{AliasRecord, StoredTransaction, TxStatus, TxType};

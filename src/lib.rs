// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Custodial Ledger - single-authority balance ledger service
//!
//! Clients seal every request body with the server's rotating RSA transport
//! key and sign the payload with their Ed25519 master key. The ledger keeps
//! balances, pending SEND/RECEIVE transactions and address aliases in an
//! embedded redb database.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Transport encryption and key rotation
//! - `validation` - Request field checks and signature verification
//! - `idempotency` - Request id replay protection
//! - `ledger` - Transfers, transactions, aliases and fees
//! - `storage` - redb tables and the bounded storage pool
//! - `sweeper` - Periodic removal of expired rows

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod idempotency;
pub mod ledger;
pub mod models;
pub mod state;
pub mod storage;
pub mod sweeper;
pub mod validation;

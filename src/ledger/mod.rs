// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ledger
//!
//! Transaction state machine, fee computation and alias resolution on top of
//! the [`crate::storage`] primitives.
//!
//! ```text
//! PENDING ──complete──▶ (PROCESSING, inside the write) ──▶ COMPLETED
//!    │
//!    └──read after expiry──▶ EXPIRED ──grace window──▶ deleted
//! ```

pub mod engine;
pub mod fees;
pub mod ids;

pub use engine::{LedgerEngine, WalletInfo};
pub use fees::transfer_fee;
pub use ids::{ClockRandomIds, TransactionIdSource};

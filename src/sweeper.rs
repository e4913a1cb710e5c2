// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Expiry Sweeper
//!
//! Background task that periodically reclaims expired rows.
//!
//! ## Strategy
//!
//! Every `interval` (default 10 s) the sweeper issues three short,
//! independently committed deletes:
//! 1. Request ids whose expiry has passed, making them usable again.
//! 2. Transactions whose expiry is older than the deletion delay.
//! 3. Aliases whose expiry has passed.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::storage::ledger_db::{
    delete_aliases_before, delete_request_ids_before, delete_transactions_before,
};
use crate::storage::{LedgerResult, StoragePool};

/// Rows removed by one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub request_ids: usize,
    pub transactions: usize,
    pub aliases: usize,
}

/// Background expiry sweeper.
pub struct Sweeper {
    pool: StoragePool,
    interval: Duration,
    deletion_delay: i64,
}

impl Sweeper {
    pub fn new(pool: StoragePool, interval: Duration, deletion_delay: i64) -> Self {
        Self {
            pool,
            interval,
            deletion_delay,
        }
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "Expiry sweeper starting");

        loop {
            if shutdown.is_cancelled() {
                info!("Expiry sweeper shutting down");
                return;
            }

            let now = chrono::Utc::now().timestamp();
            match self.sweep_step(now).await {
                Ok(report) if report != SweepReport::default() => info!(
                    request_ids = report.request_ids,
                    transactions = report.transactions,
                    aliases = report.aliases,
                    "Expiry sweeper: removed expired rows"
                ),
                Ok(_) => debug!("Expiry sweeper: nothing to remove"),
                Err(e) => warn!(error = %e, "Expiry sweeper: sweep failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Expiry sweeper shutting down");
                    return;
                }
            }
        }
    }

    /// Execute one sweep as of `now`.
    pub async fn sweep_step(&self, now: i64) -> LedgerResult<SweepReport> {
        let request_ids = self
            .pool
            .write(move |db| db.write(|txn| delete_request_ids_before(txn, now)))
            .await?;

        let cutoff = now - self.deletion_delay;
        let transactions = self
            .pool
            .write(move |db| db.write(|txn| delete_transactions_before(txn, cutoff)))
            .await?;

        let aliases = self
            .pool
            .write(move |db| db.write(|txn| delete_aliases_before(txn, now)))
            .await?;

        Ok(SweepReport {
            request_ids,
            transactions,
            aliases,
        })
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bounded access to the ledger database from async handlers.
//!
//! redb calls block, so each unit of work runs on the blocking thread pool.
//! A semaphore caps the number of concurrent sessions and an async gate
//! queues writers before they reach redb's own writer lock. Both waits are
//! bounded by the configured lock timeout; exceeding it yields
//! [`LedgerError::Busy`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

use super::error::{LedgerError, LedgerResult};
use super::ledger_db::LedgerDb;

/// Shared handle to the ledger database.
#[derive(Clone)]
pub struct StoragePool {
    db: Arc<LedgerDb>,
    sessions: Arc<Semaphore>,
    writer: Arc<Mutex<()>>,
    lock_timeout: Duration,
}

impl StoragePool {
    pub fn new(db: LedgerDb, max_sessions: usize, lock_timeout: Duration) -> Self {
        Self {
            db: Arc::new(db),
            sessions: Arc::new(Semaphore::new(max_sessions.max(1))),
            writer: Arc::new(Mutex::new(())),
            lock_timeout,
        }
    }

    /// Number of sessions that can be opened right now.
    pub fn available_sessions(&self) -> usize {
        self.sessions.available_permits()
    }

    async fn session(&self) -> LedgerResult<OwnedSemaphorePermit> {
        let acquire = self.sessions.clone().acquire_owned();
        match tokio::time::timeout(self.lock_timeout, acquire).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_closed)) => Err(LedgerError::Busy),
            Err(_elapsed) => {
                tracing::warn!(
                    timeout_ms = self.lock_timeout.as_millis() as u64,
                    "Timed out waiting for a storage session"
                );
                Err(LedgerError::Busy)
            }
        }
    }

    /// Run read-only work against the database.
    pub async fn read<T, F>(&self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&LedgerDb) -> LedgerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self.session().await?;
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            f(&db)
        })
        .await
        .map_err(|e| LedgerError::Task(e.to_string()))?
    }

    /// Run work that may open write transactions.
    ///
    /// Writers are admitted one at a time.
    pub async fn write<T, F>(&self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&LedgerDb) -> LedgerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self.session().await?;
        let lock = self.writer.clone().lock_owned();
        let gate = match tokio::time::timeout(self.lock_timeout, lock).await {
            Ok(guard) => guard,
            Err(_elapsed) => {
                tracing::warn!(
                    timeout_ms = self.lock_timeout.as_millis() as u64,
                    "Timed out waiting for the ledger write lock"
                );
                return Err(LedgerError::Busy);
            }
        };
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let _gate = gate;
            f(&db)
        })
        .await
        .map_err(|e| LedgerError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ledger_db::change_balance;
    use rust_decimal_macros::dec;

    fn temp_pool(max_sessions: usize, timeout_ms: u64) -> (StoragePool, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = LedgerDb::open(&dir.path().join("pool.redb")).unwrap();
        (StoragePool::new(db, max_sessions, Duration::from_millis(timeout_ms)), dir)
    }

    #[tokio::test]
    async fn write_then_read() {
        let (pool, _dir) = temp_pool(4, 1000);
        pool.write(|db| db.write(|txn| change_balance(txn, "alice", dec!(2))))
            .await
            .unwrap();
        let balance = pool.read(|db| db.balance("alice")).await.unwrap();
        assert_eq!(balance, dec!(2));
        assert_eq!(pool.available_sessions(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn exhausted_sessions_report_busy() {
        let (pool, _dir) = temp_pool(1, 50);

        let holder = pool.clone();
        let slow = tokio::spawn(async move {
            holder
                .read(|_db| {
                    std::thread::sleep(Duration::from_millis(400));
                    Ok(())
                })
                .await
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let err = pool.read(|db| db.balance("alice")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Busy));

        slow.await.unwrap().unwrap();
        assert!(pool.read(|db| db.balance("alice")).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn writers_wait_for_the_gate() {
        let (pool, _dir) = temp_pool(4, 50);

        let holder = pool.clone();
        let slow = tokio::spawn(async move {
            holder
                .write(|_db| {
                    std::thread::sleep(Duration::from_millis(400));
                    Ok(())
                })
                .await
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let err = pool.write(|_db| Ok(())).await.unwrap_err();
        assert!(matches!(err, LedgerError::Busy));
        // Readers are not blocked by the writer gate
        assert!(pool.read(|db| db.balance("alice")).await.is_ok());

        slow.await.unwrap().unwrap();
    }
}

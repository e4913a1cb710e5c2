// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::KeyRing;
use crate::config::{LedgerPolicy, ServerConfig};
use crate::error::ApiError;
use crate::idempotency::IdempotencyGuard;
use crate::ledger::{ClockRandomIds, LedgerEngine, TransactionIdSource};
use crate::storage::{LedgerDb, LedgerResult, StoragePool};
use crate::validation::RequestValidator;

#[derive(Clone)]
pub struct AppState {
    pub keyring: Arc<KeyRing>,
    pub pool: StoragePool,
    pub validator: RequestValidator,
    pub policy: Arc<LedgerPolicy>,
    pub ids: Arc<dyn TransactionIdSource>,
    pub max_request_size: usize,
    pub data_dir: PathBuf,
}

impl AppState {
    pub fn new(config: &ServerConfig, db: LedgerDb, keyring: KeyRing) -> Self {
        let policy = Arc::new(config.policy.clone());
        Self {
            keyring: Arc::new(keyring),
            pool: StoragePool::new(db, config.storage_max_sessions, config.storage_lock_timeout),
            validator: RequestValidator::new(policy.clone()),
            policy,
            ids: Arc::new(ClockRandomIds),
            max_request_size: config.max_request_size,
            data_dir: config.data_dir.clone(),
        }
    }

    /// Replace the transaction id source.
    pub fn with_id_source(mut self, ids: Arc<dyn TransactionIdSource>) -> Self {
        self.ids = ids;
        self
    }

    /// Consume `request_id`, then run `op` against the ledger.
    ///
    /// The id stays consumed when `op` fails.
    pub async fn run_signed<T, F>(
        &self,
        request_id: &str,
        expiry_time: i64,
        op: F,
    ) -> Result<T, ApiError>
    where
        F: FnOnce(&LedgerEngine<'_>) -> LedgerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let policy = self.policy.clone();
        let ids = self.ids.clone();
        let request_id = request_id.to_string();
        self.pool
            .write(move |db| {
                IdempotencyGuard::new(db).consume(&request_id, expiry_time)?;
                op(&LedgerEngine::new(db, &policy, ids.as_ref()))
            })
            .await
            .map_err(ApiError::from)
    }

    /// Run `op` against the ledger without replay protection.
    pub async fn run_unsigned<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&LedgerEngine<'_>) -> LedgerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let policy = self.policy.clone();
        let ids = self.ids.clone();
        self.pool
            .write(move |db| op(&LedgerEngine::new(db, &policy, ids.as_ref())))
            .await
            .map_err(ApiError::from)
    }
}

/// Current unix time in seconds.
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

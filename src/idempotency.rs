// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Replay protection for signed requests.
//!
//! Every signed request carries a client-chosen 32-digit `request_id`. The id
//! is reserved in its own committed write before the requested operation
//! runs, so it stays consumed even when the operation later fails. Reserved
//! ids are reclaimed only by the sweeper once their expiry has passed.

use crate::storage::ledger_db::insert_request_id;
use crate::storage::{LedgerDb, LedgerError, LedgerResult};

/// Exactly-once consumption of request ids.
pub struct IdempotencyGuard<'a> {
    db: &'a LedgerDb,
}

impl<'a> IdempotencyGuard<'a> {
    pub fn new(db: &'a LedgerDb) -> Self {
        Self { db }
    }

    /// Reserve `request_id` until `expiry_time`.
    ///
    /// Fails with [`LedgerError::RequestIdReused`] if the id is still held,
    /// including ids that expired but have not been swept yet.
    pub fn consume(&self, request_id: &str, expiry_time: i64) -> LedgerResult<()> {
        let inserted = self
            .db
            .write(|txn| insert_request_id(txn, request_id, expiry_time))?;
        if inserted {
            Ok(())
        } else {
            tracing::warn!(request_id = %request_id, "Rejected replayed request id");
            Err(LedgerError::RequestIdReused)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ledger_db::delete_request_ids_before;

    fn temp_db() -> (LedgerDb, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = LedgerDb::open(&dir.path().join("ids.redb")).unwrap();
        (db, dir)
    }

    #[test]
    fn id_is_accepted_once() {
        let (db, _dir) = temp_db();
        let guard = IdempotencyGuard::new(&db);
        let id = "7".repeat(32);

        guard.consume(&id, 1_000).unwrap();
        assert!(matches!(guard.consume(&id, 1_000), Err(LedgerError::RequestIdReused)));
    }

    #[test]
    fn expired_id_stays_reserved_until_swept() {
        let (db, _dir) = temp_db();
        let guard = IdempotencyGuard::new(&db);
        let id = "8".repeat(32);
        guard.consume(&id, 1_000).unwrap();

        // Expired but not yet swept
        assert!(matches!(guard.consume(&id, 5_000), Err(LedgerError::RequestIdReused)));

        // A sweep before the expiry leaves it in place
        db.write(|txn| delete_request_ids_before(txn, 1_000)).unwrap();
        assert!(guard.consume(&id, 5_000).is_err());

        db.write(|txn| delete_request_ids_before(txn, 1_001)).unwrap();
        guard.consume(&id, 5_000).unwrap();
    }
}

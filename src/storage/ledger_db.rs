// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded ledger database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `balances`: address → decimal balance text (5 fractional digits)
//! - `transactions`: 32-digit id → serialized StoredTransaction
//! - `aliases`: alias → serialized AliasRecord
//! - `request_ids`: 32-digit request id → expiry timestamp
//!
//! ## Secondary Indexes
//!
//! - `*_expiry_index`: `expiry_be || name` → (), one per expiring table. The
//!   sweeps range-scan everything below the cutoff prefix, so a sweep only
//!   touches rows that are actually expired.
//! - `*_owner_index`: `owner | name` → (), for transactions and aliases. Wallet
//!   summaries are prefix scans over these.
//!
//! Every insert and removal of an indexed row updates its index entries in the
//! same write transaction. The expiry and owner of a stored row never change.
//!
//! redb allows a single write transaction at a time, so every mutation made
//! inside [`LedgerDb::write`] is serialized against all other writers and is
//! committed or rolled back as one unit.

use std::path::Path;

use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition,
    WriteTransaction,
};
use rust_decimal::Decimal;

use super::error::{LedgerError, LedgerResult};
use super::records::{AliasRecord, StoredTransaction};

// =============================================================================
// Table Definitions
// =============================================================================

const BALANCES: TableDefinition<&str, &str> = TableDefinition::new("balances");

const TRANSACTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("transactions");

const ALIASES: TableDefinition<&str, &[u8]> = TableDefinition::new("aliases");

const REQUEST_IDS: TableDefinition<&str, i64> = TableDefinition::new("request_ids");

/// Secondary index: expiry || request id
const REQUEST_EXPIRY_INDEX: TableDefinition<&[u8], ()> =
    TableDefinition::new("request_expiry_index");

/// Secondary index: expiry || transaction id
const TRANSACTION_EXPIRY_INDEX: TableDefinition<&[u8], ()> =
    TableDefinition::new("transaction_expiry_index");

/// Secondary index: owner | transaction id
const TRANSACTION_OWNER_INDEX: TableDefinition<&[u8], ()> =
    TableDefinition::new("transaction_owner_index");

/// Secondary index: expiry || alias
const ALIAS_EXPIRY_INDEX: TableDefinition<&[u8], ()> = TableDefinition::new("alias_expiry_index");

/// Secondary index: main address | alias
const ALIAS_OWNER_INDEX: TableDefinition<&[u8], ()> = TableDefinition::new("alias_owner_index");

type IndexDefinition = TableDefinition<'static, &'static [u8], ()>;

/// Fractional digits kept for every stored balance.
pub const BALANCE_SCALE: u32 = 5;

/// Rescale a decimal to the stored balance precision.
pub fn to_ledger_scale(value: Decimal) -> Decimal {
    let mut scaled = value.round_dp(BALANCE_SCALE);
    scaled.rescale(BALANCE_SCALE);
    scaled
}

// =============================================================================
// Index keys
// =============================================================================

const EXPIRY_PREFIX_LEN: usize = 8;

const OWNER_SEPARATOR: u8 = b'|';

/// Big-endian timestamp with the sign bit flipped, so byte order matches
/// numeric order for negative values too.
fn expiry_prefix(expiry: i64) -> [u8; EXPIRY_PREFIX_LEN] {
    ((expiry as u64) ^ (1 << 63)).to_be_bytes()
}

/// Build an expiry index key: `expiry_be || name`.
fn make_expiry_key(expiry: i64, name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(EXPIRY_PREFIX_LEN + name.len());
    key.extend_from_slice(&expiry_prefix(expiry));
    key.extend_from_slice(name.as_bytes());
    key
}

/// Build a prefix key for range scanning everything indexed under `owner`.
fn make_owner_prefix(owner: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(owner.len() + 1);
    prefix.extend_from_slice(owner.as_bytes());
    prefix.push(OWNER_SEPARATOR);
    prefix
}

/// Build an owner index key: `owner | name`.
fn make_owner_key(owner: &str, name: &str) -> Vec<u8> {
    let mut key = make_owner_prefix(owner);
    key.extend_from_slice(name.as_bytes());
    key
}

/// Exclusive upper bound of an owner prefix scan.
fn make_owner_prefix_end(owner: &str) -> Vec<u8> {
    let mut end = owner.as_bytes().to_vec();
    end.push(OWNER_SEPARATOR + 1);
    end
}

fn key_suffix(key: &[u8], prefix_len: usize) -> LedgerResult<String> {
    let suffix = key.get(prefix_len..).unwrap_or_default();
    String::from_utf8(suffix.to_vec())
        .map_err(|e| LedgerError::CorruptRecord(format!("index key: {e}")))
}

fn add_index_entries(
    txn: &WriteTransaction,
    expiry_index: IndexDefinition,
    owner_index: Option<IndexDefinition>,
    name: &str,
    expiry: i64,
    owner: &str,
) -> LedgerResult<()> {
    let mut by_expiry = txn.open_table(expiry_index)?;
    by_expiry.insert(make_expiry_key(expiry, name).as_slice(), ())?;
    if let Some(owner_index) = owner_index {
        let mut by_owner = txn.open_table(owner_index)?;
        by_owner.insert(make_owner_key(owner, name).as_slice(), ())?;
    }
    Ok(())
}

fn remove_index_entries(
    txn: &WriteTransaction,
    expiry_index: IndexDefinition,
    owner_index: Option<IndexDefinition>,
    name: &str,
    expiry: i64,
    owner: &str,
) -> LedgerResult<()> {
    let mut by_expiry = txn.open_table(expiry_index)?;
    by_expiry.remove(make_expiry_key(expiry, name).as_slice())?;
    if let Some(owner_index) = owner_index {
        let mut by_owner = txn.open_table(owner_index)?;
        by_owner.remove(make_owner_key(owner, name).as_slice())?;
    }
    Ok(())
}

/// Names indexed with an expiry strictly before `cutoff`, oldest first.
fn expired_before(
    txn: &WriteTransaction,
    expiry_index: IndexDefinition,
    cutoff: i64,
) -> LedgerResult<Vec<String>> {
    let table = txn.open_table(expiry_index)?;
    let bound = expiry_prefix(cutoff);
    let mut names = Vec::new();
    for entry in table.range(..bound.as_slice())? {
        let (key, _) = entry?;
        names.push(key_suffix(key.value(), EXPIRY_PREFIX_LEN)?);
    }
    Ok(names)
}

/// Names indexed under `owner`, ascending.
fn owned_by(
    txn: &ReadTransaction,
    owner_index: IndexDefinition,
    owner: &str,
) -> LedgerResult<Vec<String>> {
    let table = txn.open_table(owner_index)?;
    let prefix = make_owner_prefix(owner);
    let end = make_owner_prefix_end(owner);
    let mut names = Vec::new();
    for entry in table.range(prefix.as_slice()..end.as_slice())? {
        let (key, _) = entry?;
        names.push(key_suffix(key.value(), prefix.len())?);
    }
    Ok(names)
}

// =============================================================================
// LedgerDb
// =============================================================================

/// Embedded ACID ledger database.
pub struct LedgerDb {
    db: Database,
}

impl LedgerDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> LedgerResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(BALANCES)?;
            let _ = write_txn.open_table(TRANSACTIONS)?;
            let _ = write_txn.open_table(ALIASES)?;
            let _ = write_txn.open_table(REQUEST_IDS)?;
            let _ = write_txn.open_table(REQUEST_EXPIRY_INDEX)?;
            let _ = write_txn.open_table(TRANSACTION_EXPIRY_INDEX)?;
            let _ = write_txn.open_table(TRANSACTION_OWNER_INDEX)?;
            let _ = write_txn.open_table(ALIAS_EXPIRY_INDEX)?;
            let _ = write_txn.open_table(ALIAS_OWNER_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Run `f` inside one write transaction.
    ///
    /// Commits when `f` succeeds; rolls back every change it made otherwise.
    pub fn write<T, F>(&self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&WriteTransaction) -> LedgerResult<T>,
    {
        let txn = self.db.begin_write()?;
        match f(&txn) {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = txn.abort() {
                    tracing::warn!(error = %abort_err, "Failed to abort ledger write transaction");
                }
                Err(err)
            }
        }
    }

    /// Run `f` against a consistent read snapshot.
    pub fn read<T, F>(&self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&ReadTransaction) -> LedgerResult<T>,
    {
        let txn = self.db.begin_read()?;
        f(&txn)
    }

    /// Current balance of `address`, zero when it has never been referenced.
    pub fn balance(&self, address: &str) -> LedgerResult<Decimal> {
        self.read(|txn| read_balance(txn, address))
    }

    /// Resolve an alias to its main address; unknown tokens resolve to themselves.
    pub fn resolve(&self, token: &str) -> LedgerResult<String> {
        self.read(|txn| {
            let table = txn.open_table(ALIASES)?;
            Ok(lookup_alias(&table, token)?
                .map(|record| record.main_address)
                .unwrap_or_else(|| token.to_string()))
        })
    }
}

// =============================================================================
// Balances
// =============================================================================

fn parse_balance(address: &str, raw: &str) -> LedgerResult<Decimal> {
    raw.parse::<Decimal>()
        .map_err(|e| LedgerError::CorruptRecord(format!("balance of {address}: {e}")))
}

/// Apply `delta` to the balance of `address` and return the new balance.
///
/// The row is created with a zero balance on first reference. A debit larger
/// than the current balance fails with [`LedgerError::InsufficientBalance`]
/// and leaves the row untouched.
pub fn change_balance(
    txn: &WriteTransaction,
    address: &str,
    delta: Decimal,
) -> LedgerResult<Decimal> {
    let mut table = txn.open_table(BALANCES)?;

    let current = match table.get(address)? {
        Some(value) => parse_balance(address, value.value())?,
        None => Decimal::ZERO,
    };

    if delta.is_sign_negative() && current < -delta {
        return Err(LedgerError::InsufficientBalance);
    }

    let updated = current
        .checked_add(delta)
        .ok_or_else(|| LedgerError::BalanceOverflow(address.to_string()))?;
    let updated = to_ledger_scale(updated);

    let text = updated.to_string();
    table.insert(address, text.as_str())?;
    Ok(updated)
}

/// Balance of `address` inside a read snapshot.
pub fn read_balance(txn: &ReadTransaction, address: &str) -> LedgerResult<Decimal> {
    let table = txn.open_table(BALANCES)?;
    match table.get(address)? {
        Some(value) => parse_balance(address, value.value()),
        None => Ok(to_ledger_scale(Decimal::ZERO)),
    }
}

// =============================================================================
// Transactions
// =============================================================================

/// Insert a transaction unless its id is already taken.
///
/// Returns `false` on an id collision, which is the uniqueness constraint of
/// the transactions table.
pub fn insert_transaction(txn: &WriteTransaction, tx: &StoredTransaction) -> LedgerResult<bool> {
    {
        let mut table = txn.open_table(TRANSACTIONS)?;
        if table.get(tx.transaction_id.as_str())?.is_some() {
            return Ok(false);
        }
        let json = serde_json::to_vec(tx)?;
        table.insert(tx.transaction_id.as_str(), json.as_slice())?;
    }
    add_index_entries(
        txn,
        TRANSACTION_EXPIRY_INDEX,
        Some(TRANSACTION_OWNER_INDEX),
        &tx.transaction_id,
        tx.expiry_time,
        &tx.address,
    )?;
    Ok(true)
}

/// Load a transaction inside a write transaction.
pub fn load_transaction(
    txn: &WriteTransaction,
    transaction_id: &str,
) -> LedgerResult<Option<StoredTransaction>> {
    let table = txn.open_table(TRANSACTIONS)?;
    let found = match table.get(transaction_id)? {
        Some(value) => Some(serde_json::from_slice(value.value())?),
        None => None,
    };
    Ok(found)
}

/// Overwrite the status of an existing transaction record.
pub fn store_transaction(txn: &WriteTransaction, tx: &StoredTransaction) -> LedgerResult<()> {
    let mut table = txn.open_table(TRANSACTIONS)?;
    let json = serde_json::to_vec(tx)?;
    table.insert(tx.transaction_id.as_str(), json.as_slice())?;
    Ok(())
}

/// Delete a transaction, returning whether a row existed.
pub fn remove_transaction(txn: &WriteTransaction, transaction_id: &str) -> LedgerResult<bool> {
    let removed: Option<StoredTransaction> = {
        let mut table = txn.open_table(TRANSACTIONS)?;
        let decoded = match table.remove(transaction_id)? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        decoded
    };
    let Some(tx) = removed else {
        return Ok(false);
    };
    remove_index_entries(
        txn,
        TRANSACTION_EXPIRY_INDEX,
        Some(TRANSACTION_OWNER_INDEX),
        transaction_id,
        tx.expiry_time,
        &tx.address,
    )?;
    Ok(true)
}

/// Ids of every transaction created by `address`, ascending.
pub fn transactions_owned_by(txn: &ReadTransaction, address: &str) -> LedgerResult<Vec<String>> {
    owned_by(txn, TRANSACTION_OWNER_INDEX, address)
}

// =============================================================================
// Aliases
// =============================================================================

fn lookup_alias<T>(table: &T, alias: &str) -> LedgerResult<Option<AliasRecord>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    match table.get(alias)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

/// Resolve `token` inside a write transaction.
pub fn resolve_alias(txn: &WriteTransaction, token: &str) -> LedgerResult<String> {
    let table = txn.open_table(ALIASES)?;
    Ok(lookup_alias(&table, token)?
        .map(|record| record.main_address)
        .unwrap_or_else(|| token.to_string()))
}

/// Insert an alias unless it is already registered.
pub fn insert_alias(
    txn: &WriteTransaction,
    alias: &str,
    record: &AliasRecord,
) -> LedgerResult<bool> {
    {
        let mut table = txn.open_table(ALIASES)?;
        if table.get(alias)?.is_some() {
            return Ok(false);
        }
        let json = serde_json::to_vec(record)?;
        table.insert(alias, json.as_slice())?;
    }
    add_index_entries(
        txn,
        ALIAS_EXPIRY_INDEX,
        Some(ALIAS_OWNER_INDEX),
        alias,
        record.expiry_time,
        &record.main_address,
    )?;
    Ok(true)
}

/// Delete an alias, returning whether a row existed.
pub fn remove_alias(txn: &WriteTransaction, alias: &str) -> LedgerResult<bool> {
    let removed: Option<AliasRecord> = {
        let mut table = txn.open_table(ALIASES)?;
        let decoded = match table.remove(alias)? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        decoded
    };
    let Some(record) = removed else {
        return Ok(false);
    };
    remove_index_entries(
        txn,
        ALIAS_EXPIRY_INDEX,
        Some(ALIAS_OWNER_INDEX),
        alias,
        record.expiry_time,
        &record.main_address,
    )?;
    Ok(true)
}

/// Aliases redirecting to `main_address`, ascending.
pub fn aliases_of(txn: &ReadTransaction, main_address: &str) -> LedgerResult<Vec<String>> {
    owned_by(txn, ALIAS_OWNER_INDEX, main_address)
}

// =============================================================================
// Request ids
// =============================================================================

/// Reserve a request id until `expiry_time`; `false` if it is already held.
pub fn insert_request_id(
    txn: &WriteTransaction,
    request_id: &str,
    expiry_time: i64,
) -> LedgerResult<bool> {
    {
        let mut table = txn.open_table(REQUEST_IDS)?;
        if table.get(request_id)?.is_some() {
            return Ok(false);
        }
        table.insert(request_id, expiry_time)?;
    }
    add_index_entries(txn, REQUEST_EXPIRY_INDEX, None, request_id, expiry_time, "")?;
    Ok(true)
}

fn remove_request_id(txn: &WriteTransaction, request_id: &str) -> LedgerResult<bool> {
    let removed = {
        let mut table = txn.open_table(REQUEST_IDS)?;
        let expiry = table.remove(request_id)?.map(|expiry| expiry.value());
        expiry
    };
    let Some(expiry_time) = removed else {
        return Ok(false);
    };
    remove_index_entries(txn, REQUEST_EXPIRY_INDEX, None, request_id, expiry_time, "")?;
    Ok(true)
}

// =============================================================================
// Expiry sweeps
// =============================================================================

fn sweep<F>(
    txn: &WriteTransaction,
    expiry_index: IndexDefinition,
    cutoff: i64,
    remove: F,
) -> LedgerResult<usize>
where
    F: Fn(&WriteTransaction, &str) -> LedgerResult<bool>,
{
    let mut removed = 0;
    for name in expired_before(txn, expiry_index, cutoff)? {
        if remove(txn, &name)? {
            removed += 1;
        }
    }
    Ok(removed)
}

/// Delete request ids whose expiry is before `cutoff`.
pub fn delete_request_ids_before(txn: &WriteTransaction, cutoff: i64) -> LedgerResult<usize> {
    sweep(txn, REQUEST_EXPIRY_INDEX, cutoff, remove_request_id)
}

/// Delete transactions whose expiry is before `cutoff`.
pub fn delete_transactions_before(txn: &WriteTransaction, cutoff: i64) -> LedgerResult<usize> {
    sweep(txn, TRANSACTION_EXPIRY_INDEX, cutoff, remove_transaction)
}

/// Delete aliases whose expiry is before `cutoff`.
pub fn delete_aliases_before(txn: &WriteTransaction, cutoff: i64) -> LedgerResult<usize> {
    sweep(txn, ALIAS_EXPIRY_INDEX, cutoff, remove_alias)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::records::TxType;
    use rust_decimal_macros::dec;

    fn temp_db() -> (LedgerDb, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = LedgerDb::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn sample_tx(id: &str, owner: &str, expiry_time: i64) -> StoredTransaction {
        StoredTransaction::new_pending(
            id.to_string(),
            TxType::Send,
            owner.to_string(),
            dec!(3),
            expiry_time,
        )
    }

    fn alias_of(main_address: &str, expiry_time: i64) -> AliasRecord {
        AliasRecord {
            main_address: main_address.to_string(),
            expiry_time,
        }
    }

    #[test]
    fn unknown_address_has_zero_balance() {
        let (db, _dir) = temp_db();
        assert_eq!(db.balance("nobody").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn credit_then_debit() {
        let (db, _dir) = temp_db();
        db.write(|txn| change_balance(txn, "alice", dec!(10))).unwrap();
        let after = db.write(|txn| change_balance(txn, "alice", dec!(-2.5))).unwrap();
        assert_eq!(after, dec!(7.5));
        assert_eq!(db.balance("alice").unwrap().to_string(), "7.50000");
    }

    #[test]
    fn overdraft_fails_without_mutation() {
        let (db, _dir) = temp_db();
        db.write(|txn| change_balance(txn, "alice", dec!(1))).unwrap();

        let err = db
            .write(|txn| change_balance(txn, "alice", dec!(-1.00001)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance));
        assert_eq!(db.balance("alice").unwrap(), dec!(1));
    }

    #[test]
    fn debit_of_unknown_address_is_insufficient() {
        let (db, _dir) = temp_db();
        let err = db.write(|txn| change_balance(txn, "ghost", dec!(-0.00001))).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance));
    }

    #[test]
    fn failed_write_rolls_back_earlier_steps() {
        let (db, _dir) = temp_db();
        db.write(|txn| change_balance(txn, "alice", dec!(5))).unwrap();

        let result = db.write(|txn| {
            change_balance(txn, "alice", dec!(-5))?;
            change_balance(txn, "bob", dec!(5))?;
            change_balance(txn, "carol", dec!(-1))
        });
        assert!(matches!(result, Err(LedgerError::InsufficientBalance)));
        assert_eq!(db.balance("alice").unwrap(), dec!(5));
        assert_eq!(db.balance("bob").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn transaction_ids_are_unique() {
        let (db, _dir) = temp_db();
        let id = "1".repeat(32);
        assert!(db.write(|txn| insert_transaction(txn, &sample_tx(&id, "a", 10))).unwrap());
        assert!(!db.write(|txn| insert_transaction(txn, &sample_tx(&id, "b", 20))).unwrap());

        let stored = db.write(|txn| load_transaction(txn, &id)).unwrap().unwrap();
        assert_eq!(stored.address, "a");
    }

    #[test]
    fn remove_reports_existence() {
        let (db, _dir) = temp_db();
        let id = "2".repeat(32);
        db.write(|txn| insert_transaction(txn, &sample_tx(&id, "a", 10))).unwrap();
        assert!(db.write(|txn| remove_transaction(txn, &id)).unwrap());
        assert!(!db.write(|txn| remove_transaction(txn, &id)).unwrap());
    }

    #[test]
    fn owned_transactions_and_aliases_are_listed() {
        let (db, _dir) = temp_db();
        db.write(|txn| {
            insert_transaction(txn, &sample_tx(&"3".repeat(32), "alice", 10))?;
            insert_transaction(txn, &sample_tx(&"4".repeat(32), "bob", 10))?;
            insert_alias(txn, "alias-1", &alias_of("alice", 10))?;
            insert_alias(txn, "alias-2", &alias_of("bob", 10))
        })
        .unwrap();

        let (txs, aliases) = db
            .read(|txn| Ok((transactions_owned_by(txn, "alice")?, aliases_of(txn, "alice")?)))
            .unwrap();
        assert_eq!(txs, vec!["3".repeat(32)]);
        assert_eq!(aliases, vec!["alias-1".to_string()]);
    }

    #[test]
    fn alias_resolution() {
        let (db, _dir) = temp_db();
        assert_eq!(db.resolve("token").unwrap(), "token");

        let record = alias_of("main", 100);
        assert!(db.write(|txn| insert_alias(txn, "token", &record)).unwrap());
        assert!(!db.write(|txn| insert_alias(txn, "token", &record)).unwrap());
        assert_eq!(db.resolve("token").unwrap(), "main");

        assert!(db.write(|txn| remove_alias(txn, "token")).unwrap());
        assert_eq!(db.resolve("token").unwrap(), "token");
    }

    #[test]
    fn sweeps_only_delete_rows_before_cutoff() {
        let (db, _dir) = temp_db();
        db.write(|txn| {
            insert_request_id(txn, "old", 99)?;
            insert_request_id(txn, "edge", 100)?;
            insert_transaction(txn, &sample_tx(&"5".repeat(32), "a", 50))?;
            insert_transaction(txn, &sample_tx(&"6".repeat(32), "a", 150))?;
            insert_alias(txn, "gone", &alias_of("a", 10))?;
            insert_alias(txn, "kept", &alias_of("a", 1_000))
        })
        .unwrap();

        assert_eq!(db.write(|txn| delete_request_ids_before(txn, 100)).unwrap(), 1);
        assert_eq!(db.write(|txn| delete_transactions_before(txn, 100)).unwrap(), 1);
        assert_eq!(db.write(|txn| delete_aliases_before(txn, 100)).unwrap(), 1);

        assert!(!db.write(|txn| insert_request_id(txn, "edge", 200)).unwrap());
        assert!(db.write(|txn| insert_request_id(txn, "old", 200)).unwrap());
        assert_eq!(db.resolve("kept").unwrap(), "a");
        assert_eq!(db.resolve("gone").unwrap(), "gone");
    }

    #[test]
    fn ledger_scale_rounds_and_pads() {
        assert_eq!(to_ledger_scale(dec!(1)).to_string(), "1.00000");
        assert_eq!(to_ledger_scale(dec!(0.123456)).to_string(), "0.12346");
    }

    #[test]
    fn expiry_keys_sort_numerically() {
        assert!(make_expiry_key(-5, "b") < make_expiry_key(3, "a"));
        assert!(make_expiry_key(3, "z") < make_expiry_key(4, "a"));
        assert!(make_expiry_key(i64::MAX, "") > make_expiry_key(0, "zzz"));
        assert!(make_expiry_key(7, "id") > expiry_prefix(7).to_vec());
    }

    #[test]
    fn owner_listing_does_not_leak_across_shared_prefixes() {
        let (db, _dir) = temp_db();
        db.write(|txn| {
            insert_transaction(txn, &sample_tx(&"7".repeat(32), "alice", 10))?;
            insert_transaction(txn, &sample_tx(&"8".repeat(32), "alice2", 10))?;
            insert_alias(txn, "x", &alias_of("alice2", 10))
        })
        .unwrap();

        let (txs, aliases) = db
            .read(|txn| Ok((transactions_owned_by(txn, "alice")?, aliases_of(txn, "alice")?)))
            .unwrap();
        assert_eq!(txs, vec!["7".repeat(32)]);
        assert!(aliases.is_empty());
    }

    #[test]
    fn removal_clears_index_entries() {
        let (db, _dir) = temp_db();
        let id = "9".repeat(32);
        db.write(|txn| {
            insert_transaction(txn, &sample_tx(&id, "alice", 10))?;
            insert_alias(txn, "a1", &alias_of("alice", 10))
        })
        .unwrap();
        db.write(|txn| {
            remove_transaction(txn, &id)?;
            remove_alias(txn, "a1")
        })
        .unwrap();

        let (txs, aliases) = db
            .read(|txn| Ok((transactions_owned_by(txn, "alice")?, aliases_of(txn, "alice")?)))
            .unwrap();
        assert!(txs.is_empty());
        assert!(aliases.is_empty());

        assert_eq!(db.write(|txn| delete_transactions_before(txn, 100)).unwrap(), 0);
        assert_eq!(db.write(|txn| delete_aliases_before(txn, 100)).unwrap(), 0);
    }

    #[test]
    fn sweep_leaves_unexpired_rows_listed() {
        let (db, _dir) = temp_db();
        db.write(|txn| {
            for n in 0..50i64 {
                let id = format!("{n:032}");
                insert_transaction(txn, &sample_tx(&id, "alice", n))?;
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(db.write(|txn| delete_transactions_before(txn, 40)).unwrap(), 40);
        let txs = db.read(|txn| transactions_owned_by(txn, "alice")).unwrap();
        assert_eq!(txs.len(), 10);
        assert_eq!(txs[0], format!("{:032}", 40));
    }

    #[test]
    fn open_reports_unusable_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let result = LedgerDb::open(&blocker.join("ledger.redb"));
        assert!(matches!(result, Err(LedgerError::Io(_))));
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction engine.
//!
//! Every operation runs inside a single [`LedgerDb::write`] (or read)
//! transaction: balance changes, fee credits and status updates either all
//! land or none do. A failing step therefore doubles as a refund of every
//! fee charged earlier in the same operation.

use std::collections::BTreeMap;

use redb::WriteTransaction;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::fees::transfer_fee;
use super::ids::TransactionIdSource;
use crate::config::LedgerPolicy;
use crate::storage::ledger_db::{self as store, change_balance};
use crate::storage::{
    to_ledger_scale, AliasRecord, LedgerDb, LedgerError, LedgerResult, StoredTransaction, TxStatus,
    TxType,
};

/// Cross-table summary of one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletInfo {
    pub balance: Decimal,
    /// Transactions created by the address, ascending by id
    pub transaction_ids: Vec<String>,
    /// Aliases redirecting to the address, ascending
    pub aliases: Vec<String>,
}

/// Ledger operations over one database handle.
pub struct LedgerEngine<'a> {
    db: &'a LedgerDb,
    policy: &'a LedgerPolicy,
    ids: &'a dyn TransactionIdSource,
}

impl<'a> LedgerEngine<'a> {
    pub fn new(
        db: &'a LedgerDb,
        policy: &'a LedgerPolicy,
        ids: &'a dyn TransactionIdSource,
    ) -> Self {
        Self { db, policy, ids }
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    /// Move `amount` from `sender` to `recipient`, both resolved through
    /// aliases. Returns the fee credited to the admin address.
    pub fn transfer(
        &self,
        sender: &str,
        recipient: &str,
        amount: Decimal,
    ) -> LedgerResult<Decimal> {
        let fee = self.db.write(|txn| {
            let from = store::resolve_alias(txn, sender)?;
            let to = store::resolve_alias(txn, recipient)?;
            self.move_funds(txn, &from, &to, amount)
        })?;

        info!(
            sender = %sender,
            recipient = %recipient,
            amount = %amount,
            fee = %fee,
            "Transfer completed"
        );
        Ok(fee)
    }

    /// Debit `from` the full amount, credit the fee to admin and the rest to `to`.
    fn move_funds(
        &self,
        txn: &WriteTransaction,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> LedgerResult<Decimal> {
        change_balance(txn, from, -amount)?;
        let fee = transfer_fee(amount, self.policy);
        change_balance(txn, &self.policy.admin_address, fee)?;
        change_balance(txn, to, amount - fee)?;
        Ok(fee)
    }

    fn charge_fee(&self, txn: &WriteTransaction, payer: &str, fee: Decimal) -> LedgerResult<()> {
        change_balance(txn, payer, -fee)?;
        change_balance(txn, &self.policy.admin_address, fee)?;
        Ok(())
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Open a PENDING transaction owned by `owner`, charging the creation fee.
    pub fn insert_transaction(
        &self,
        transaction_type: TxType,
        owner: &str,
        amount: Decimal,
        expiry_time: i64,
    ) -> LedgerResult<StoredTransaction> {
        let amount = to_ledger_scale(amount);
        let result = self.db.write(|txn| {
            self.charge_fee(txn, owner, self.policy.transaction_creation_fee)?;

            for attempt in 1..=self.policy.id_generation_attempts {
                let tx = StoredTransaction::new_pending(
                    self.ids.next_id(),
                    transaction_type,
                    owner.to_string(),
                    amount,
                    expiry_time,
                );
                if store::insert_transaction(txn, &tx)? {
                    return Ok(tx);
                }
                warn!(attempt, "Transaction id collision, retrying");
            }
            Err(LedgerError::IdGenerationExhausted)
        });

        match &result {
            Ok(tx) => info!(
                transaction_id = %tx.transaction_id,
                address = %owner,
                transaction_type = %transaction_type,
                amount = %amount,
                "Transaction created"
            ),
            Err(LedgerError::IdGenerationExhausted) => error!(
                address = %owner,
                attempts = self.policy.id_generation_attempts,
                "Could not generate a unique transaction id, creation fee refunded"
            ),
            Err(_) => {}
        }
        result
    }

    /// Complete a PENDING transaction on behalf of `actor`.
    ///
    /// SEND transactions pay `actor`; RECEIVE transactions charge `actor`.
    /// If the paying side cannot cover the amount the transaction stays
    /// PENDING. PROCESSING exists only inside the write transaction below and
    /// is never stored.
    pub fn complete_transaction(
        &self,
        transaction_id: &str,
        actor: &str,
        now: i64,
    ) -> LedgerResult<StoredTransaction> {
        let (tx, fee) = self.db.write(|txn| {
            let mut tx = store::load_transaction(txn, transaction_id)?
                .ok_or(LedgerError::TransactionNotFound)?;

            match tx.status {
                TxStatus::Completed => return Err(LedgerError::TransactionCompleted),
                TxStatus::Expired => return Err(LedgerError::TransactionExpired),
                _ if tx.is_past_expiry(now) => return Err(LedgerError::TransactionExpired),
                _ => {}
            }

            let (from, to) = tx.parties(actor);
            let (from, to) = (from.to_string(), to.to_string());
            let fee = self.move_funds(txn, &from, &to, tx.amount)?;

            tx.status = TxStatus::Completed;
            store::store_transaction(txn, &tx)?;
            Ok((tx, fee))
        })?;

        info!(
            transaction_id = %transaction_id,
            address = %actor,
            amount = %tx.amount,
            fee = %fee,
            "Transaction completed"
        );
        Ok(tx)
    }

    /// Read one transaction, applying expiry on the way.
    fn observe(
        &self,
        txn: &WriteTransaction,
        transaction_id: &str,
        now: i64,
    ) -> LedgerResult<Option<StoredTransaction>> {
        let Some(mut tx) = store::load_transaction(txn, transaction_id)? else {
            return Ok(None);
        };

        if tx.status == TxStatus::Pending && tx.is_past_expiry(now) {
            tx.status = TxStatus::Expired;
            if tx.is_past_deletion(now, self.policy.deletion_delay) {
                store::remove_transaction(txn, transaction_id)?;
                debug!(transaction_id = %transaction_id, "Deleted expired transaction on read");
            } else {
                store::store_transaction(txn, &tx)?;
            }
        }
        Ok(Some(tx))
    }

    /// Current state of a transaction.
    ///
    /// A PENDING transaction read after its expiry is reported (and stored) as
    /// EXPIRED; once the deletion delay has also passed the row is removed
    /// but this read still reports it as EXPIRED.
    pub fn get_transaction(
        &self,
        transaction_id: &str,
        now: i64,
    ) -> LedgerResult<StoredTransaction> {
        self.db
            .write(|txn| self.observe(txn, transaction_id, now))?
            .ok_or(LedgerError::TransactionNotFound)
    }

    /// Batch form of [`Self::get_transaction`]; unknown ids are left out.
    pub fn get_transactions(
        &self,
        transaction_ids: &[String],
        now: i64,
    ) -> LedgerResult<BTreeMap<String, StoredTransaction>> {
        self.db.write(|txn| {
            let mut found = BTreeMap::new();
            for id in transaction_ids {
                if let Some(tx) = self.observe(txn, id, now)? {
                    found.insert(id.clone(), tx);
                }
            }
            Ok(found)
        })
    }

    /// Delete a transaction. Only its owner may do so; a missing row is
    /// reported the same way as a foreign one.
    pub fn delete_transaction(&self, transaction_id: &str, actor: &str) -> LedgerResult<()> {
        self.db.write(|txn| match store::load_transaction(txn, transaction_id)? {
            Some(tx) if tx.address == actor => {
                store::remove_transaction(txn, transaction_id)?;
                Ok(())
            }
            _ => Err(LedgerError::InvalidTransactionId),
        })?;

        info!(transaction_id = %transaction_id, address = %actor, "Transaction deleted");
        Ok(())
    }

    // =========================================================================
    // Aliases
    // =========================================================================

    pub fn resolve(&self, token: &str) -> LedgerResult<String> {
        self.db.resolve(token)
    }

    /// Register `alias` for `owner` until `expiry_time`, charging the alias fee.
    pub fn add_alias(&self, alias: &str, owner: &str, expiry_time: i64) -> LedgerResult<()> {
        self.db.write(|txn| {
            self.charge_fee(txn, owner, self.policy.alias_creation_fee)?;
            let record = AliasRecord {
                main_address: owner.to_string(),
                expiry_time,
            };
            if !store::insert_alias(txn, alias, &record)? {
                return Err(LedgerError::InvalidAliasAddress);
            }
            Ok(())
        })?;

        info!(alias = %alias, address = %owner, expiry_time, "Alias added");
        Ok(())
    }

    /// Remove `alias` if it currently points at `actor`.
    pub fn delete_alias(&self, alias: &str, actor: &str) -> LedgerResult<()> {
        self.db.write(|txn| {
            if store::resolve_alias(txn, alias)? != actor {
                return Err(LedgerError::AliasNotFound);
            }
            if !store::remove_alias(txn, alias)? {
                return Err(LedgerError::AliasNotFound);
            }
            Ok(())
        })?;

        info!(alias = %alias, address = %actor, "Alias deleted");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get_balance(&self, address: &str) -> LedgerResult<Decimal> {
        self.db.balance(address)
    }

    pub fn wallet_info(&self, address: &str) -> LedgerResult<WalletInfo> {
        self.db.read(|txn| {
            Ok(WalletInfo {
                balance: store::read_balance(txn, address)?,
                transaction_ids: store::transactions_owned_by(txn, address)?,
                aliases: store::aliases_of(txn, address)?,
            })
        })
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Points Ledger Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Points ledger coordinator.
//!
//! The [`Ledger`] ties the entry log and the account store together: every
//! mutation of an entry commits together with the matching balance
//! adjustment, as one atomic unit against the entry's account.
//!
//! # Mutation template
//!
//! All three mutations run the same shape:
//!
//! 1. precondition checks (positive points, row exists) — fail fast;
//! 2. exclusive lock on the target account row;
//! 3. signed net delta, derived from the authoritative entry state read
//!    under the lock;
//! 4. reject with [`LedgerError::InsufficientBalance`] if the delta would
//!    take the balance below zero;
//! 5. entry mutation, then balance adjustment; the lock is released at
//!    return, which is the commit point.
//!
//! The entry mutation runs strictly before the balance write, so a storage
//! failure aborts the whole operation with nothing applied.
//!
//! # Concurrency
//!
//! Mutations on the same account serialize on its row lock; mutations on
//! different accounts never contend. Observable balance order equals lock
//! acquisition order.

use crate::account::{Account, AccountStore};
use crate::base::{AccountId, EntryId};
use crate::entry::{EntryKind, LedgerEntry};
use crate::entry_log::{EntryStore, MemoryEntryLog};
use crate::error::LedgerError;
use std::sync::Arc;
use tracing::debug;

/// Coordinator for point transactions and account balances.
///
/// # Invariants
///
/// After every committed operation, for every account:
/// `balance == Σ points(EARNED) − Σ points(REDEEMED)` over the account's
/// current entries, and `balance >= 0`.
#[derive(Debug, Default)]
pub struct Ledger<S: EntryStore = MemoryEntryLog> {
    accounts: AccountStore,
    entries: S,
}

impl Ledger<MemoryEntryLog> {
    /// Creates a ledger with no accounts and an empty in-memory entry log.
    pub fn new() -> Self {
        Self::with_store(MemoryEntryLog::new())
    }
}

impl<S: EntryStore> Ledger<S> {
    /// Creates a ledger on top of an existing entry store.
    pub fn with_store(entries: S) -> Self {
        Ledger {
            accounts: AccountStore::new(),
            entries,
        }
    }

    // === Account surface ===

    /// Opens a zero-balance account, as part of registering a member.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AccountExists`] for a duplicate ID.
    pub fn open_account(&self, id: AccountId) -> Result<(), LedgerError> {
        self.accounts.open(id)?;
        debug!(account = %id, "account opened");
        Ok(())
    }

    pub fn account_exists(&self, id: AccountId) -> bool {
        self.accounts.contains(id)
    }

    /// Current committed balance of an account.
    pub fn balance(&self, id: AccountId) -> Result<i64, LedgerError> {
        self.accounts.balance(id)
    }

    /// Snapshot of all account rows, ordered by account ID.
    pub fn accounts(&self) -> Vec<Arc<Account>> {
        self.accounts.all()
    }

    // === Entry read surface ===

    /// Fetches one ledger entry.
    pub fn entry(&self, id: EntryId) -> Result<LedgerEntry, LedgerError> {
        self.entries.get(id)
    }

    /// All entries for an account, newest first. Empty for unknown accounts.
    pub fn entries_for_account(&self, account_id: AccountId) -> Vec<LedgerEntry> {
        // Listing under the row lock keeps an in-flight mutation's entry
        // write invisible until its balance adjustment lands with it.
        match self.accounts.get(account_id) {
            Ok(account) => {
                let _row = account.lock_for_update();
                self.entries.for_account(account_id)
            }
            Err(_) => self.entries.for_account(account_id),
        }
    }

    /// All entries in the log, newest first.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.all()
    }

    // === Mutations ===

    /// Records a new point transaction and applies its effect to the
    /// account balance.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidPoints`] — `points <= 0`.
    /// - [`LedgerError::AccountNotFound`] — no such account.
    /// - [`LedgerError::InsufficientBalance`] — a redemption exceeds the
    ///   current balance.
    /// - [`LedgerError::Storage`] — the log could not persist the entry;
    ///   the balance is untouched.
    pub fn create_entry(
        &self,
        account_id: AccountId,
        kind: EntryKind,
        points: i64,
    ) -> Result<LedgerEntry, LedgerError> {
        check_points(points)?;
        let account = self.accounts.get(account_id)?;

        let mut balance = account.lock_for_update();
        let entry = commit(account_id, &mut balance, kind.effect(points), || {
            self.entries.insert(account_id, kind, points)
        })?;
        debug!(account = %account_id, entry = %entry.id, kind = ?kind, points, "entry created");
        Ok(entry)
    }

    /// Rewrites an entry's kind and points, adjusting the balance by the
    /// net of undoing the old effect and applying the new one.
    ///
    /// Applying only the new effect would double-count whenever an entry
    /// flips between EARNED and REDEEMED; the reversal term keeps the
    /// balance equal to the sum over the log.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Ledger::create_entry`], plus
    /// [`LedgerError::EntryNotFound`].
    pub fn update_entry(
        &self,
        entry_id: EntryId,
        kind: EntryKind,
        points: i64,
    ) -> Result<LedgerEntry, LedgerError> {
        check_points(points)?;
        // Fail fast and learn which account to lock; the entry is read
        // again under the lock for the authoritative original effect.
        let account_id = self.entries.get(entry_id)?.account_id;
        let account = self.accounts.get(account_id)?;

        let mut balance = account.lock_for_update();
        let original = self.entries.get(entry_id)?;
        let net = kind.effect(points) - original.effect();
        let entry = commit(account_id, &mut balance, net, || {
            self.entries.replace(entry_id, kind, points)
        })?;
        debug!(account = %account_id, entry = %entry.id, kind = ?kind, points, "entry updated");
        Ok(entry)
    }

    /// Deletes an entry, rolling its effect back out of the balance.
    ///
    /// Deleting an EARNED entry is rejected when the points were already
    /// spent elsewhere, since the reversal would leave the balance
    /// negative.
    ///
    /// # Errors
    ///
    /// [`LedgerError::EntryNotFound`], [`LedgerError::InsufficientBalance`]
    /// or [`LedgerError::Storage`].
    pub fn delete_entry(&self, entry_id: EntryId) -> Result<(), LedgerError> {
        let account_id = self.entries.get(entry_id)?.account_id;
        let account = self.accounts.get(account_id)?;

        let mut balance = account.lock_for_update();
        let original = self.entries.get(entry_id)?;
        let removed = commit(account_id, &mut balance, -original.effect(), || {
            self.entries.remove(entry_id)
        })?;
        debug!(account = %account_id, entry = %removed.id, "entry deleted");
        Ok(())
    }
}

fn check_points(points: i64) -> Result<(), LedgerError> {
    if points <= 0 {
        return Err(LedgerError::InvalidPoints);
    }
    Ok(())
}

/// Shared commit path for all mutations: validates the balance delta, runs
/// the entry mutation, then applies the delta. Runs with the account's row
/// lock held; an error from the entry mutation aborts with the balance
/// untouched.
fn commit<T>(
    account_id: AccountId,
    balance: &mut i64,
    delta: i64,
    mutate: impl FnOnce() -> Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    if *balance + delta < 0 {
        debug!(
            account = %account_id,
            balance = *balance,
            delta,
            "mutation rejected: balance would go negative"
        );
        return Err(LedgerError::InsufficientBalance);
    }

    let out = mutate()?;
    *balance += delta;
    debug_assert!(
        *balance >= 0,
        "balance for account {account_id} went negative: {balance}"
    );
    Ok(out)
}

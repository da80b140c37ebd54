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

//! Account balance rows and the store that owns them.
//!
//! Each [`Account`] is a single balance counter behind a mutex. The mutex is
//! the row lock: the ledger holds it for the whole validate-then-apply span
//! of a mutation, so two operations on the same account can never interleave
//! their read-modify-write. Reads outside the ledger take the lock only for
//! the duration of the copy.

use crate::base::AccountId;
use crate::error::LedgerError;
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::sync::Arc;

/// A member's point balance row.
///
/// The balance is only ever written through the ledger while the row lock is
/// held; it stays `>= 0` at every committed state.
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    balance: Mutex<i64>,
}

impl Account {
    fn new(id: AccountId) -> Self {
        Self {
            id,
            balance: Mutex::new(0),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Current committed balance.
    pub fn balance(&self) -> i64 {
        *self.balance.lock()
    }

    /// Takes the exclusive row lock for a validate-then-apply span.
    ///
    /// Blocks while another mutation on the same account is in flight. The
    /// mutation is committed the moment the guard is dropped.
    pub(crate) fn lock_for_update(&self) -> MutexGuard<'_, i64> {
        self.balance.lock()
    }
}

impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let balance = *self.balance.lock();
        let mut state = serializer.serialize_struct("Account", 2)?;
        state.serialize_field("account", &self.id)?;
        state.serialize_field("balance", &balance)?;
        state.end()
    }
}

/// Store of all account balance rows, indexed by account ID.
///
/// Accounts are created with a zero balance when the owning member is
/// registered and are never removed; the map itself is lock-free for
/// lookups, so operations on different accounts proceed independently.
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: DashMap<AccountId, Arc<Account>>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Creates a zero-balance row for a new account.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AccountExists`] if the account already has a
    /// row.
    pub fn open(&self, id: AccountId) -> Result<Arc<Account>, LedgerError> {
        use dashmap::mapref::entry::Entry;

        // Entry API keeps check-and-insert atomic under concurrent opens.
        match self.accounts.entry(id) {
            Entry::Occupied(_) => Err(LedgerError::AccountExists(id)),
            Entry::Vacant(entry) => {
                let account = Arc::new(Account::new(id));
                entry.insert(Arc::clone(&account));
                Ok(account)
            }
        }
    }

    /// Looks up an account row.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AccountNotFound`] if no row exists.
    pub fn get(&self, id: AccountId) -> Result<Arc<Account>, LedgerError> {
        self.accounts
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(LedgerError::AccountNotFound(id))
    }

    pub fn contains(&self, id: AccountId) -> bool {
        self.accounts.contains_key(&id)
    }

    /// Current balance of an account.
    pub fn balance(&self, id: AccountId) -> Result<i64, LedgerError> {
        self.get(id).map(|account| account.balance())
    }

    /// Snapshot of all account rows, ordered by account ID.
    pub fn all(&self) -> Vec<Arc<Account>> {
        let mut accounts: Vec<_> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        accounts.sort_unstable_by_key(|account| account.id().0);
        accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

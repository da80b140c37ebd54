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

//! Storage for ledger entries.
//!
//! The entry log holds the point transactions themselves and nothing else:
//! it enforces per-row field constraints (positive points) but no cross-row
//! invariants. Balance consistency is the ledger's job, which calls the
//! store only while holding the target account's row lock.

use crate::base::{AccountId, EntryId};
use crate::entry::{EntryKind, LedgerEntry};
use crate::error::LedgerError;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Row storage contract for ledger entries.
///
/// All mutations are invoked by the ledger inside an account-locked scope.
/// A failed mutation must leave the store unchanged; the ledger relies on
/// that to abort without touching the balance.
pub trait EntryStore: Send + Sync {
    /// Persists a new entry and assigns its ID.
    fn insert(
        &self,
        account_id: AccountId,
        kind: EntryKind,
        points: i64,
    ) -> Result<LedgerEntry, LedgerError>;

    /// Fetches a copy of an entry.
    fn get(&self, id: EntryId) -> Result<LedgerEntry, LedgerError>;

    /// Rewrites an entry's kind and points, keeping its account and
    /// creation time.
    fn replace(
        &self,
        id: EntryId,
        kind: EntryKind,
        points: i64,
    ) -> Result<LedgerEntry, LedgerError>;

    /// Deletes an entry, returning the removed row.
    fn remove(&self, id: EntryId) -> Result<LedgerEntry, LedgerError>;

    /// All entries belonging to an account, newest first.
    fn for_account(&self, account_id: AccountId) -> Vec<LedgerEntry>;

    /// All entries in the log, newest first.
    fn all(&self) -> Vec<LedgerEntry>;
}

/// In-memory entry log backed by a concurrent map.
///
/// IDs come from a monotonically increasing counter, so an entry ID never
/// refers to two different transactions over the life of the process.
#[derive(Debug, Default)]
pub struct MemoryEntryLog {
    entries: DashMap<EntryId, LedgerEntry>,
    next_id: AtomicU64,
}

impl MemoryEntryLog {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_points(points: i64) -> Result<(), LedgerError> {
        if points <= 0 {
            return Err(LedgerError::InvalidPoints);
        }
        Ok(())
    }

    fn sorted_newest_first(mut entries: Vec<LedgerEntry>) -> Vec<LedgerEntry> {
        entries.sort_unstable_by_key(|e| std::cmp::Reverse((e.created_at, e.id)));
        entries
    }
}

impl EntryStore for MemoryEntryLog {
    fn insert(
        &self,
        account_id: AccountId,
        kind: EntryKind,
        points: i64,
    ) -> Result<LedgerEntry, LedgerError> {
        Self::check_points(points)?;

        let id = EntryId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let entry = LedgerEntry {
            id,
            account_id,
            kind,
            points,
            created_at: Utc::now(),
        };
        self.entries.insert(id, entry);
        Ok(entry)
    }

    fn get(&self, id: EntryId) -> Result<LedgerEntry, LedgerError> {
        self.entries
            .get(&id)
            .map(|entry| *entry.value())
            .ok_or(LedgerError::EntryNotFound(id))
    }

    fn replace(
        &self,
        id: EntryId,
        kind: EntryKind,
        points: i64,
    ) -> Result<LedgerEntry, LedgerError> {
        Self::check_points(points)?;

        let mut entry = self
            .entries
            .get_mut(&id)
            .ok_or(LedgerError::EntryNotFound(id))?;
        entry.kind = kind;
        entry.points = points;
        Ok(*entry.value())
    }

    fn remove(&self, id: EntryId) -> Result<LedgerEntry, LedgerError> {
        self.entries
            .remove(&id)
            .map(|(_, entry)| entry)
            .ok_or(LedgerError::EntryNotFound(id))
    }

    fn for_account(&self, account_id: AccountId) -> Vec<LedgerEntry> {
        let entries = self
            .entries
            .iter()
            .filter(|entry| entry.account_id == account_id)
            .map(|entry| *entry.value())
            .collect();
        Self::sorted_newest_first(entries)
    }

    fn all(&self) -> Vec<LedgerEntry> {
        let entries = self.entries.iter().map(|entry| *entry.value()).collect();
        Self::sorted_newest_first(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_assigns_sequential_ids() {
        let log = MemoryEntryLog::new();
        let first = log.insert(AccountId(1), EntryKind::Earned, 10).unwrap();
        let second = log.insert(AccountId(1), EntryKind::Redeemed, 5).unwrap();
        assert_eq!(first.id, EntryId(1));
        assert_eq!(second.id, EntryId(2));
    }

    #[test]
    fn insert_rejects_nonpositive_points() {
        let log = MemoryEntryLog::new();
        assert_eq!(
            log.insert(AccountId(1), EntryKind::Earned, 0).unwrap_err(),
            LedgerError::InvalidPoints
        );
        assert_eq!(
            log.insert(AccountId(1), EntryKind::Earned, -5).unwrap_err(),
            LedgerError::InvalidPoints
        );
        assert!(log.is_empty());
    }

    #[test]
    fn replace_keeps_account_and_creation_time() {
        let log = MemoryEntryLog::new();
        let entry = log.insert(AccountId(1), EntryKind::Earned, 10).unwrap();
        let updated = log.replace(entry.id, EntryKind::Redeemed, 4).unwrap();

        assert_eq!(updated.account_id, entry.account_id);
        assert_eq!(updated.created_at, entry.created_at);
        assert_eq!(updated.kind, EntryKind::Redeemed);
        assert_eq!(updated.points, 4);
    }

    #[test]
    fn replace_rejects_nonpositive_points() {
        let log = MemoryEntryLog::new();
        let entry = log.insert(AccountId(1), EntryKind::Earned, 10).unwrap();
        assert_eq!(
            log.replace(entry.id, EntryKind::Earned, 0).unwrap_err(),
            LedgerError::InvalidPoints
        );
        // Row untouched.
        assert_eq!(log.get(entry.id).unwrap().points, 10);
    }

    #[test]
    fn remove_returns_row_and_forgets_it() {
        let log = MemoryEntryLog::new();
        let entry = log.insert(AccountId(1), EntryKind::Earned, 10).unwrap();
        let removed = log.remove(entry.id).unwrap();
        assert_eq!(removed, entry);
        assert_eq!(
            log.get(entry.id).unwrap_err(),
            LedgerError::EntryNotFound(entry.id)
        );
    }

    #[test]
    fn missing_rows_report_not_found() {
        let log = MemoryEntryLog::new();
        let id = EntryId(99);
        assert_eq!(log.get(id).unwrap_err(), LedgerError::EntryNotFound(id));
        assert_eq!(
            log.replace(id, EntryKind::Earned, 1).unwrap_err(),
            LedgerError::EntryNotFound(id)
        );
        assert_eq!(log.remove(id).unwrap_err(), LedgerError::EntryNotFound(id));
    }

    #[test]
    fn for_account_filters_and_orders_newest_first() {
        let log = MemoryEntryLog::new();
        let a = log.insert(AccountId(1), EntryKind::Earned, 10).unwrap();
        log.insert(AccountId(2), EntryKind::Earned, 99).unwrap();
        let c = log.insert(AccountId(1), EntryKind::Redeemed, 3).unwrap();

        let listed = log.for_account(AccountId(1));
        assert_eq!(listed.len(), 2);
        // Same-instant ties fall back to the ID, so the later insert wins.
        assert_eq!(listed[0].id, c.id);
        assert_eq!(listed[1].id, a.id);
    }
}

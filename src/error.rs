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

//! Error types for ledger operations.

use crate::base::{AccountId, EntryId};
use thiserror::Error;

/// Ledger operation errors.
///
/// Every failed operation leaves the account balance and the entry log
/// untouched, so retrying any of these from the caller is safe. Only
/// [`LedgerError::Storage`] is worth retrying; the rest are deterministic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Points are zero or negative
    #[error("points must be greater than zero")]
    InvalidPoints,

    /// Account already has a balance row
    #[error("account {0} already exists")]
    AccountExists(AccountId),

    /// Referenced account does not exist
    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    /// Referenced ledger entry does not exist
    #[error("ledger entry {0} not found")]
    EntryNotFound(EntryId),

    /// Applying the mutation would drive the balance below zero
    #[error("insufficient point balance")]
    InsufficientBalance,

    /// The backing store failed to commit; nothing was applied
    #[error("storage failure: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Whether retrying the same operation could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Storage(_))
    }
}

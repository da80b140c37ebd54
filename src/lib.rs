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

//! # Points Ledger
//!
//! This library keeps per-member reward-point balances exactly consistent
//! with an editable log of point transactions (earn or redeem). Balances
//! are denormalized counters, updated atomically with every log mutation
//! and never allowed below zero.
//!
//! ## Core Components
//!
//! - [`Ledger`]: Coordinator that commits entry mutations and balance
//!   adjustments as one atomic unit
//! - [`AccountStore`] / [`Account`]: Lockable balance rows
//! - [`EntryStore`] / [`MemoryEntryLog`]: Storage for the transactions
//!   themselves
//! - [`LedgerError`]: Error taxonomy for rejected and failed operations
//!
//! ## Example
//!
//! ```
//! use points_ledger_rs::{AccountId, EntryKind, Ledger, LedgerError};
//!
//! let ledger = Ledger::new();
//! ledger.open_account(AccountId(1)).unwrap();
//!
//! // Earn 100 points, spend 40.
//! let earned = ledger.create_entry(AccountId(1), EntryKind::Earned, 100).unwrap();
//! ledger.create_entry(AccountId(1), EntryKind::Redeemed, 40).unwrap();
//! assert_eq!(ledger.balance(AccountId(1)).unwrap(), 60);
//!
//! // Deleting the earn would leave the balance at -40, so it is rejected.
//! assert_eq!(
//!     ledger.delete_entry(earned.id),
//!     Err(LedgerError::InsufficientBalance)
//! );
//! assert_eq!(ledger.balance(AccountId(1)).unwrap(), 60);
//! ```
//!
//! ## Thread Safety
//!
//! The ledger serializes concurrent mutations per account on an exclusive
//! row lock; operations on different accounts run in parallel. Failed
//! operations leave both the log and the balance untouched, so callers may
//! retry freely.

pub mod account;
mod base;
mod entry;
pub mod entry_log;
pub mod error;
mod ledger;

pub use account::{Account, AccountStore};
pub use base::{AccountId, EntryId};
pub use entry::{EntryKind, LedgerEntry};
pub use entry_log::{EntryStore, MemoryEntryLog};
pub use error::LedgerError;
pub use ledger::Ledger;

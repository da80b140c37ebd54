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

//! Ledger entries and signed-effect arithmetic.
//!
//! Every entry contributes a signed number of points to its account's
//! balance: `+points` for [`EntryKind::Earned`], `-points` for
//! [`EntryKind::Redeemed`]. Create, update and delete all derive their
//! balance deltas from [`EntryKind::effect`] so the sign convention lives
//! in exactly one place.

use crate::base::{AccountId, EntryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a point transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    /// Points credited to the member (e.g. for a purchase).
    Earned,
    /// Points spent by the member.
    Redeemed,
}

impl EntryKind {
    /// Signed contribution of an entry of this kind to the account balance.
    pub fn effect(self, points: i64) -> i64 {
        match self {
            EntryKind::Earned => points,
            EntryKind::Redeemed => -points,
        }
    }
}

/// One recorded point transaction belonging to an account.
///
/// `account_id` and `created_at` are fixed at creation; `kind` and `points`
/// may be rewritten through the ledger, which re-derives the balance delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub account_id: AccountId,
    pub kind: EntryKind,
    /// Point magnitude, always strictly positive.
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Signed contribution of this entry to its account's balance.
    pub fn effect(&self) -> i64 {
        self.kind.effect(self.points)
    }
}

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

//! Property-based tests for the ledger.
//!
//! The central property: after ANY sequence of operations, accepted or
//! rejected, every account balance equals the signed sum over its current
//! entries and never drops below zero.

use points_ledger_rs::{AccountId, EntryId, EntryKind, Ledger, LedgerEntry};
use proptest::prelude::*;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

/// Generate a positive point count.
fn arb_points() -> impl Strategy<Value = i64> {
    1i64..=10_000
}

fn arb_kind() -> impl Strategy<Value = EntryKind> {
    prop_oneof![Just(EntryKind::Earned), Just(EntryKind::Redeemed)]
}

/// One random mutation against a small ID space, so updates and deletes
/// frequently hit entries that exist.
#[derive(Debug, Clone, Copy)]
enum Op {
    Create(EntryKind, i64),
    Update(u64, EntryKind, i64),
    Delete(u64),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (arb_kind(), arb_points()).prop_map(|(kind, points)| Op::Create(kind, points)),
        2 => (1u64..=30, arb_kind(), arb_points())
            .prop_map(|(id, kind, points)| Op::Update(id, kind, points)),
        1 => (1u64..=30).prop_map(Op::Delete),
    ]
}

fn derived_balance(ledger: &Ledger, id: AccountId) -> i64 {
    ledger
        .entries_for_account(id)
        .iter()
        .map(LedgerEntry::effect)
        .sum()
}

// =============================================================================
// Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Balance equals the signed sum over the log after random creates.
    #[test]
    fn balance_matches_log_after_creates(
        ops in prop::collection::vec((arb_kind(), arb_points()), 1..30),
    ) {
        let ledger = Ledger::new();
        ledger.open_account(AccountId(1)).unwrap();

        for (kind, points) in ops {
            // Redemptions may be rejected; that must not disturb the sum.
            let _ = ledger.create_entry(AccountId(1), kind, points);
        }

        let balance = ledger.balance(AccountId(1)).unwrap();
        prop_assert_eq!(balance, derived_balance(&ledger, AccountId(1)));
        prop_assert!(balance >= 0);
    }

    /// Pure earns always accumulate to their total.
    #[test]
    fn earns_sum_to_balance(
        amounts in prop::collection::vec(arb_points(), 1..20),
    ) {
        let ledger = Ledger::new();
        ledger.open_account(AccountId(1)).unwrap();
        let expected: i64 = amounts.iter().sum();

        for points in &amounts {
            ledger.create_entry(AccountId(1), EntryKind::Earned, *points).unwrap();
        }

        prop_assert_eq!(ledger.balance(AccountId(1)).unwrap(), expected);
        prop_assert_eq!(
            ledger.entries_for_account(AccountId(1)).len(),
            amounts.len()
        );
    }

    /// A redemption never succeeds beyond the balance, and a rejected one
    /// leaves no residue in the log.
    #[test]
    fn cannot_over_redeem(
        earn in arb_points(),
        extra in arb_points(),
    ) {
        let ledger = Ledger::new();
        ledger.open_account(AccountId(1)).unwrap();
        ledger.create_entry(AccountId(1), EntryKind::Earned, earn).unwrap();

        let result = ledger.create_entry(AccountId(1), EntryKind::Redeemed, earn + extra);
        prop_assert!(result.is_err());
        prop_assert_eq!(ledger.balance(AccountId(1)).unwrap(), earn);
        prop_assert_eq!(ledger.entries_for_account(AccountId(1)).len(), 1);
    }

    /// The invariant survives arbitrary create/update/delete interleavings,
    /// including operations on IDs that never existed or are already gone.
    #[test]
    fn invariant_holds_under_random_mutations(
        ops in prop::collection::vec(arb_op(), 1..60),
    ) {
        let ledger = Ledger::new();
        ledger.open_account(AccountId(1)).unwrap();

        for op in ops {
            let _ = match op {
                Op::Create(kind, points) => {
                    ledger.create_entry(AccountId(1), kind, points).map(|_| ())
                }
                Op::Update(id, kind, points) => {
                    ledger.update_entry(EntryId(id), kind, points).map(|_| ())
                }
                Op::Delete(id) => ledger.delete_entry(EntryId(id)),
            };

            // Check after every step, not just at the end.
            let balance = ledger.balance(AccountId(1)).unwrap();
            prop_assert_eq!(balance, derived_balance(&ledger, AccountId(1)));
            prop_assert!(balance >= 0);
        }
    }
}

// =============================================================================
// Update / Delete Arithmetic
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A successful update lands exactly on `old balance - old effect + new
    /// effect`.
    #[test]
    fn update_applies_net_of_reversal_and_new_effect(
        base in arb_points(),
        original in arb_points(),
        new_kind in arb_kind(),
        new_points in arb_points(),
    ) {
        let ledger = Ledger::new();
        ledger.open_account(AccountId(1)).unwrap();
        // Baseline earn keeps most updates affordable.
        ledger.create_entry(AccountId(1), EntryKind::Earned, base).unwrap();
        let entry = ledger.create_entry(AccountId(1), EntryKind::Earned, original).unwrap();

        let before = ledger.balance(AccountId(1)).unwrap();
        let expected = before - original + new_kind.effect(new_points);

        match ledger.update_entry(entry.id, new_kind, new_points) {
            Ok(updated) => {
                prop_assert_eq!(updated.kind, new_kind);
                prop_assert_eq!(updated.points, new_points);
                prop_assert_eq!(ledger.balance(AccountId(1)).unwrap(), expected);
            }
            Err(_) => {
                // Rejected only when the net would go negative; nothing moved.
                prop_assert!(expected < 0);
                prop_assert_eq!(ledger.balance(AccountId(1)).unwrap(), before);
                let unchanged = ledger.entry(entry.id).unwrap();
                prop_assert_eq!(unchanged.kind, EntryKind::Earned);
                prop_assert_eq!(unchanged.points, original);
            }
        }
    }

    /// A successful delete lands exactly on `old balance - effect`, and a
    /// rejected delete changes nothing.
    #[test]
    fn delete_applies_plain_reversal(
        earn in arb_points(),
        redeem_fraction in 0u8..=100,
    ) {
        let ledger = Ledger::new();
        ledger.open_account(AccountId(1)).unwrap();
        let entry = ledger.create_entry(AccountId(1), EntryKind::Earned, earn).unwrap();

        // Spend part of the earn so some deletes become unaffordable.
        let redeemed = earn * i64::from(redeem_fraction) / 100;
        if redeemed > 0 {
            ledger.create_entry(AccountId(1), EntryKind::Redeemed, redeemed).unwrap();
        }

        let before = ledger.balance(AccountId(1)).unwrap();
        let expected = before - earn;

        match ledger.delete_entry(entry.id) {
            Ok(()) => {
                prop_assert!(expected >= 0);
                prop_assert_eq!(ledger.balance(AccountId(1)).unwrap(), expected);
            }
            Err(_) => {
                prop_assert!(expected < 0);
                prop_assert_eq!(ledger.balance(AccountId(1)).unwrap(), before);
                prop_assert!(ledger.entry(entry.id).is_ok());
            }
        }

        let balance = ledger.balance(AccountId(1)).unwrap();
        prop_assert_eq!(balance, derived_balance(&ledger, AccountId(1)));
        prop_assert!(balance >= 0);
    }
}

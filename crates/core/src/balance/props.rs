//! Property-based tests for the balance aggregator.

use proptest::prelude::*;
use rust_decimal::Decimal;
use spendbee_shared::types::{ExpenseId, GroupId, MemberId, UserId};

use super::aggregator::{NEGLIGIBLE_AMOUNT, compute_balances};
use super::suggestions::suggest_settlements;
use super::types::{ExpenseRecord, GroupInfo, MemberInfo, SettlementRecord, ShareRecord};
use crate::currency::RateTable;
use crate::expense::split_equally;

const MEMBER_COUNT: i32 = 5;

fn members() -> Vec<MemberInfo> {
    (1..=MEMBER_COUNT)
        .map(|i| MemberInfo {
            id: MemberId::new(i),
            user_id: (i % 2 == 0).then_some(UserId::new(100 + i)),
            user_name: (i % 2 == 0).then(|| format!("user-{i}")),
            guest_name: (i % 2 == 1).then(|| format!("guest-{i}")),
        })
        .collect()
}

fn cents() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|c| Decimal::new(c, 2))
}

fn member_id() -> impl Strategy<Value = MemberId> {
    (1..=MEMBER_COUNT).prop_map(MemberId::new)
}

/// An expense in base currency: payer, amount, and a non-empty participant set.
fn expense_input() -> impl Strategy<Value = (MemberId, Decimal, Vec<MemberId>)> {
    (
        member_id(),
        cents(),
        prop::collection::btree_set(member_id(), 1..=MEMBER_COUNT as usize),
    )
        .prop_map(|(payer, amount, split)| (payer, amount, split.into_iter().collect()))
}

fn settlement_input() -> impl Strategy<Value = SettlementRecord> {
    (member_id(), member_id(), cents()).prop_map(|(from_member, to_member, amount)| {
        SettlementRecord {
            from_member,
            to_member,
            amount,
            currency: Some("EUR".into()),
        }
    })
}

fn build(
    inputs: &[(MemberId, Decimal, Vec<MemberId>)],
) -> (Vec<ExpenseRecord>, Vec<ShareRecord>) {
    let mut expenses = Vec::new();
    let mut shares = Vec::new();
    for (i, (payer, amount, split)) in inputs.iter().enumerate() {
        let id = ExpenseId::new(i32::try_from(i).unwrap() + 1);
        expenses.push(ExpenseRecord {
            id,
            paid_by: *payer,
            amount: *amount,
            currency: None,
        });
        for (member_id, share) in split.iter().zip(split_equally(*amount, split.len())) {
            shares.push(ShareRecord {
                expense_id: id,
                member_id: *member_id,
                share,
            });
        }
    }
    (expenses, shares)
}

fn group() -> GroupInfo {
    GroupInfo {
        id: GroupId::new(1),
        base_currency: Some("EUR".into()),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Base-currency balances sum to exactly zero.
    #[test]
    fn prop_single_currency_balances_sum_to_zero(
        inputs in prop::collection::vec(expense_input(), 0..20),
        settlements in prop::collection::vec(settlement_input(), 0..10),
    ) {
        let (expenses, shares) = build(&inputs);
        let balances = compute_balances(
            &group(), &members(), &expenses, &shares, &settlements, &RateTable::anchored(),
        ).unwrap();

        let total: Decimal = balances.iter().map(|b| b.balance_in_base_currency).sum();
        prop_assert_eq!(total, Decimal::ZERO);
    }

    /// Breakdown entries are never negligible, and the guest flag tracks the
    /// linked account.
    #[test]
    fn prop_breakdown_and_guest_flag(
        inputs in prop::collection::vec(expense_input(), 0..20),
    ) {
        let (expenses, shares) = build(&inputs);
        let members = members();
        let balances = compute_balances(
            &group(), &members, &expenses, &shares, &[], &RateTable::anchored(),
        ).unwrap();

        for (balance, member) in balances.iter().zip(&members) {
            prop_assert_eq!(balance.is_guest, member.user_id.is_none());
            prop_assert_eq!(balance.balance, balance.balance_in_base_currency);
            for entry in &balance.balance_by_currency {
                prop_assert!(entry.amount.abs() >= NEGLIGIBLE_AMOUNT);
            }
        }
    }

    /// Applying the suggested transfers zeroes every balance.
    #[test]
    fn prop_suggestions_settle_the_group(
        inputs in prop::collection::vec(expense_input(), 1..20),
    ) {
        let (expenses, shares) = build(&inputs);
        let rates = RateTable::anchored();
        let balances = compute_balances(
            &group(), &members(), &expenses, &shares, &[], &rates,
        ).unwrap();

        let transfers = suggest_settlements(&balances);
        let nonzero = balances.iter().filter(|b| !b.balance.is_zero()).count();
        prop_assert!(transfers.len() <= nonzero.saturating_sub(1));

        let settlements: Vec<SettlementRecord> = transfers
            .iter()
            .map(|t| SettlementRecord {
                from_member: t.from_member_id,
                to_member: t.to_member_id,
                amount: t.amount,
                currency: None,
            })
            .collect();
        let after = compute_balances(
            &group(), &members(), &expenses, &shares, &settlements, &rates,
        ).unwrap();

        for balance in after {
            prop_assert!(balance.balance.is_zero(), "{:?}", balance);
        }
    }
}

//! Per-member balance computation.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use spendbee_shared::types::{ExpenseId, MemberId, currency_or, normalize_currency};

use super::error::BalanceError;
use super::types::{
    CurrencyAmount, ExpenseRecord, GroupInfo, MemberBalance, MemberInfo, SettlementRecord,
    ShareRecord,
};
use crate::currency::{RateTable, convert, round_money};

/// Entries whose absolute value is below this are left out of the
/// per-currency breakdown. They still count toward the base total.
pub const NEGLIGIBLE_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Running per-currency totals for one member.
type Ledger = BTreeMap<String, Decimal>;

/// Computes every member's net balance, per currency and in the base
/// currency.
///
/// - paid expense: credit the payer with the full amount
/// - share: debit the member with the share
/// - settlement: credit the paying member, debit the receiving member
///
/// Output order follows `members`. Rows referencing members outside
/// `members` are ignored.
///
/// # Errors
///
/// Returns `BalanceError::Currency` if a currency in use has no rate, and
/// `BalanceError::UnknownExpense` if a share points at an expense not in
/// `expenses`.
pub fn compute_balances(
    group: &GroupInfo,
    members: &[MemberInfo],
    expenses: &[ExpenseRecord],
    shares: &[ShareRecord],
    settlements: &[SettlementRecord],
    rates: &RateTable,
) -> Result<Vec<MemberBalance>, BalanceError> {
    let base = normalize_currency(group.base_currency.as_deref());

    let mut ledgers: HashMap<MemberId, Ledger> =
        members.iter().map(|m| (m.id, Ledger::new())).collect();

    let mut post = |member: MemberId, currency: &str, delta: Decimal| {
        if let Some(ledger) = ledgers.get_mut(&member) {
            *ledger.entry(currency.to_string()).or_default() += delta;
        }
    };

    let mut expense_currency: HashMap<ExpenseId, String> = HashMap::with_capacity(expenses.len());
    for expense in expenses {
        let currency = currency_or(expense.currency.as_deref(), &base);
        post(expense.paid_by, &currency, expense.amount);
        expense_currency.insert(expense.id, currency);
    }

    for share in shares {
        let currency = expense_currency
            .get(&share.expense_id)
            .ok_or(BalanceError::UnknownExpense(share.expense_id))?;
        post(share.member_id, currency, -share.share);
    }

    for settlement in settlements {
        let currency = currency_or(settlement.currency.as_deref(), &base);
        post(settlement.from_member, &currency, settlement.amount);
        post(settlement.to_member, &currency, -settlement.amount);
    }

    members
        .iter()
        .map(|member| {
            let ledger = ledgers.remove(&member.id).unwrap_or_default();
            summarize(member, &ledger, &base, rates)
        })
        .collect()
}

fn summarize(
    member: &MemberInfo,
    ledger: &Ledger,
    base: &str,
    rates: &RateTable,
) -> Result<MemberBalance, BalanceError> {
    let mut total = Decimal::ZERO;
    for (currency, amount) in ledger {
        total += convert(*amount, currency, base, rates)?;
    }
    let total = round_money(total);

    let balance_by_currency = ledger
        .iter()
        .filter(|(_, amount)| amount.abs() >= NEGLIGIBLE_AMOUNT)
        .map(|(currency, amount)| CurrencyAmount {
            currency: currency.clone(),
            amount: round_money(*amount),
        })
        .collect();

    Ok(MemberBalance {
        member_id: member.id,
        member_name: member.display_name().to_string(),
        balance: total,
        balance_by_currency,
        balance_in_base_currency: total,
        is_guest: member.is_guest(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyError;
    use rust_decimal_macros::dec;
    use spendbee_shared::types::{GroupId, UserId};

    const A: MemberId = MemberId::new(1);
    const B: MemberId = MemberId::new(2);
    const C: MemberId = MemberId::new(3);

    fn group(base: Option<&str>) -> GroupInfo {
        GroupInfo {
            id: GroupId::new(7),
            base_currency: base.map(str::to_string),
        }
    }

    fn members() -> Vec<MemberInfo> {
        vec![
            MemberInfo {
                id: A,
                user_id: Some(UserId::new(10)),
                user_name: Some("Ana".into()),
                guest_name: None,
            },
            MemberInfo {
                id: B,
                user_id: Some(UserId::new(11)),
                user_name: Some("Ben".into()),
                guest_name: None,
            },
            MemberInfo {
                id: C,
                user_id: None,
                user_name: None,
                guest_name: Some("Cleo".into()),
            },
        ]
    }

    fn expense(id: i32, paid_by: MemberId, amount: Decimal, currency: Option<&str>) -> ExpenseRecord {
        ExpenseRecord {
            id: ExpenseId::new(id),
            paid_by,
            amount,
            currency: currency.map(str::to_string),
        }
    }

    fn share(expense_id: i32, member_id: MemberId, share: Decimal) -> ShareRecord {
        ShareRecord {
            expense_id: ExpenseId::new(expense_id),
            member_id,
            share,
        }
    }

    fn settlement(from: MemberId, to: MemberId, amount: Decimal, currency: Option<&str>) -> SettlementRecord {
        SettlementRecord {
            from_member: from,
            to_member: to,
            amount,
            currency: currency.map(str::to_string),
        }
    }

    fn rates() -> RateTable {
        [("EUR", dec!(1)), ("USD", dec!(1.25))].into_iter().collect()
    }

    fn find(balances: &[MemberBalance], id: MemberId) -> &MemberBalance {
        balances.iter().find(|b| b.member_id == id).unwrap()
    }

    #[test]
    fn test_even_split_scenario() {
        let expenses = [expense(1, A, dec!(100.00), Some("EUR"))];
        let shares = [share(1, A, dec!(50)), share(1, B, dec!(50))];

        let balances =
            compute_balances(&group(Some("EUR")), &members(), &expenses, &shares, &[], &rates())
                .unwrap();

        assert_eq!(find(&balances, A).balance_in_base_currency, dec!(50.00));
        assert_eq!(find(&balances, B).balance_in_base_currency, dec!(-50.00));
        assert_eq!(find(&balances, A).balance, find(&balances, A).balance_in_base_currency);
        assert_eq!(
            find(&balances, A).balance_by_currency,
            vec![CurrencyAmount {
                currency: "EUR".into(),
                amount: dec!(50.00)
            }]
        );
    }

    #[test]
    fn test_settlement_clears_debt() {
        let expenses = [expense(1, A, dec!(100.00), Some("EUR"))];
        let shares = [share(1, A, dec!(50)), share(1, B, dec!(50))];
        let settlements = [settlement(B, A, dec!(50.00), Some("EUR"))];

        let balances = compute_balances(
            &group(Some("EUR")),
            &members(),
            &expenses,
            &shares,
            &settlements,
            &rates(),
        )
        .unwrap();

        for balance in &balances {
            assert_eq!(balance.balance_in_base_currency, dec!(0.00));
            assert!(balance.balance_by_currency.is_empty());
        }
    }

    #[test]
    fn test_foreign_expense_converted_to_base() {
        let expenses = [expense(1, A, dec!(100), Some("USD"))];

        let balances =
            compute_balances(&group(Some("EUR")), &members(), &expenses, &[], &[], &rates())
                .unwrap();

        let a = find(&balances, A);
        assert_eq!(a.balance_in_base_currency, dec!(80.00));
        assert_eq!(
            a.balance_by_currency,
            vec![CurrencyAmount {
                currency: "USD".into(),
                amount: dec!(100)
            }]
        );
    }

    #[test]
    fn test_inactive_member_is_zero() {
        let expenses = [expense(1, A, dec!(30), None)];
        let shares = [share(1, A, dec!(15)), share(1, B, dec!(15))];

        let balances =
            compute_balances(&group(None), &members(), &expenses, &shares, &[], &rates()).unwrap();

        let c = find(&balances, C);
        assert_eq!(c.balance, Decimal::ZERO);
        assert!(c.balance_by_currency.is_empty());
        assert!(c.is_guest);
        assert_eq!(c.member_name, "Cleo");
    }

    #[test]
    fn test_output_follows_member_order() {
        let balances =
            compute_balances(&group(None), &members(), &[], &[], &[], &rates()).unwrap();
        let ids: Vec<_> = balances.iter().map(|b| b.member_id).collect();
        assert_eq!(ids, vec![A, B, C]);
        assert!(!balances[0].is_guest);
    }

    #[test]
    fn test_unset_currency_uses_group_base() {
        let expenses = [expense(1, A, dec!(40), None)];
        let shares = [share(1, B, dec!(40))];

        let balances =
            compute_balances(&group(Some("usd")), &members(), &expenses, &shares, &[], &rates())
                .unwrap();

        assert_eq!(find(&balances, A).balance_by_currency[0].currency, "USD");
        assert_eq!(find(&balances, A).balance_in_base_currency, dec!(40));
        assert_eq!(find(&balances, B).balance_in_base_currency, dec!(-40));
    }

    #[test]
    fn test_negligible_currency_hidden_but_counted() {
        // A is left with 0.006 USD and 10 EUR
        let expenses = [
            expense(1, A, dec!(10.006), Some("USD")),
            expense(2, A, dec!(10), Some("EUR")),
        ];
        let shares = [share(1, A, dec!(10))];

        let balances =
            compute_balances(&group(Some("USD")), &members(), &expenses, &shares, &[], &rates())
                .unwrap();

        let a = find(&balances, A);
        assert_eq!(
            a.balance_by_currency,
            vec![CurrencyAmount {
                currency: "EUR".into(),
                amount: dec!(10)
            }]
        );
        // 10 EUR -> 12.50 USD, plus the hidden 0.006 USD
        assert_eq!(a.balance_in_base_currency, dec!(12.51));
    }

    #[test]
    fn test_mixed_currencies_sum_in_base() {
        let expenses = [
            expense(1, A, dec!(25), Some("USD")),
            expense(2, B, dec!(10), Some("EUR")),
        ];
        let shares = [
            share(1, A, dec!(12.5)),
            share(1, B, dec!(12.5)),
            share(2, A, dec!(5)),
            share(2, B, dec!(5)),
        ];

        let balances =
            compute_balances(&group(Some("EUR")), &members(), &expenses, &shares, &[], &rates())
                .unwrap();

        let a = find(&balances, A);
        // +12.50 USD -> 10.00 EUR, -5 EUR
        assert_eq!(a.balance_in_base_currency, dec!(5.00));
        assert_eq!(a.balance_by_currency.len(), 2);
        assert_eq!(a.balance_by_currency[0].currency, "EUR");
        assert_eq!(a.balance_by_currency[1].currency, "USD");

        let b = find(&balances, B);
        assert_eq!(b.balance_in_base_currency, dec!(-5.00));
    }

    #[test]
    fn test_missing_rate_fails() {
        let expenses = [expense(1, A, dec!(10), Some("CHF"))];

        let err = compute_balances(&group(Some("EUR")), &members(), &expenses, &[], &[], &rates())
            .unwrap_err();

        assert_eq!(
            err,
            BalanceError::Currency(CurrencyError::MissingRate("CHF".into()))
        );
    }

    #[test]
    fn test_share_for_unknown_expense_fails() {
        let shares = [share(99, A, dec!(1))];
        let err = compute_balances(&group(None), &members(), &[], &shares, &[], &rates())
            .unwrap_err();
        assert_eq!(err, BalanceError::UnknownExpense(ExpenseId::new(99)));
    }

    #[test]
    fn test_rows_for_outside_members_are_ignored() {
        let outsider = MemberId::new(404);
        let expenses = [expense(1, outsider, dec!(20), None)];
        let shares = [share(1, A, dec!(20))];

        let balances =
            compute_balances(&group(None), &members(), &expenses, &shares, &[], &rates()).unwrap();

        assert_eq!(balances.len(), 3);
        assert_eq!(find(&balances, A).balance, dec!(-20));
    }

    #[test]
    fn test_deterministic() {
        let expenses = [
            expense(1, A, dec!(33.33), Some("USD")),
            expense(2, C, dec!(12.01), Some("EUR")),
        ];
        let shares = [
            share(1, A, dec!(11.11)),
            share(1, B, dec!(11.11)),
            share(1, C, dec!(11.11)),
            share(2, B, dec!(12.01)),
        ];
        let run = || {
            compute_balances(&group(Some("EUR")), &members(), &expenses, &shares, &[], &rates())
                .unwrap()
        };
        assert_eq!(run(), run());
    }
}

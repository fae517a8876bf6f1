//! "Settle up" suggestions.

use rust_decimal::Decimal;

use super::aggregator::NEGLIGIBLE_AMOUNT;
use super::types::{MemberBalance, SuggestedTransfer};

struct Position<'a> {
    balance: &'a MemberBalance,
    open: Decimal,
}

/// Pairs the largest debtor with the largest creditor until every base
/// balance is within a cent of zero.
///
/// Produces at most `n - 1` transfers for `n` non-zero members. Ties are
/// broken by member ID so the output is stable.
#[must_use]
pub fn suggest_settlements(balances: &[MemberBalance]) -> Vec<SuggestedTransfer> {
    let mut creditors: Vec<Position<'_>> = balances
        .iter()
        .filter(|b| b.balance_in_base_currency >= NEGLIGIBLE_AMOUNT)
        .map(|b| Position {
            balance: b,
            open: b.balance_in_base_currency,
        })
        .collect();
    let mut debtors: Vec<Position<'_>> = balances
        .iter()
        .filter(|b| b.balance_in_base_currency <= -NEGLIGIBLE_AMOUNT)
        .map(|b| Position {
            balance: b,
            open: -b.balance_in_base_currency,
        })
        .collect();

    let by_size = |a: &Position<'_>, b: &Position<'_>| {
        b.open
            .cmp(&a.open)
            .then(a.balance.member_id.cmp(&b.balance.member_id))
    };
    creditors.sort_by(by_size);
    debtors.sort_by(by_size);

    let mut transfers = Vec::new();
    let (mut c, mut d) = (0, 0);
    while c < creditors.len() && d < debtors.len() {
        let amount = creditors[c].open.min(debtors[d].open);
        if amount >= NEGLIGIBLE_AMOUNT {
            transfers.push(SuggestedTransfer {
                from_member_id: debtors[d].balance.member_id,
                from_member_name: debtors[d].balance.member_name.clone(),
                to_member_id: creditors[c].balance.member_id,
                to_member_name: creditors[c].balance.member_name.clone(),
                amount,
            });
        }

        creditors[c].open -= amount;
        debtors[d].open -= amount;
        if creditors[c].open < NEGLIGIBLE_AMOUNT {
            c += 1;
        }
        if debtors[d].open < NEGLIGIBLE_AMOUNT {
            d += 1;
        }
    }

    transfers
}

//! Inputs and outputs of the balance computation.
//!
//! Inputs are plain records loaded by the caller; the aggregator never
//! touches storage.

use rust_decimal::Decimal;
use serde::Serialize;
use spendbee_shared::types::{ExpenseId, GroupId, MemberId, UserId};

/// The group whose balances are computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    /// Group ID.
    pub id: GroupId,
    /// Base currency as stored; normalized by the aggregator.
    pub base_currency: Option<String>,
}

/// One member of the group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    /// Member ID.
    pub id: MemberId,
    /// Linked account; `None` for guests.
    pub user_id: Option<UserId>,
    /// Name of the linked account.
    pub user_name: Option<String>,
    /// Display name stored on the member row.
    pub guest_name: Option<String>,
}

impl MemberInfo {
    /// Returns true for members without a linked account.
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        self.user_id.is_none()
    }

    /// Linked user's name, else the guest name, else `"Unknown"`.
    ///
    /// Only an empty name falls through; whitespace is kept as stored,
    /// the same rule as [`crate::activity::label_member`].
    #[must_use]
    pub fn display_name(&self) -> &str {
        non_empty(self.user_name.as_deref())
            .or_else(|| non_empty(self.guest_name.as_deref()))
            .unwrap_or("Unknown")
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// An expense as seen by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseRecord {
    /// Expense ID, referenced by shares.
    pub id: ExpenseId,
    /// Member who paid.
    pub paid_by: MemberId,
    /// Total amount in `currency`.
    pub amount: Decimal,
    /// Currency as stored; unset means the group's base currency.
    pub currency: Option<String>,
}

/// One member's portion of an expense. Shares take the expense's currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRecord {
    /// Expense this share belongs to.
    pub expense_id: ExpenseId,
    /// Member who owes the share.
    pub member_id: MemberId,
    /// Amount owed.
    pub share: Decimal,
}

/// A direct payment between two members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRecord {
    /// Member who paid.
    pub from_member: MemberId,
    /// Member who received the payment.
    pub to_member: MemberId,
    /// Amount paid.
    pub amount: Decimal,
    /// Currency as stored; unset means the group's base currency.
    pub currency: Option<String>,
}

/// Net amount in a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyAmount {
    /// ISO 4217 code.
    pub currency: String,
    /// Net amount, rounded to cents.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// A member's net position in the group.
///
/// Positive means the group owes the member; negative means the member owes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberBalance {
    /// Member ID.
    pub member_id: MemberId,
    /// Display name.
    pub member_name: String,
    /// Same value as `balance_in_base_currency`.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    /// Per-currency breakdown, ordered by code, without near-zero entries.
    pub balance_by_currency: Vec<CurrencyAmount>,
    /// Net position converted to the group's base currency.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance_in_base_currency: Decimal,
    /// True if the member has no linked account.
    pub is_guest: bool,
}

/// A payment that would move the group toward all-zero balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedTransfer {
    /// Member who should pay.
    pub from_member_id: MemberId,
    /// Payer's display name.
    pub from_member_name: String,
    /// Member who should receive.
    pub to_member_id: MemberId,
    /// Receiver's display name.
    pub to_member_name: String,
    /// Amount in the group's base currency.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn member(user_name: Option<&str>, guest_name: Option<&str>, linked: bool) -> MemberInfo {
        MemberInfo {
            id: MemberId::new(1),
            user_id: linked.then_some(UserId::new(9)),
            user_name: user_name.map(str::to_string),
            guest_name: guest_name.map(str::to_string),
        }
    }

    #[test]
    fn test_display_name_precedence() {
        assert_eq!(member(Some("Ana"), Some("ana-guest"), true).display_name(), "Ana");
        assert_eq!(member(None, Some("Bo"), false).display_name(), "Bo");
        assert_eq!(member(Some(""), Some("Bo"), true).display_name(), "Bo");
        assert_eq!(member(None, None, false).display_name(), "Unknown");
        assert_eq!(member(Some(" "), Some("Bo"), true).display_name(), " ");
        assert_eq!(member(None, Some(""), false).display_name(), "Unknown");
    }

    #[test]
    fn test_guest_flag() {
        assert!(member(None, Some("Bo"), false).is_guest());
        assert!(!member(Some("Ana"), None, true).is_guest());
    }

    #[test]
    fn test_member_balance_wire_shape() {
        let balance = MemberBalance {
            member_id: MemberId::new(3),
            member_name: "Ana".into(),
            balance: dec!(-12.5),
            balance_by_currency: vec![CurrencyAmount {
                currency: "USD".into(),
                amount: dec!(-15.25),
            }],
            balance_in_base_currency: dec!(-12.5),
            is_guest: false,
        };
        let json = serde_json::to_value(&balance).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "memberId": 3,
                "memberName": "Ana",
                "balance": -12.5,
                "balanceByCurrency": [{"currency": "USD", "amount": -15.25}],
                "balanceInBaseCurrency": -12.5,
                "isGuest": false
            })
        );
    }
}

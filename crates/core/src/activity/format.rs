//! Rendering activity rows into feed items for one viewer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spendbee_shared::types::{ActivityId, DEFAULT_CURRENCY, MemberId};

use crate::currency::round_money;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// An expense was added.
    ExpenseCreated,
    /// An expense was edited.
    ExpenseUpdated,
    /// An expense was removed.
    ExpenseDeleted,
    /// A settlement was recorded.
    SettlementCreated,
}

impl ActivityKind {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ExpenseCreated => "expense_created",
            Self::ExpenseUpdated => "expense_updated",
            Self::ExpenseDeleted => "expense_deleted",
            Self::SettlementCreated => "settlement_created",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense_created" => Ok(Self::ExpenseCreated),
            "expense_updated" => Ok(Self::ExpenseUpdated),
            "expense_deleted" => Ok(Self::ExpenseDeleted),
            "settlement_created" => Ok(Self::SettlementCreated),
            other => Err(format!("unknown activity type: {other}")),
        }
    }
}

/// Extra data stored with an activity row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityMetadata {
    /// Expense description at the time of the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Expense note at the time of the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A member referenced by an activity, with the names needed to label it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityParty {
    /// Member ID.
    pub member_id: MemberId,
    /// Linked user's name.
    pub user_name: Option<String>,
    /// Name stored on the member row.
    pub guest_name: Option<String>,
}

/// An activity row joined with its group and members.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    /// Activity ID.
    pub id: ActivityId,
    /// Event type.
    pub kind: ActivityKind,
    /// Public group UUID.
    pub group_uuid: Option<String>,
    /// Group name.
    pub group_name: Option<String>,
    /// Member who performed the action.
    pub actor: Option<ActivityParty>,
    /// Paying member, for settlements.
    pub from: Option<ActivityParty>,
    /// Receiving member, for settlements.
    pub to: Option<ActivityParty>,
    /// Stored metadata.
    pub metadata: ActivityMetadata,
    /// Amount involved.
    pub amount: Option<Decimal>,
    /// Currency of `amount`.
    pub currency: Option<String>,
    /// When it happened.
    pub created_at: DateTime<Utc>,
}

/// One rendered entry of the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    /// Activity ID.
    pub id: ActivityId,
    /// Event type.
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    /// Public group UUID.
    pub group_uuid: Option<String>,
    /// Group name.
    pub group_name: String,
    /// Headline, e.g. `You added "Dinner" in "Trip".`.
    pub title: String,
    /// Secondary line.
    pub detail: String,
    /// Amount involved.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    /// Currency of `amount`.
    pub currency: Option<String>,
    /// When it happened.
    pub created_at: DateTime<Utc>,
    /// Relative day label.
    pub date_label: String,
}

/// Label for a member: user name, else `"<name> (guest)"`, else `"Unknown"`.
#[must_use]
pub fn member_label(party: Option<&ActivityParty>) -> String {
    party.map_or_else(
        || "Unknown".to_string(),
        |p| label_member(p.user_name.as_deref(), p.guest_name.as_deref()),
    )
}

/// Same rule as [`member_label`] over bare names.
#[must_use]
pub fn label_member(user_name: Option<&str>, guest_name: Option<&str>) -> String {
    if let Some(name) = user_name.filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    if let Some(name) = guest_name.filter(|n| !n.is_empty()) {
        return format!("{name} (guest)");
    }
    "Unknown".to_string()
}

/// `Today`, `Yesterday`, or e.g. `Oct 3`, relative to `today`.
#[must_use]
pub fn date_label(at: DateTime<Utc>, today: NaiveDate) -> String {
    let day = at.date_naive();
    if day >= today {
        "Today".to_string()
    } else if day >= today - Duration::days(1) {
        "Yesterday".to_string()
    } else {
        day.format("%b %-d").to_string()
    }
}

/// Renders an activity for a viewer whose memberships are `viewer_members`.
#[must_use]
pub fn format_activity(
    record: &ActivityRecord,
    viewer_members: &[MemberId],
    today: NaiveDate,
) -> FeedItem {
    let is_viewer = |party: Option<&ActivityParty>| {
        party.is_some_and(|p| viewer_members.contains(&p.member_id))
    };

    let group_name = record
        .group_name
        .clone()
        .unwrap_or_else(|| "Unknown group".to_string());
    let subject = if is_viewer(record.actor.as_ref()) {
        "You".to_string()
    } else {
        member_label(record.actor.as_ref())
    };
    let description = record
        .metadata
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or("an expense");

    let (title, detail) = match record.kind {
        ActivityKind::ExpenseCreated => (
            format!("{subject} added \"{description}\" in \"{group_name}\"."),
            "Expense recorded".to_string(),
        ),
        ActivityKind::ExpenseUpdated => (
            format!("{subject} updated \"{description}\" in \"{group_name}\"."),
            "Expense updated".to_string(),
        ),
        ActivityKind::ExpenseDeleted => (
            format!("{subject} deleted \"{description}\" in \"{group_name}\"."),
            "Expense removed".to_string(),
        ),
        ActivityKind::SettlementCreated => {
            let from = member_label(record.from.as_ref());
            let to = member_label(record.to.as_ref());
            let money = format!(
                "{}{:.2}",
                record.currency.as_deref().unwrap_or(DEFAULT_CURRENCY),
                round_money(record.amount.unwrap_or_default())
            );
            let detail = if is_viewer(record.to.as_ref()) {
                format!("You received {money}")
            } else if is_viewer(record.from.as_ref()) {
                format!("You paid {money}")
            } else {
                format!("Payment recorded {money}")
            };
            (format!("{from} paid {to} in \"{group_name}\"."), detail)
        }
    };

    FeedItem {
        id: record.id,
        kind: record.kind,
        group_uuid: record.group_uuid.clone(),
        group_name,
        title,
        detail,
        amount: record.amount,
        currency: record.currency.clone(),
        created_at: record.created_at,
        date_label: date_label(record.created_at, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn party(id: i32, user: Option<&str>, guest: Option<&str>) -> ActivityParty {
        ActivityParty {
            member_id: MemberId::new(id),
            user_name: user.map(str::to_string),
            guest_name: guest.map(str::to_string),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn record(kind: ActivityKind) -> ActivityRecord {
        ActivityRecord {
            id: ActivityId::new(1),
            kind,
            group_uuid: Some("g-uuid".into()),
            group_name: Some("Trip".into()),
            actor: Some(party(1, Some("Ana"), None)),
            from: None,
            to: None,
            metadata: ActivityMetadata {
                description: Some("Dinner".into()),
                note: None,
            },
            amount: Some(dec!(50)),
            currency: Some("EUR".into()),
            created_at: Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_member_label() {
        assert_eq!(member_label(Some(&party(1, Some("Ana"), Some("x")))), "Ana");
        assert_eq!(member_label(Some(&party(1, None, Some("Bo")))), "Bo (guest)");
        assert_eq!(member_label(Some(&party(1, None, None))), "Unknown");
        assert_eq!(member_label(None), "Unknown");
        assert_eq!(label_member(Some(""), Some("Bo")), "Bo (guest)");
    }

    #[test]
    fn test_expense_created_by_viewer() {
        let item = format_activity(
            &record(ActivityKind::ExpenseCreated),
            &[MemberId::new(1)],
            today(),
        );
        assert_eq!(item.title, "You added \"Dinner\" in \"Trip\".");
        assert_eq!(item.detail, "Expense recorded");
        assert_eq!(item.date_label, "Today");
    }

    #[test]
    fn test_expense_deleted_by_someone_else() {
        let mut r = record(ActivityKind::ExpenseDeleted);
        r.metadata.description = None;
        let item = format_activity(&r, &[MemberId::new(5)], today());
        assert_eq!(item.title, "Ana deleted \"an expense\" in \"Trip\".");
        assert_eq!(item.detail, "Expense removed");
    }

    #[test]
    fn test_settlement_details_by_viewer_role() {
        let mut r = record(ActivityKind::SettlementCreated);
        r.from = Some(party(2, None, Some("Bo")));
        r.to = Some(party(1, Some("Ana"), None));

        let received = format_activity(&r, &[MemberId::new(1)], today());
        assert_eq!(received.title, "Bo (guest) paid Ana in \"Trip\".");
        assert_eq!(received.detail, "You received EUR50.00");

        let paid = format_activity(&r, &[MemberId::new(2)], today());
        assert_eq!(paid.detail, "You paid EUR50.00");

        let bystander = format_activity(&r, &[MemberId::new(9)], today());
        assert_eq!(bystander.detail, "Payment recorded EUR50.00");
    }

    #[test]
    fn test_date_labels() {
        let at = |d: u32| Utc.with_ymd_and_hms(2026, 10, d, 23, 0, 0).unwrap();
        assert_eq!(date_label(at(16), today()), "Today");
        assert_eq!(date_label(at(15), today()), "Yesterday");
        assert_eq!(date_label(at(3), today()), "Oct 3");
    }

    #[test]
    fn test_feed_item_json() {
        let item = format_activity(&record(ActivityKind::ExpenseCreated), &[], today());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "expense_created");
        assert_eq!(json["groupName"], "Trip");
        assert_eq!(json["amount"], 50.0);
        assert_eq!(json["dateLabel"], "Today");
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [
            ActivityKind::ExpenseCreated,
            ActivityKind::ExpenseUpdated,
            ActivityKind::ExpenseDeleted,
            ActivityKind::SettlementCreated,
        ] {
            assert_eq!(kind.as_str().parse::<ActivityKind>().unwrap(), kind);
        }
        assert!("group_created".parse::<ActivityKind>().is_err());
    }
}

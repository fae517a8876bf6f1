//! Activity repository: writes feed entries and reads them back joined
//! with their group and members.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use spendbee_core::activity::{ActivityKind, ActivityMetadata, ActivityParty, ActivityRecord};
use spendbee_shared::types::{ActivityId, ExpenseId, GroupId, MemberId, SettlementId, UserId};

use crate::entities::{activities, group_members, groups, users};

/// Input for a new activity row.
#[derive(Debug, Clone)]
pub struct NewActivity {
    /// Group the event happened in.
    pub group_id: GroupId,
    /// Membership of the acting user.
    pub actor: MemberId,
    /// Event type.
    pub kind: ActivityKind,
    /// Related expense.
    pub expense_id: Option<ExpenseId>,
    /// Related settlement.
    pub settlement_id: Option<SettlementId>,
    /// Paying member, for settlements.
    pub from: Option<MemberId>,
    /// Receiving member, for settlements.
    pub to: Option<MemberId>,
    /// Amount involved.
    pub amount: Option<Decimal>,
    /// Currency of `amount`.
    pub currency: Option<String>,
    /// Description and note snapshot.
    pub metadata: ActivityMetadata,
}

/// Activity rows visible to one user, plus the user's memberships.
#[derive(Debug, Clone, Default)]
pub struct ActivityFeed {
    /// Member IDs of the viewer across all groups.
    pub viewer_members: Vec<MemberId>,
    /// Newest first.
    pub records: Vec<ActivityRecord>,
}

/// Inserts an activity row on `conn`, which may be an open transaction.
///
/// # Errors
///
/// Returns an error if the metadata cannot be encoded or the insert fails.
pub async fn insert_activity<C: ConnectionTrait>(
    conn: &C,
    activity: NewActivity,
) -> Result<activities::Model, DbErr> {
    let metadata = serde_json::to_value(&activity.metadata)
        .map_err(|e| DbErr::Custom(format!("activity metadata: {e}")))?;

    activities::ActiveModel {
        group_id: Set(activity.group_id.into_inner()),
        actor_member_id: Set(activity.actor.into_inner()),
        kind: Set(activity.kind.as_str().to_string()),
        expense_id: Set(activity.expense_id.map(ExpenseId::into_inner)),
        settlement_id: Set(activity.settlement_id.map(SettlementId::into_inner)),
        from_member_id: Set(activity.from.map(MemberId::into_inner)),
        to_member_id: Set(activity.to.map(MemberId::into_inner)),
        amount: Set(activity.amount),
        currency: Set(activity.currency),
        metadata: Set(Some(metadata)),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(conn)
    .await
}

/// Activity repository for feed queries.
#[derive(Debug, Clone)]
pub struct ActivityRepository {
    db: DatabaseConnection,
}

impl ActivityRepository {
    /// Creates a new activity repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads the newest `limit` activities across every group the user
    /// belongs to.
    ///
    /// Rows with an unrecognized type are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn feed_for_user(&self, user_id: UserId, limit: u64) -> Result<ActivityFeed, DbErr> {
        let memberships = group_members::Entity::find()
            .filter(group_members::Column::UserId.eq(user_id.into_inner()))
            .all(&self.db)
            .await?;
        if memberships.is_empty() {
            return Ok(ActivityFeed::default());
        }

        let viewer_members = memberships.iter().map(|m| MemberId::new(m.id)).collect();
        let group_ids: Vec<i32> = memberships.iter().map(|m| m.group_id).collect();

        let rows = activities::Entity::find()
            .filter(activities::Column::GroupId.is_in(group_ids.clone()))
            .order_by_desc(activities::Column::CreatedAt)
            .order_by_desc(activities::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;

        let groups: HashMap<i32, groups::Model> = groups::Entity::find()
            .filter(groups::Column::Id.is_in(group_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|g| (g.id, g))
            .collect();

        let member_ids: BTreeSet<i32> = rows
            .iter()
            .flat_map(|r| [Some(r.actor_member_id), r.from_member_id, r.to_member_id])
            .flatten()
            .collect();
        let parties = self.load_parties(member_ids).await?;

        let records = rows
            .into_iter()
            .filter_map(|row| {
                let Ok(kind) = row.kind.parse::<ActivityKind>() else {
                    tracing::warn!(activity_id = row.id, kind = %row.kind, "Skipping activity with unknown type");
                    return None;
                };
                let group = groups.get(&row.group_id);
                let party = |id: Option<i32>| id.and_then(|id| parties.get(&id).cloned());
                Some(ActivityRecord {
                    id: ActivityId::new(row.id),
                    kind,
                    group_uuid: group.map(|g| g.uuid.clone()),
                    group_name: group.map(|g| g.name.clone()),
                    actor: party(Some(row.actor_member_id)),
                    from: party(row.from_member_id),
                    to: party(row.to_member_id),
                    metadata: row
                        .metadata
                        .and_then(|v| serde_json::from_value(v).ok())
                        .unwrap_or_default(),
                    amount: row.amount,
                    currency: row.currency,
                    created_at: row.created_at.with_timezone(&Utc),
                })
            })
            .collect();

        Ok(ActivityFeed {
            viewer_members,
            records,
        })
    }

    async fn load_parties(
        &self,
        member_ids: BTreeSet<i32>,
    ) -> Result<HashMap<i32, ActivityParty>, DbErr> {
        if member_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = group_members::Entity::find()
            .filter(group_members::Column::Id.is_in(member_ids))
            .find_also_related(users::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(member, user)| {
                (
                    member.id,
                    ActivityParty {
                        member_id: MemberId::new(member.id),
                        user_name: user.map(|u| u.name),
                        guest_name: member.name,
                    },
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn at(day: u32) -> sea_orm::prelude::DateTimeWithTimeZone {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 3, day, 12, 0, 0)
            .unwrap()
    }

    fn membership(id: i32, group_id: i32, user_id: Option<i32>, name: Option<&str>) -> group_members::Model {
        group_members::Model {
            id,
            group_id,
            user_id,
            name: name.map(str::to_string),
            joined_at: at(1),
        }
    }

    #[tokio::test]
    async fn test_feed_is_empty_without_memberships() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<group_members::Model>::new()])
            .into_connection();

        let feed = ActivityRepository::new(db)
            .feed_for_user(UserId::new(1), 50)
            .await
            .unwrap();

        assert!(feed.records.is_empty());
        assert!(feed.viewer_members.is_empty());
    }

    #[tokio::test]
    async fn test_feed_joins_groups_and_members() {
        let settlement = activities::Model {
            id: 11,
            group_id: 3,
            actor_member_id: 7,
            kind: "settlement_created".into(),
            expense_id: None,
            settlement_id: Some(4),
            from_member_id: Some(8),
            to_member_id: Some(7),
            amount: Some(dec!(50)),
            currency: Some("EUR".into()),
            metadata: Some(serde_json::json!({})),
            created_at: at(5),
        };
        let mut unknown = settlement.clone();
        unknown.id = 10;
        unknown.kind = "group_renamed".into();

        let group = groups::Model {
            id: 3,
            uuid: "g-3".into(),
            name: "Trip".into(),
            description: None,
            base_currency: Some("EUR".into()),
            archived: false,
            created_by: Some(1),
            created_at: at(1),
        };
        let ana = users::Model {
            id: 1,
            email: "ana@example.com".into(),
            password: "hash".into(),
            name: "Ana".into(),
            avatar_url: None,
            created_at: at(1),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![membership(7, 3, Some(1), None)]])
            .append_query_results([vec![settlement, unknown]])
            .append_query_results([vec![group]])
            .append_query_results([vec![
                (membership(7, 3, Some(1), None), Some(ana)),
                (membership(8, 3, None, Some("Bo")), None),
            ]])
            .into_connection();

        let feed = ActivityRepository::new(db)
            .feed_for_user(UserId::new(1), 50)
            .await
            .unwrap();

        assert_eq!(feed.viewer_members, vec![MemberId::new(7)]);
        assert_eq!(feed.records.len(), 1);
        let record = &feed.records[0];
        assert_eq!(record.kind, ActivityKind::SettlementCreated);
        assert_eq!(record.group_name.as_deref(), Some("Trip"));
        assert_eq!(record.from.as_ref().unwrap().guest_name.as_deref(), Some("Bo"));
        assert_eq!(record.to.as_ref().unwrap().user_name.as_deref(), Some("Ana"));
    }
}

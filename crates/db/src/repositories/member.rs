//! Member repository: memberships, guests, and member lookups.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use spendbee_core::balance::MemberInfo;
use spendbee_shared::types::{GroupId, MemberId, UserId};

use crate::entities::{expense_shares, expenses, group_members, settlements, users};

/// A member row with its linked user, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberWithUser {
    /// Member row.
    pub member: group_members::Model,
    /// Linked account; `None` for guests.
    pub user: Option<users::Model>,
}

impl MemberWithUser {
    /// Projects the row into the balance aggregator's input.
    #[must_use]
    pub fn to_member_info(&self) -> MemberInfo {
        MemberInfo {
            id: MemberId::new(self.member.id),
            user_id: self.member.user_id.map(UserId::new),
            user_name: self.user.as_ref().map(|u| u.name.clone()),
            guest_name: self.member.name.clone(),
        }
    }
}

/// Member repository.
#[derive(Debug, Clone)]
pub struct MemberRepository {
    db: DatabaseConnection,
}

impl MemberRepository {
    /// Creates a new member repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds the user's membership in a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_membership(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<Option<group_members::Model>, DbErr> {
        group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.into_inner()))
            .filter(group_members::Column::UserId.eq(user_id.into_inner()))
            .one(&self.db)
            .await
    }

    /// Finds a member by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: MemberId) -> Result<Option<group_members::Model>, DbErr> {
        group_members::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
    }

    /// Lists a group's members with their users, in join order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_with_users(&self, group_id: GroupId) -> Result<Vec<MemberWithUser>, DbErr> {
        let rows = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.into_inner()))
            .order_by_asc(group_members::Column::JoinedAt)
            .order_by_asc(group_members::Column::Id)
            .find_also_related(users::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(member, user)| MemberWithUser { member, user })
            .collect())
    }

    /// IDs of every member of a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn member_ids(&self, group_id: GroupId) -> Result<Vec<MemberId>, DbErr> {
        let rows = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.into_inner()))
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(|m| MemberId::new(m.id)).collect())
    }

    /// Adds a guest member known only by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn add_guest(
        &self,
        group_id: GroupId,
        name: &str,
    ) -> Result<group_members::Model, DbErr> {
        let member = group_members::ActiveModel {
            group_id: Set(group_id.into_inner()),
            user_id: Set(None),
            name: Set(Some(name.to_string())),
            joined_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!(group_id = %group_id, member_id = member.id, "Guest member added");
        Ok(member)
    }

    /// True if any expense, share or settlement points at the member.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn has_records(&self, id: MemberId) -> Result<bool, DbErr> {
        let id = id.into_inner();

        let paid = expenses::Entity::find()
            .filter(expenses::Column::PaidBy.eq(id))
            .count(&self.db)
            .await?;
        if paid > 0 {
            return Ok(true);
        }

        let shares = expense_shares::Entity::find()
            .filter(expense_shares::Column::MemberId.eq(id))
            .count(&self.db)
            .await?;
        if shares > 0 {
            return Ok(true);
        }

        let settled = settlements::Entity::find()
            .filter(
                Condition::any()
                    .add(settlements::Column::FromMemberId.eq(id))
                    .add(settlements::Column::ToMemberId.eq(id)),
            )
            .count(&self.db)
            .await?;
        Ok(settled > 0)
    }

    /// Removes a member.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn remove(&self, id: MemberId) -> Result<bool, DbErr> {
        let result = group_members::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::BTreeMap;

    fn ts() -> sea_orm::prelude::DateTimeWithTimeZone {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .unwrap()
    }

    fn count(n: i64) -> BTreeMap<String, sea_orm::Value> {
        BTreeMap::from([("num_items".to_string(), sea_orm::Value::BigInt(Some(n)))])
    }

    #[test]
    fn test_member_info_projection() {
        let linked = MemberWithUser {
            member: group_members::Model {
                id: 1,
                group_id: 1,
                user_id: Some(5),
                name: None,
                joined_at: ts(),
            },
            user: Some(users::Model {
                id: 5,
                email: "ana@example.com".into(),
                password: "hash".into(),
                name: "Ana".into(),
                avatar_url: None,
                created_at: ts(),
            }),
        };
        let info = linked.to_member_info();
        assert_eq!(info.display_name(), "Ana");
        assert!(!info.is_guest());

        let guest = MemberWithUser {
            member: group_members::Model {
                id: 2,
                group_id: 1,
                user_id: None,
                name: Some("Bo".into()),
                joined_at: ts(),
            },
            user: None,
        };
        let info = guest.to_member_info();
        assert_eq!(info.display_name(), "Bo");
        assert!(info.is_guest());
    }

    #[tokio::test]
    async fn test_has_records_stops_at_first_reference() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count(0)]])
            .append_query_results([vec![count(2)]])
            .into_connection();

        assert!(MemberRepository::new(db).has_records(MemberId::new(2)).await.unwrap());
    }

    #[tokio::test]
    async fn test_has_records_false_for_untouched_guest() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count(0)], vec![count(0)], vec![count(0)]])
            .into_connection();

        assert!(!MemberRepository::new(db).has_records(MemberId::new(2)).await.unwrap());
    }
}

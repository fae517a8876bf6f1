//! Group access checks shared by group-scoped handlers.

use sea_orm::DatabaseConnection;
use spendbee_db::entities::{group_members, groups};
use spendbee_db::{GroupRepository, MemberRepository};
use spendbee_shared::AppError;
use spendbee_shared::types::{GroupId, MemberId, UserId, normalize_currency};

use crate::error::ApiResult;

/// A group together with the caller's membership in it.
#[derive(Debug, Clone)]
pub struct GroupAccess {
    /// The group.
    pub group: groups::Model,
    /// The caller's member row.
    pub membership: group_members::Model,
}

impl GroupAccess {
    /// The caller's member ID in this group.
    #[must_use]
    pub const fn member_id(&self) -> MemberId {
        MemberId::new(self.membership.id)
    }

    /// The group's ID.
    #[must_use]
    pub const fn group_id(&self) -> GroupId {
        GroupId::new(self.group.id)
    }

    /// The group's base currency, defaulted.
    #[must_use]
    pub fn base_currency(&self) -> String {
        normalize_currency(self.group.base_currency.as_deref())
    }

    /// Fails with 403 unless the caller created the group.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for any other member.
    pub fn require_creator(&self, user_id: UserId) -> ApiResult<()> {
        if self.group.created_by == Some(user_id.into_inner()) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Only the group creator can do this".into()).into())
        }
    }

    /// Fails with 403 if the group is archived.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for archived groups.
    pub fn require_active(&self) -> ApiResult<()> {
        if self.group.archived {
            Err(AppError::Forbidden("Group is archived".into()).into())
        } else {
            Ok(())
        }
    }
}

/// Loads a group and the caller's membership.
///
/// # Errors
///
/// 404 if the group does not exist, 403 if the caller is not a member.
pub async fn require_member(
    db: &DatabaseConnection,
    group_id: GroupId,
    user_id: UserId,
) -> ApiResult<GroupAccess> {
    let group = GroupRepository::new(db.clone())
        .find_by_id(group_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Group not found".into()))?;

    let membership = MemberRepository::new(db.clone())
        .find_membership(group_id, user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("Not a member of this group".into()))?;

    Ok(GroupAccess { group, membership })
}

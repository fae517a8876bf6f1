//! Notification repository: the user's inbox and group invitations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use spendbee_shared::types::{GroupId, NotificationId, UserId};

use crate::entities::{group_members, groups, notifications};

/// Notification type for an invitation to an existing user.
pub const GROUP_INVITE: &str = "group_invite";

/// Error types for notification operations.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Missing, or owned by another user.
    #[error("Notification not found")]
    NotFound,

    /// The notification cannot be accepted.
    #[error("Invalid notification type")]
    InvalidType,

    /// The inviting group no longer exists.
    #[error("Group no longer exists")]
    GroupGone,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Payload of a `group_invite` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInviteData {
    /// Group to join.
    pub group_id: GroupId,
    /// Group name at invitation time.
    pub group_name: String,
    /// Name of the inviting user.
    pub invited_by: String,
}

/// Notification repository.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<notifications::Model>, DbErr> {
        notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id.into_inner()))
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .all(&self.db)
            .await
    }

    /// Counts unread notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn unread_count(&self, user_id: UserId) -> Result<u64, DbErr> {
        notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id.into_inner()))
            .filter(notifications::Column::Read.eq(false))
            .count(&self.db)
            .await
    }

    /// Creates a `group_invite` notification for an existing user.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be encoded or the insert fails.
    pub async fn create_group_invite(
        &self,
        user_id: UserId,
        data: &GroupInviteData,
    ) -> Result<notifications::Model, DbErr> {
        let payload =
            serde_json::to_value(data).map_err(|e| DbErr::Custom(format!("invite payload: {e}")))?;

        notifications::ActiveModel {
            user_id: Set(user_id.into_inner()),
            kind: Set(GROUP_INVITE.to_string()),
            title: Set("Group invitation".to_string()),
            message: Set(format!(
                "{} invited you to join \"{}\"",
                data.invited_by, data.group_name
            )),
            data: Set(Some(payload)),
            read: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// True if the user already has an unanswered invite to the group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn has_pending_invite(&self, user_id: UserId, group_id: GroupId) -> Result<bool, DbErr> {
        let invites = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id.into_inner()))
            .filter(notifications::Column::Kind.eq(GROUP_INVITE))
            .all(&self.db)
            .await?;

        Ok(invites
            .iter()
            .filter_map(invite_data)
            .any(|data| data.group_id == group_id))
    }

    /// Marks a notification read.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::NotFound` if the user does not own it.
    pub async fn mark_read(
        &self,
        id: NotificationId,
        user_id: UserId,
    ) -> Result<(), NotificationError> {
        let notification = self.find_owned(id, user_id).await?;

        notifications::ActiveModel {
            id: Set(notification.id),
            read: Set(true),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    /// Accepts a group invitation: joins the group unless already a member
    /// and deletes the notification.
    ///
    /// Returns the joined group, or `None` if the user was already a member.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError` if the notification is missing, not an
    /// invitation, points at a deleted group, or a database operation fails.
    pub async fn accept(
        &self,
        id: NotificationId,
        user_id: UserId,
    ) -> Result<Option<groups::Model>, NotificationError> {
        let txn = self.db.begin().await?;

        let notification = notifications::Entity::find_by_id(id.into_inner())
            .one(&txn)
            .await?
            .filter(|n| n.user_id == user_id.into_inner())
            .ok_or(NotificationError::NotFound)?;
        if notification.kind != GROUP_INVITE {
            return Err(NotificationError::InvalidType);
        }
        let data = invite_data(&notification).ok_or(NotificationError::InvalidType)?;

        notifications::Entity::delete_by_id(notification.id)
            .exec(&txn)
            .await?;

        let Some(group) = groups::Entity::find_by_id(data.group_id.into_inner())
            .one(&txn)
            .await?
        else {
            txn.commit().await?;
            return Err(NotificationError::GroupGone);
        };

        let existing = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group.id))
            .filter(group_members::Column::UserId.eq(user_id.into_inner()))
            .one(&txn)
            .await?;
        if existing.is_some() {
            txn.commit().await?;
            return Ok(None);
        }

        group_members::ActiveModel {
            group_id: Set(group.id),
            user_id: Set(Some(user_id.into_inner())),
            name: Set(None),
            joined_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        tracing::info!(group_id = group.id, user_id = %user_id, "Invitation accepted");
        Ok(Some(group))
    }

    /// Declines (deletes) a notification.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::NotFound` if the user does not own it.
    pub async fn decline(&self, id: NotificationId, user_id: UserId) -> Result<(), NotificationError> {
        let notification = self.find_owned(id, user_id).await?;
        notifications::Entity::delete_by_id(notification.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn find_owned(
        &self,
        id: NotificationId,
        user_id: UserId,
    ) -> Result<notifications::Model, NotificationError> {
        notifications::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .filter(|n| n.user_id == user_id.into_inner())
            .ok_or(NotificationError::NotFound)
    }
}

fn invite_data(notification: &notifications::Model) -> Option<GroupInviteData> {
    notification
        .data
        .clone()
        .and_then(|v| serde_json::from_value(v).ok())
}

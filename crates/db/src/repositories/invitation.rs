//! Invitation tokens for people who do not have an account yet.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use spendbee_shared::types::{GroupId, UserId};
use uuid::Uuid;

use crate::entities::invitation_tokens;

/// How long a signup link stays valid.
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Invitation repository.
#[derive(Debug, Clone)]
pub struct InvitationRepository {
    db: DatabaseConnection,
}

impl InvitationRepository {
    /// Creates a new invitation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Issues a token for `email` to join `group_id`, valid for
    /// [`INVITATION_TTL_DAYS`] from `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        group_id: GroupId,
        email: &str,
        invited_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<invitation_tokens::Model, DbErr> {
        invitation_tokens::ActiveModel {
            token: Set(Uuid::new_v4().simple().to_string()),
            email: Set(email.to_string()),
            group_id: Set(group_id.into_inner()),
            invited_by: Set(invited_by.into_inner()),
            used: Set(false),
            expires_at: Set((now + Duration::days(INVITATION_TTL_DAYS)).into()),
            created_at: Set(now.into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// Unused, unexpired invitations of a group, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn pending_for_group(
        &self,
        group_id: GroupId,
        now: DateTime<Utc>,
    ) -> Result<Vec<invitation_tokens::Model>, DbErr> {
        invitation_tokens::Entity::find()
            .filter(invitation_tokens::Column::GroupId.eq(group_id.into_inner()))
            .filter(invitation_tokens::Column::Used.eq(false))
            .filter(invitation_tokens::Column::ExpiresAt.gt(now))
            .order_by_desc(invitation_tokens::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Looks up a token that can still be used at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_valid(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<invitation_tokens::Model>, DbErr> {
        invitation_tokens::Entity::find()
            .filter(invitation_tokens::Column::Token.eq(token))
            .filter(invitation_tokens::Column::Used.eq(false))
            .filter(invitation_tokens::Column::ExpiresAt.gt(now))
            .one(&self.db)
            .await
    }

    /// Revokes a pending invitation of the group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn revoke(&self, group_id: GroupId, id: i32) -> Result<bool, DbErr> {
        let result = invitation_tokens::Entity::delete_many()
            .filter(invitation_tokens::Column::Id.eq(id))
            .filter(invitation_tokens::Column::GroupId.eq(group_id.into_inner()))
            .filter(invitation_tokens::Column::Used.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

/// Signup link for a token.
#[must_use]
pub fn invitation_link(public_url: &str, token: &str) -> String {
    format!("{}/register?token={token}", public_url.trim_end_matches('/'))
}

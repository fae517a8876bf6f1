//! User repository for database operations.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};
use spendbee_shared::types::UserId;

use crate::entities::{group_members, groups, invitation_tokens, users};

/// Error types for registration.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// Email is already registered.
    #[error("Email already registered")]
    EmailTaken,

    /// Token is unknown, used, expired, or issued to another email.
    #[error("Invitation is invalid or has expired")]
    InvalidInvitation,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Fields to change on a user. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// New display name.
    pub name: Option<String>,
    /// New avatar URL; `Some(None)` clears it.
    pub avatar_url: Option<Option<String>>,
    /// New argon2 hash.
    pub password_hash: Option<String>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> Result<users::Model, DbErr> {
        new_user(email, password_hash, name).insert(&self.db).await
    }

    /// Creates a user from an invitation and joins them to the inviting
    /// group, consuming the token.
    ///
    /// The token must be unused, unexpired at `now`, and issued to `email`
    /// (compared case-insensitively). All three writes share a transaction.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError` if the email is taken, the invitation is
    /// not valid, or a database operation fails.
    pub async fn register_with_invitation(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(users::Model, groups::Model), RegistrationError> {
        let txn = self.db.begin().await?;

        let taken = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&txn)
            .await?;
        if taken > 0 {
            return Err(RegistrationError::EmailTaken);
        }

        let invitation = invitation_tokens::Entity::find()
            .filter(invitation_tokens::Column::Token.eq(token))
            .filter(invitation_tokens::Column::Used.eq(false))
            .one(&txn)
            .await?
            .filter(|inv| inv.expires_at.with_timezone(&Utc) > now)
            .filter(|inv| inv.email.eq_ignore_ascii_case(email))
            .ok_or(RegistrationError::InvalidInvitation)?;

        let group = groups::Entity::find_by_id(invitation.group_id)
            .one(&txn)
            .await?
            .ok_or(RegistrationError::InvalidInvitation)?;

        let user = new_user(email, password_hash, name).insert(&txn).await?;

        group_members::ActiveModel {
            group_id: Set(group.id),
            user_id: Set(Some(user.id)),
            name: Set(None),
            joined_at: Set(now.into()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        invitation_tokens::ActiveModel {
            id: Set(invitation.id),
            used: Set(true),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        txn.commit().await?;

        tracing::info!(user_id = user.id, group_id = group.id, "User registered from invitation");
        Ok((user, group))
    }

    /// Applies a profile update.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the update fails.
    pub async fn update(&self, id: UserId, input: UpdateUserInput) -> Result<users::Model, DbErr> {
        let mut user = users::ActiveModel {
            id: Set(id.into_inner()),
            ..Default::default()
        };
        let mut changed = false;
        if let Some(name) = input.name {
            user.name = Set(name);
            changed = true;
        }
        if let Some(avatar_url) = input.avatar_url {
            user.avatar_url = Set(avatar_url);
            changed = true;
        }
        if let Some(hash) = input.password_hash {
            user.password = Set(hash);
            changed = true;
        }

        if !changed {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| DbErr::RecordNotFound(format!("user {id}")));
        }
        user.update(&self.db).await
    }
}

fn new_user(email: &str, password_hash: &str, name: &str) -> users::ActiveModel {
    users::ActiveModel {
        email: Set(email.to_string()),
        password: Set(password_hash.to_string()),
        name: Set(name.to_string()),
        avatar_url: Set(None),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
}

//! Group repository for database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use spendbee_shared::types::{GroupId, UserId, normalize_currency};
use uuid::Uuid;

use crate::entities::{group_members, groups};

/// Input for creating a group.
#[derive(Debug, Clone)]
pub struct CreateGroupInput {
    /// Group name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Base currency; unset means the default.
    pub base_currency: Option<String>,
    /// Creating user, who becomes the first member.
    pub created_by: UserId,
}

/// Group repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct GroupRepository {
    db: DatabaseConnection,
}

impl GroupRepository {
    /// Creates a new group repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a group and the creator's membership in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if either insert fails.
    pub async fn create(
        &self,
        input: CreateGroupInput,
    ) -> Result<(groups::Model, group_members::Model), DbErr> {
        let now = Utc::now().into();
        let txn = self.db.begin().await?;

        let group = groups::ActiveModel {
            uuid: Set(Uuid::new_v4().to_string()),
            name: Set(input.name),
            description: Set(input.description),
            base_currency: Set(Some(normalize_currency(input.base_currency.as_deref()))),
            archived: Set(false),
            created_by: Set(Some(input.created_by.into_inner())),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let member = group_members::ActiveModel {
            group_id: Set(group.id),
            user_id: Set(Some(input.created_by.into_inner())),
            name: Set(None),
            joined_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        tracing::info!(group_id = group.id, user_id = %input.created_by, "Group created");
        Ok((group, member))
    }

    /// Finds a group by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: GroupId) -> Result<Option<groups::Model>, DbErr> {
        groups::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
    }

    /// Lists the groups a user belongs to, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<groups::Model>, DbErr> {
        groups::Entity::find()
            .inner_join(group_members::Entity)
            .filter(group_members::Column::UserId.eq(user_id.into_inner()))
            .order_by_desc(groups::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Updates name and description. `None` leaves a field unchanged;
    /// `Some(None)` clears the description.
    ///
    /// # Errors
    ///
    /// Returns an error if the group does not exist or the update fails.
    pub async fn update_details(
        &self,
        id: GroupId,
        name: Option<String>,
        description: Option<Option<String>>,
    ) -> Result<groups::Model, DbErr> {
        let mut group = groups::ActiveModel {
            id: Set(id.into_inner()),
            ..Default::default()
        };
        let mut changed = false;
        if let Some(name) = name {
            group.name = Set(name);
            changed = true;
        }
        if let Some(description) = description {
            group.description = Set(description);
            changed = true;
        }

        if !changed {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| DbErr::RecordNotFound(format!("group {id}")));
        }
        group.update(&self.db).await
    }

    /// Sets the archived flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the group does not exist or the update fails.
    pub async fn set_archived(&self, id: GroupId, archived: bool) -> Result<groups::Model, DbErr> {
        groups::ActiveModel {
            id: Set(id.into_inner()),
            archived: Set(archived),
            ..Default::default()
        }
        .update(&self.db)
        .await
    }

    /// Changes the base currency. The code is stored normalized.
    ///
    /// Existing expenses keep the rate captured when they were created.
    ///
    /// # Errors
    ///
    /// Returns an error if the group does not exist or the update fails.
    pub async fn set_base_currency(
        &self,
        id: GroupId,
        currency: &str,
    ) -> Result<groups::Model, DbErr> {
        groups::ActiveModel {
            id: Set(id.into_inner()),
            base_currency: Set(Some(normalize_currency(Some(currency)))),
            ..Default::default()
        }
        .update(&self.db)
        .await
    }

    /// Deletes a group; members, expenses, settlements, activities and
    /// invitations go with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete(&self, id: GroupId) -> Result<bool, DbErr> {
        let result = groups::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await?;

        if result.rows_affected > 0 {
            tracing::info!(group_id = %id, "Group deleted");
        }
        Ok(result.rows_affected > 0)
    }
}

//! Activity feed, notifications and invitation tokens.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(ACTIVITIES_SQL).await?;
        db.execute_unprepared(NOTIFICATIONS_SQL).await?;
        db.execute_unprepared(INVITATION_TOKENS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS invitation_tokens CASCADE;
             DROP TABLE IF EXISTS notifications CASCADE;
             DROP TABLE IF EXISTS activities CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const ACTIVITIES_SQL: &str = r"
CREATE TABLE activities (
    id SERIAL PRIMARY KEY,
    group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    actor_member_id INTEGER NOT NULL REFERENCES group_members(id) ON DELETE CASCADE,
    type VARCHAR(32) NOT NULL,
    expense_id INTEGER REFERENCES expenses(id) ON DELETE SET NULL,
    settlement_id INTEGER REFERENCES settlements(id) ON DELETE SET NULL,
    from_member_id INTEGER REFERENCES group_members(id) ON DELETE SET NULL,
    to_member_id INTEGER REFERENCES group_members(id) ON DELETE SET NULL,
    amount NUMERIC(12, 2),
    currency VARCHAR(3),
    metadata JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_activities_group ON activities(group_id);
CREATE INDEX idx_activities_actor ON activities(actor_member_id);
CREATE INDEX idx_activities_created ON activities(created_at DESC);
";

const NOTIFICATIONS_SQL: &str = r"
CREATE TABLE notifications (
    id SERIAL PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    type VARCHAR(32) NOT NULL,
    title VARCHAR(255) NOT NULL,
    message TEXT NOT NULL,
    data JSONB,
    read BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_notifications_user ON notifications(user_id, created_at DESC);
CREATE INDEX idx_notifications_unread ON notifications(user_id) WHERE read = false;
";

const INVITATION_TOKENS_SQL: &str = r"
CREATE TABLE invitation_tokens (
    id SERIAL PRIMARY KEY,
    token VARCHAR(64) NOT NULL UNIQUE,
    email VARCHAR(255) NOT NULL,
    group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    invited_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    used BOOLEAN NOT NULL DEFAULT false,
    expires_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_invitation_tokens_group ON invitation_tokens(group_id) WHERE used = false;
";

//! Initial database migration.
//!
//! Creates users, groups, members, expenses with their shares, and
//! settlements.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(GROUPS_SQL).await?;
        db.execute_unprepared(GROUP_MEMBERS_SQL).await?;
        db.execute_unprepared(EXPENSES_SQL).await?;
        db.execute_unprepared(SETTLEMENTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const USERS_SQL: &str = r"
CREATE TABLE users (
    id SERIAL PRIMARY KEY,
    email VARCHAR(255) NOT NULL UNIQUE,
    password VARCHAR(255) NOT NULL,
    name VARCHAR(255) NOT NULL,
    avatar_url TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const GROUPS_SQL: &str = r"
CREATE TABLE groups (
    id SERIAL PRIMARY KEY,
    uuid VARCHAR(36) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    description TEXT,
    base_currency VARCHAR(3) DEFAULT 'EUR',
    archived BOOLEAN NOT NULL DEFAULT false,
    created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const GROUP_MEMBERS_SQL: &str = r"
CREATE TABLE group_members (
    id SERIAL PRIMARY KEY,
    group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    user_id INTEGER REFERENCES users(id) ON DELETE CASCADE,
    name VARCHAR(255),
    joined_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    -- Guests need a name to be shown at all
    CONSTRAINT chk_member_identity CHECK (user_id IS NOT NULL OR name IS NOT NULL)
);

CREATE INDEX idx_group_members_group ON group_members(group_id);
CREATE INDEX idx_group_members_user ON group_members(user_id) WHERE user_id IS NOT NULL;
CREATE UNIQUE INDEX idx_group_members_unique_user ON group_members(group_id, user_id)
    WHERE user_id IS NOT NULL;
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id SERIAL PRIMARY KEY,
    group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    description VARCHAR(255) NOT NULL,
    note TEXT,
    amount NUMERIC(12, 2) NOT NULL CHECK (amount > 0),
    currency VARCHAR(3) DEFAULT 'EUR',
    exchange_rate NUMERIC(18, 8) NOT NULL DEFAULT 1,
    paid_by INTEGER NOT NULL REFERENCES group_members(id) ON DELETE CASCADE,
    receipt_image_url TEXT,
    receipt_items JSONB,
    attachments JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_expenses_group ON expenses(group_id, created_at DESC);

CREATE TABLE expense_shares (
    id SERIAL PRIMARY KEY,
    expense_id INTEGER NOT NULL REFERENCES expenses(id) ON DELETE CASCADE,
    member_id INTEGER NOT NULL REFERENCES group_members(id) ON DELETE CASCADE,
    share NUMERIC(12, 2) NOT NULL CHECK (share >= 0),
    CONSTRAINT uq_expense_share_member UNIQUE (expense_id, member_id)
);

CREATE INDEX idx_expense_shares_expense ON expense_shares(expense_id);
";

const SETTLEMENTS_SQL: &str = r"
CREATE TABLE settlements (
    id SERIAL PRIMARY KEY,
    group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    from_member_id INTEGER NOT NULL REFERENCES group_members(id) ON DELETE CASCADE,
    to_member_id INTEGER NOT NULL REFERENCES group_members(id) ON DELETE CASCADE,
    amount NUMERIC(12, 2) NOT NULL CHECK (amount > 0),
    currency VARCHAR(3) DEFAULT 'EUR',
    exchange_rate NUMERIC(18, 8) NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_settlement_parties CHECK (from_member_id <> to_member_id)
);

CREATE INDEX idx_settlements_group ON settlements(group_id, created_at DESC);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS settlements CASCADE;
DROP TABLE IF EXISTS expense_shares CASCADE;
DROP TABLE IF EXISTS expenses CASCADE;
DROP TABLE IF EXISTS group_members CASCADE;
DROP TABLE IF EXISTS groups CASCADE;
DROP TABLE IF EXISTS users CASCADE;
";

//! Idempotent schema bootstrap for the PostgreSQL backend.

use sqlx::PgPool;
use tracing::info;

use super::manager::DatabaseError;
use crate::models::{
    CommunityContact, CommunityNote, Event, EventStatus, EventType, InvitationStatus, JobOpportunity,
    KeyedModel, LookupModel, Partner, PartnerDocument, PartnerStatus, PartnerType, ServiceType, Sponsor,
    Team, UserNotificationPreference, Waiver,
};

/// Every keyed table shares one layout: indexed key columns plus the full
/// entity as JSONB.
const KEYED_TABLES: &[&str] = &[
    Event::TABLE,
    Partner::TABLE,
    PartnerDocument::TABLE,
    Sponsor::TABLE,
    Waiver::TABLE,
    JobOpportunity::TABLE,
    Team::TABLE,
    CommunityContact::TABLE,
    CommunityNote::TABLE,
    UserNotificationPreference::TABLE,
];

const USERS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    name_identifier TEXT NOT NULL UNIQUE,
    user_name TEXT NOT NULL,
    email TEXT NOT NULL,
    is_site_admin BOOLEAN NOT NULL DEFAULT FALSE,
    created_date TIMESTAMPTZ NOT NULL DEFAULT now()
)"#;

const PARTNER_ADMINS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS partner_admins (
    partner_id UUID NOT NULL,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    PRIMARY KEY (partner_id, user_id)
)"#;

fn keyed_table_ddl(table: &str) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS {table} (
    id UUID PRIMARY KEY,
    parent_id UUID,
    created_by_user_id UUID NOT NULL,
    created_date TIMESTAMPTZ NOT NULL,
    last_updated_by_user_id UUID NOT NULL,
    last_updated_date TIMESTAMPTZ NOT NULL,
    body JSONB NOT NULL
)"#
    )
}

fn lookup_table_ddl(table: &str) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS {table} (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    display_order INTEGER NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE
)"#
    )
}

async fn seed_lookup<T: LookupModel>(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query(&lookup_table_ddl(T::TABLE)).execute(pool).await?;

    let insert = format!(
        "INSERT INTO {} (id, name, description, display_order, is_active) \
         VALUES ($1, $2, $3, $4, $5) ON CONFLICT (id) DO NOTHING",
        T::TABLE
    );
    for row in T::defaults() {
        sqlx::query(&insert)
            .bind(row.id())
            .bind(row.name())
            .bind(row.description())
            .bind(row.display_order())
            .bind(row.is_active())
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// Create missing tables and seed lookup rows. Safe to run on every start.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query(USERS_DDL).execute(pool).await?;
    sqlx::query(PARTNER_ADMINS_DDL).execute(pool).await?;

    for table in KEYED_TABLES {
        sqlx::query(&keyed_table_ddl(table)).execute(pool).await?;
        let index = format!("CREATE INDEX IF NOT EXISTS {table}_parent_idx ON {table} (parent_id)");
        sqlx::query(&index).execute(pool).await?;
    }

    seed_lookup::<EventType>(pool).await?;
    seed_lookup::<EventStatus>(pool).await?;
    seed_lookup::<PartnerType>(pool).await?;
    seed_lookup::<PartnerStatus>(pool).await?;
    seed_lookup::<ServiceType>(pool).await?;
    seed_lookup::<InvitationStatus>(pool).await?;

    info!("Database schema ready ({} keyed tables)", KEYED_TABLES.len());
    Ok(())
}

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::managers::{ManagerError, PartnerAdminRepository, UserRepository};
use crate::models::User;

const USER_COLUMNS: &str = "id, name_identifier, user_name, email, is_site_admin, created_date";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, ManagerError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_by_name_identifier(&self, name_identifier: &str) -> Result<Option<User>, ManagerError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE name_identifier = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(name_identifier)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn add(&self, user: User) -> Result<User, ManagerError> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (name_identifier) DO UPDATE SET user_name = EXCLUDED.user_name, \
             email = EXCLUDED.email, is_site_admin = EXCLUDED.is_site_admin \
             RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.name_identifier)
            .bind(&user.user_name)
            .bind(&user.email)
            .bind(user.is_site_admin)
            .bind(user.created_date)
            .fetch_one(&self.pool)
            .await?)
    }
}

pub struct PgPartnerAdminRepository {
    pool: PgPool,
}

impl PgPartnerAdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PartnerAdminRepository for PgPartnerAdminRepository {
    async fn is_partner_admin(&self, partner_id: Uuid, user_id: Uuid) -> Result<bool, ManagerError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM partner_admins WHERE partner_id = $1 AND user_id = $2)",
        )
        .bind(partner_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn add(&self, partner_id: Uuid, user_id: Uuid) -> Result<(), ManagerError> {
        sqlx::query("INSERT INTO partner_admins (partner_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(partner_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::managers::{run_cancellable, KeyedManager, ManagerError};
use crate::models::{now, KeyedModel};

/// PostgreSQL-backed [`KeyedManager`]. One table per entity type; see
/// `schema::keyed_table_ddl` for the layout.
pub struct PgKeyedStore<T> {
    pool: PgPool,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: KeyedModel> PgKeyedStore<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: PhantomData,
        }
    }

    fn select_sql(filter: &str) -> String {
        format!("SELECT body FROM {} {} ORDER BY created_date, id", T::TABLE, filter)
    }
}

#[async_trait]
impl<T: KeyedModel> KeyedManager<T> for PgKeyedStore<T> {
    async fn get_all(&self, token: &CancellationToken) -> Result<Vec<T>, ManagerError> {
        let sql = Self::select_sql("");
        let rows = run_cancellable(
            token,
            sqlx::query_as::<_, (Json<T>,)>(&sql).fetch_all(&self.pool),
        )
        .await?;
        Ok(rows.into_iter().map(|(Json(entity),)| entity).collect())
    }

    async fn get(&self, id: Uuid, token: &CancellationToken) -> Result<Option<T>, ManagerError> {
        let sql = format!("SELECT body FROM {} WHERE id = $1", T::TABLE);
        let row = run_cancellable(
            token,
            sqlx::query_as::<_, (Json<T>,)>(&sql).bind(id).fetch_optional(&self.pool),
        )
        .await?;
        Ok(row.map(|(Json(entity),)| entity))
    }

    async fn get_by_parent(
        &self,
        parent_id: Uuid,
        token: &CancellationToken,
    ) -> Result<Vec<T>, ManagerError> {
        let sql = Self::select_sql("WHERE parent_id = $1");
        let rows = run_cancellable(
            token,
            sqlx::query_as::<_, (Json<T>,)>(&sql).bind(parent_id).fetch_all(&self.pool),
        )
        .await?;
        Ok(rows.into_iter().map(|(Json(entity),)| entity).collect())
    }

    async fn add(&self, mut entity: T, user_id: Uuid, token: &CancellationToken) -> Result<T, ManagerError> {
        if entity.id().is_nil() {
            entity.set_id(Uuid::new_v4());
        }
        entity.audit_mut().stamp_created(user_id, now());

        let sql = format!(
            "INSERT INTO {} (id, parent_id, created_by_user_id, created_date, \
             last_updated_by_user_id, last_updated_date, body) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
            T::TABLE
        );
        let audit = entity.audit().clone();
        let query = sqlx::query(&sql)
            .bind(entity.id())
            .bind(entity.parent_id())
            .bind(audit.created_by_user_id)
            .bind(audit.created_date)
            .bind(audit.last_updated_by_user_id)
            .bind(audit.last_updated_date)
            .bind(Json(&entity))
            .execute(&self.pool);

        match run_cancellable(token, query).await {
            Ok(_) => Ok(entity),
            Err(ManagerError::Database(sqlx::Error::Database(db))) if db.is_unique_violation() => {
                Err(ManagerError::Conflict(format!("{} {} already exists", T::NAME, entity.id())))
            }
            Err(e) => Err(e),
        }
    }

    async fn update(&self, mut entity: T, user_id: Uuid, token: &CancellationToken) -> Result<T, ManagerError> {
        let expected = entity.audit().last_updated_date;
        entity.audit_mut().stamp_updated(user_id, now());

        let sql = format!(
            "UPDATE {} SET parent_id = $2, last_updated_by_user_id = $3, last_updated_date = $4, body = $5 \
             WHERE id = $1 AND last_updated_date = $6",
            T::TABLE
        );
        let audit = entity.audit().clone();
        let result = run_cancellable(
            token,
            sqlx::query(&sql)
                .bind(entity.id())
                .bind(entity.parent_id())
                .bind(audit.last_updated_by_user_id)
                .bind(audit.last_updated_date)
                .bind(Json(&entity))
                .bind(expected)
                .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(ManagerError::Conflict(format!(
                "{} {} was modified or removed",
                T::NAME,
                entity.id()
            )));
        }
        Ok(entity)
    }

    async fn delete(&self, id: Uuid, token: &CancellationToken) -> Result<u64, ManagerError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = run_cancellable(token, sqlx::query(&sql).bind(id).execute(&self.pool)).await?;
        Ok(result.rows_affected())
    }
}

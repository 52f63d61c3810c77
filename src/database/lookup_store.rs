use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow, PgPool};
use tokio_util::sync::CancellationToken;

use crate::managers::{run_cancellable, LookupManager, ManagerError};
use crate::models::LookupModel;

/// PostgreSQL-backed [`LookupManager`].
pub struct PgLookupStore<T> {
    pool: PgPool,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> PgLookupStore<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<T> LookupManager<T> for PgLookupStore<T>
where
    T: LookupModel + for<'r> FromRow<'r, PgRow>,
{
    async fn get_all(&self, token: &CancellationToken) -> Result<Vec<T>, ManagerError> {
        let sql = format!(
            "SELECT id, name, description, display_order, is_active FROM {} ORDER BY display_order, id",
            T::TABLE
        );
        run_cancellable(token, sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool)).await
    }
}

//! Collaborator contracts the controllers delegate to.
//!
//! Every call takes the request's [`CancellationToken`]; implementations abort
//! with [`ManagerError::Cancelled`] once it fires instead of finishing the work.

use std::future::Future;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::{KeyedModel, LookupModel, User};

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// The row changed (or appeared) between read and write.
    #[error("Concurrency conflict: {0}")]
    Conflict(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// CRUD over one keyed entity type.
#[async_trait]
pub trait KeyedManager<T: KeyedModel>: Send + Sync {
    async fn get_all(&self, token: &CancellationToken) -> Result<Vec<T>, ManagerError>;

    async fn get(&self, id: Uuid, token: &CancellationToken) -> Result<Option<T>, ManagerError>;

    async fn get_by_parent(
        &self,
        parent_id: Uuid,
        token: &CancellationToken,
    ) -> Result<Vec<T>, ManagerError>;

    /// Persists a new entity. A nil id is replaced with a fresh one; audit fields
    /// are stamped with `user_id`.
    async fn add(&self, entity: T, user_id: Uuid, token: &CancellationToken) -> Result<T, ManagerError>;

    /// Replaces the stored entity. Fails with `Conflict` when the stored
    /// `last_updated_date` no longer matches the one on `entity`.
    async fn update(&self, entity: T, user_id: Uuid, token: &CancellationToken) -> Result<T, ManagerError>;

    /// Returns the number of rows removed.
    async fn delete(&self, id: Uuid, token: &CancellationToken) -> Result<u64, ManagerError>;
}

/// Read-only access to one lookup table.
#[async_trait]
pub trait LookupManager<T: LookupModel>: Send + Sync {
    async fn get_all(&self, token: &CancellationToken) -> Result<Vec<T>, ManagerError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, ManagerError>;

    async fn get_by_name_identifier(&self, name_identifier: &str) -> Result<Option<User>, ManagerError>;

    async fn add(&self, user: User) -> Result<User, ManagerError>;
}

/// Which users administer which partners.
#[async_trait]
pub trait PartnerAdminRepository: Send + Sync {
    async fn is_partner_admin(&self, partner_id: Uuid, user_id: Uuid) -> Result<bool, ManagerError>;

    async fn add(&self, partner_id: Uuid, user_id: Uuid) -> Result<(), ManagerError>;
}

/// Races `work` against the token so a cancelled request stops waiting on I/O.
pub async fn run_cancellable<T, E, F>(token: &CancellationToken, work: F) -> Result<T, ManagerError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ManagerError>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ManagerError::Cancelled),
        result = work => result.map_err(Into::into),
    }
}

/// Cheap pre-flight check for stores that never block.
pub fn ensure_live(token: &CancellationToken) -> Result<(), ManagerError> {
    if token.is_cancelled() {
        Err(ManagerError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancelled_token_wins_over_pending_work() {
        let token = CancellationToken::new();
        token.cancel();
        let result: Result<(), ManagerError> = run_cancellable(&token, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, ManagerError>(())
        })
        .await;
        assert!(matches!(result, Err(ManagerError::Cancelled)));
    }

    #[tokio::test]
    async fn live_token_returns_work_result() {
        let token = CancellationToken::new();
        let result = run_cancellable(&token, async { Ok::<_, ManagerError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
        assert!(ensure_live(&token).is_ok());
    }
}

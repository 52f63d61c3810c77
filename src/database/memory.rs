//! In-process stores used for development runs and tests. They honour the
//! same contracts as the PostgreSQL stores, including the optimistic
//! concurrency check on `last_updated_date`.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::managers::{ensure_live, KeyedManager, LookupManager, ManagerError, PartnerAdminRepository, UserRepository};
use crate::models::{now, KeyedModel, LookupModel, User};

pub struct InMemoryKeyedStore<T> {
    rows: RwLock<Vec<T>>,
}

impl<T> Default for InMemoryKeyedStore<T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl<T: KeyedModel> KeyedManager<T> for InMemoryKeyedStore<T> {
    async fn get_all(&self, token: &CancellationToken) -> Result<Vec<T>, ManagerError> {
        ensure_live(token)?;
        Ok(self.rows.read().await.clone())
    }

    async fn get(&self, id: Uuid, token: &CancellationToken) -> Result<Option<T>, ManagerError> {
        ensure_live(token)?;
        Ok(self.rows.read().await.iter().find(|row| row.id() == id).cloned())
    }

    async fn get_by_parent(
        &self,
        parent_id: Uuid,
        token: &CancellationToken,
    ) -> Result<Vec<T>, ManagerError> {
        ensure_live(token)?;
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| row.parent_id() == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn add(&self, mut entity: T, user_id: Uuid, token: &CancellationToken) -> Result<T, ManagerError> {
        ensure_live(token)?;
        if entity.id().is_nil() {
            entity.set_id(Uuid::new_v4());
        }
        entity.audit_mut().stamp_created(user_id, now());

        let mut rows = self.rows.write().await;
        if rows.iter().any(|row| row.id() == entity.id()) {
            return Err(ManagerError::Conflict(format!("{} {} already exists", T::NAME, entity.id())));
        }
        rows.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, mut entity: T, user_id: Uuid, token: &CancellationToken) -> Result<T, ManagerError> {
        ensure_live(token)?;
        let mut rows = self.rows.write().await;
        let slot = rows
            .iter_mut()
            .find(|row| row.id() == entity.id() && row.audit().last_updated_date == entity.audit().last_updated_date)
            .ok_or_else(|| ManagerError::Conflict(format!("{} {} was modified or removed", T::NAME, entity.id())))?;

        entity.audit_mut().stamp_updated(user_id, now());
        *slot = entity.clone();
        Ok(entity)
    }

    async fn delete(&self, id: Uuid, token: &CancellationToken) -> Result<u64, ManagerError> {
        ensure_live(token)?;
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| row.id() != id);
        Ok((before - rows.len()) as u64)
    }
}

pub struct InMemoryLookupStore<T> {
    rows: Vec<T>,
}

impl<T: LookupModel> InMemoryLookupStore<T> {
    /// A store holding the standard seed rows.
    pub fn seeded() -> Self {
        Self { rows: T::defaults() }
    }
}

#[async_trait]
impl<T: LookupModel> LookupManager<T> for InMemoryLookupStore<T> {
    async fn get_all(&self, token: &CancellationToken) -> Result<Vec<T>, ManagerError> {
        ensure_live(token)?;
        let mut rows = self.rows.clone();
        rows.sort_by_key(|row| (row.display_order(), row.id()));
        Ok(rows)
    }
}

#[derive(Default)]
pub struct InMemoryUsers {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, ManagerError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn get_by_name_identifier(&self, name_identifier: &str) -> Result<Option<User>, ManagerError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.name_identifier == name_identifier)
            .cloned())
    }

    /// Inserts, or replaces the record with the same name identifier.
    async fn add(&self, user: User) -> Result<User, ManagerError> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.name_identifier == user.name_identifier) {
            Some(existing) => {
                let id = existing.id;
                *existing = User { id, ..user };
                Ok(existing.clone())
            }
            None => {
                users.push(user.clone());
                Ok(user)
            }
        }
    }
}

#[derive(Default)]
pub struct InMemoryPartnerAdmins {
    links: RwLock<HashSet<(Uuid, Uuid)>>,
}

#[async_trait]
impl PartnerAdminRepository for InMemoryPartnerAdmins {
    async fn is_partner_admin(&self, partner_id: Uuid, user_id: Uuid) -> Result<bool, ManagerError> {
        Ok(self.links.read().await.contains(&(partner_id, user_id)))
    }

    async fn add(&self, partner_id: Uuid, user_id: Uuid) -> Result<(), ManagerError> {
        self.links.write().await.insert((partner_id, user_id));
        Ok(())
    }
}

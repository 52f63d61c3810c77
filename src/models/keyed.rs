use chrono::{DateTime, SubsecRound, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::authorization::AuthorizationResource;

/// Current time truncated to the microsecond precision PostgreSQL stores, so a
/// timestamp read back from either backend compares equal to the one written.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Ownership and timestamp metadata carried by every keyed entity.
///
/// Clients may omit these fields; the manager stamps them on add/update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Audit {
    pub created_by_user_id: Uuid,
    pub created_date: DateTime<Utc>,
    pub last_updated_by_user_id: Uuid,
    pub last_updated_date: DateTime<Utc>,
}

impl Audit {
    pub fn stamp_created(&mut self, user_id: Uuid, at: DateTime<Utc>) {
        self.created_by_user_id = user_id;
        self.created_date = at;
        self.last_updated_by_user_id = user_id;
        self.last_updated_date = at;
    }

    pub fn stamp_updated(&mut self, user_id: Uuid, at: DateTime<Utc>) {
        self.last_updated_by_user_id = user_id;
        self.last_updated_date = at;
    }

    /// Take over everything the caller is not allowed to change from the stored copy.
    /// `last_updated_date` doubles as the optimistic concurrency token.
    pub fn carry_over(&mut self, stored: &Audit) {
        *self = stored.clone();
    }
}

/// An entity with a stable key and ownership metadata.
pub trait KeyedModel: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    /// Singular display name used in telemetry events ("AddWaiver").
    const NAME: &'static str;
    /// Plural display name used in telemetry events ("GetWaivers").
    const PLURAL: &'static str;
    /// Backing table for the PostgreSQL store.
    const TABLE: &'static str;

    fn id(&self) -> Uuid;
    fn set_id(&mut self, id: Uuid);
    fn audit(&self) -> &Audit;
    fn audit_mut(&mut self) -> &mut Audit;

    /// Key of the owning record (partner, community, user) when the entity has one.
    fn parent_id(&self) -> Option<Uuid> {
        None
    }

    /// Partner the entity is scoped to for partner-user policies.
    fn partner_id(&self) -> Option<Uuid> {
        self.parent_id()
    }

    /// The view of this entity the authorizer evaluates policies against.
    fn resource(&self) -> AuthorizationResource {
        AuthorizationResource {
            owner_id: Some(self.audit().created_by_user_id),
            partner_id: self.partner_id(),
        }
    }
}

/// Implements [`KeyedModel`] for a struct with `id: Uuid` and `audit: Audit` fields.
macro_rules! keyed_model {
    ($ty:ty, name = $name:literal, plural = $plural:literal, table = $table:literal $(, parent = $parent:ident)?) => {
        impl $crate::models::KeyedModel for $ty {
            const NAME: &'static str = $name;
            const PLURAL: &'static str = $plural;
            const TABLE: &'static str = $table;

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn set_id(&mut self, id: ::uuid::Uuid) {
                self.id = id;
            }

            fn audit(&self) -> &$crate::models::Audit {
                &self.audit
            }

            fn audit_mut(&mut self) -> &mut $crate::models::Audit {
                &mut self.audit
            }

            $(
                fn parent_id(&self) -> Option<::uuid::Uuid> {
                    Some(self.$parent)
                }
            )?
        }
    };
}

pub(crate) use keyed_model;

//! Named authorization policies and the service that evaluates them.
//!
//! The controllers only consume the pass/fail answer. A policy check that
//! cannot be evaluated (repository down, user vanished) is reported as an
//! error by the [`Authorizer`]; callers treat that as a denial.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::managers::{ManagerError, PartnerAdminRepository, UserRepository};
use crate::middleware::AuthContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// The caller resolves to an internal user.
    ValidUser,
    /// The caller is a site administrator.
    UserIsAdmin,
    /// The caller created the resource, or is a site administrator.
    UserOwnsEntity,
    /// The caller administers the resource's partner, or is a site administrator.
    UserIsPartnerUserOrIsAdmin,
}

impl Policy {
    pub fn name(&self) -> &'static str {
        match self {
            Policy::ValidUser => "ValidUser",
            Policy::UserIsAdmin => "UserIsAdmin",
            Policy::UserOwnsEntity => "UserOwnsEntity",
            Policy::UserIsPartnerUserOrIsAdmin => "UserIsPartnerUserOrIsAdmin",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a policy is evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorizationResource {
    pub owner_id: Option<Uuid>,
    pub partner_id: Option<Uuid>,
}

impl AuthorizationResource {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn owned_by(user_id: Uuid) -> Self {
        Self {
            owner_id: Some(user_id),
            partner_id: None,
        }
    }

    pub fn partner(partner_id: Uuid) -> Self {
        Self {
            owner_id: None,
            partner_id: Some(partner_id),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("Authorization lookup failed: {0}")]
    Lookup(#[from] ManagerError),
}

#[async_trait]
pub trait Authorizer: Send + Sync {
    /// `Ok(true)` when `auth` satisfies `policy` for `resource`.
    async fn authorize(
        &self,
        auth: &AuthContext,
        resource: &AuthorizationResource,
        policy: Policy,
    ) -> Result<bool, AuthorizationError>;
}

/// Evaluates policies against the user and partner-admin repositories.
pub struct PolicyAuthorizer {
    users: Arc<dyn UserRepository>,
    partner_admins: Arc<dyn PartnerAdminRepository>,
}

impl PolicyAuthorizer {
    pub fn new(users: Arc<dyn UserRepository>, partner_admins: Arc<dyn PartnerAdminRepository>) -> Self {
        Self {
            users,
            partner_admins,
        }
    }
}

#[async_trait]
impl Authorizer for PolicyAuthorizer {
    async fn authorize(
        &self,
        auth: &AuthContext,
        resource: &AuthorizationResource,
        policy: Policy,
    ) -> Result<bool, AuthorizationError> {
        let Some(user_id) = auth.user_id else {
            return Ok(false);
        };

        let Some(user) = self.users.get_by_id(user_id).await? else {
            tracing::warn!("Authorization: user {} from request context no longer exists", user_id);
            return Ok(false);
        };

        let allowed = match policy {
            Policy::ValidUser => true,
            Policy::UserIsAdmin => user.is_site_admin,
            Policy::UserOwnsEntity => user.is_site_admin || resource.owner_id == Some(user.id),
            Policy::UserIsPartnerUserOrIsAdmin => {
                if user.is_site_admin {
                    true
                } else if let Some(partner_id) = resource.partner_id {
                    self.partner_admins.is_partner_admin(partner_id, user.id).await?
                } else {
                    false
                }
            }
        };

        tracing::debug!("Policy {} for user {}: {}", policy, user.id, allowed);
        Ok(allowed)
    }
}

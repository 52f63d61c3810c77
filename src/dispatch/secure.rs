use uuid::Uuid;

use super::base::Services;
use crate::authorization::{AuthorizationResource, Policy};
use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::models::User;

/// Identity-aware view of the shared services for one request.
pub struct SecureScope<'a> {
    auth: &'a AuthContext,
    services: &'a Services,
}

impl<'a> SecureScope<'a> {
    pub fn new(auth: &'a AuthContext, services: &'a Services) -> Self {
        Self { auth, services }
    }

    pub fn auth(&self) -> &AuthContext {
        self.auth
    }

    /// Internal id of the caller, resolved by the identity middleware.
    pub fn user_id(&self) -> Result<Uuid, ApiError> {
        self.auth
            .user_id
            .ok_or_else(|| ApiError::forbidden("A registered user is required"))
    }

    /// Evaluate `policy` for the caller against `resource`.
    ///
    /// Never errors. Unauthenticated callers are refused without consulting the
    /// authorizer, and an authorizer failure counts as a refusal.
    pub async fn is_authorized(&self, resource: &AuthorizationResource, policy: Policy) -> bool {
        if !self.auth.is_authenticated() {
            return false;
        }

        match self.services.authorizer.authorize(self.auth, resource, policy).await {
            Ok(allowed) => allowed,
            Err(e) => {
                tracing::error!("Authorization check {} failed, denying: {}", policy, e);
                false
            }
        }
    }

    /// Look the caller up by the external identity claim.
    ///
    /// A missing claim, an unknown identity, or a record whose identifier does
    /// not match the claim all answer 403.
    pub async fn resolve_caller(&self) -> Result<User, ApiError> {
        let Some(name_identifier) = self.auth.name_identifier() else {
            return Err(ApiError::forbidden("No identity claim on the request"));
        };

        let user = self
            .services
            .users
            .get_by_name_identifier(name_identifier)
            .await?
            .ok_or_else(|| ApiError::forbidden("Caller is not a registered user"))?;

        if user.name_identifier != name_identifier {
            tracing::warn!("Resolved user {} does not match the identity claim", user.id);
            return Err(ApiError::forbidden("Caller is not a registered user"));
        }

        Ok(user)
    }
}

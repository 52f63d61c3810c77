use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use super::auth::{AuthContext, Principal};
use crate::error::ApiError;
use crate::managers::UserRepository;

/// Middleware that maps the token principal onto an internal user and stores
/// the resulting [`AuthContext`] on the request. Runs after the JWT middleware.
///
/// An unknown principal is not rejected here: the context keeps the principal
/// without a user id, and the handlers decide whether that is enough.
pub async fn validate_user_middleware(
    State(users): State<Arc<dyn UserRepository>>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = request.extensions().get::<Principal>().cloned();

    let user_id = match &principal {
        Some(principal) => match users.get_by_name_identifier(&principal.name_identifier).await {
            Ok(Some(user)) => {
                tracing::debug!("User resolved: {} ({})", user.user_name, user.id);
                Some(user.id)
            }
            Ok(None) => {
                tracing::debug!("No user record for principal '{}'", principal.name_identifier);
                None
            }
            Err(e) => {
                tracing::error!("Failed to resolve user '{}': {}", principal.name_identifier, e);
                None
            }
        },
        None => None,
    };

    request.extensions_mut().insert(AuthContext { principal, user_id });

    next.run(request).await
}

/// Extractor that admits only callers resolved to an internal user.
/// Used as the route-level "valid user" requirement: the handler body never
/// runs for anyone else, and they get 403.
#[derive(Debug, Clone, Copy)]
pub struct ValidUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ValidUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .and_then(|auth| auth.user_id)
            .map(ValidUser)
            .ok_or_else(|| ApiError::forbidden("A registered user is required"))
    }
}

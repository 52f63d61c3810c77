use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{Claims, JwtKeys};

/// Authenticated external identity taken from a verified bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub name_identifier: String,
    pub email: Option<String>,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            name_identifier: claims.sub,
            email: claims.email,
        }
    }
}

/// Caller identity for one request, produced by the identity middleware and
/// read by handlers through the extractor. Never mutated after it is built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub principal: Option<Principal>,
    /// Internal user id, present when the principal maps to a user record.
    pub user_id: Option<Uuid>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn name_identifier(&self) -> Option<&str> {
        self.principal.as_ref().map(|p| p.name_identifier.as_str())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Bearer token middleware. A valid token attaches a [`Principal`]; a missing
/// or unusable token leaves the request anonymous, and the handlers answer
/// 403 for anything that needs a caller.
pub async fn jwt_auth_middleware(
    State(keys): State<Arc<JwtKeys>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    match extract_jwt_from_headers(&headers) {
        Ok(Some(token)) => match keys.verify(&token) {
            Ok(claims) => {
                request.extensions_mut().insert(Principal::from(claims));
            }
            Err(e) => tracing::warn!("Ignoring bearer token: {}", e),
        },
        Ok(None) => {}
        Err(msg) => tracing::warn!("Ignoring Authorization header: {}", msg),
    }

    next.run(request).await
}

/// Extract JWT token from Authorization header. `Ok(None)` when there is no header.
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<String>, String> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(Some(token.trim().to_string()))
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(extract_jwt_from_headers(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_jwt_from_headers(&headers), Ok(Some("abc.def".to_string())));
    }

    #[test]
    fn anonymous_context_has_no_identity() {
        let ctx = AuthContext::anonymous();
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.name_identifier(), None);
        assert_eq!(ctx.user_id, None);
    }
}

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tokio_util::sync::CancellationToken;

/// Cancellation signal for the current request, handed to every manager call.
#[derive(Clone, Debug, Default)]
pub struct RequestToken(pub CancellationToken);

impl RequestToken {
    pub fn token(&self) -> &CancellationToken {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Routers mounted without the scope layer still get a live token.
        Ok(parts
            .extensions
            .get::<RequestToken>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Attach a [`RequestToken`] that fires when the client goes away (the
/// response future is dropped) or when the request outlives `timeout`.
pub async fn request_scope_middleware(
    State(timeout): State<Duration>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = CancellationToken::new();
    request.extensions_mut().insert(RequestToken(token.clone()));

    let guard = token.clone().drop_guard();

    let timer_token = token.clone();
    let timer = tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(timeout) => {
                tracing::warn!("Request exceeded {:?}, cancelling", timeout);
                timer_token.cancel();
            }
            _ = timer_token.cancelled() => {}
        }
    });

    let response = next.run(request).await;

    timer.abort();
    guard.disarm();
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware::from_fn_with_state, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn token_fires_after_timeout() {
        let app = Router::new()
            .route(
                "/",
                get(|RequestToken(token): RequestToken| async move {
                    token.cancelled().await;
                    "cancelled"
                }),
            )
            .layer(from_fn_with_state(Duration::from_millis(20), request_scope_middleware));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn extractor_defaults_to_live_token() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let RequestToken(token) = RequestToken::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(!token.is_cancelled());
    }
}

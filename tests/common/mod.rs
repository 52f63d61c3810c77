use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cleanup_api::app::app;
use cleanup_api::auth::JwtKeys;
use cleanup_api::config::AppConfig;
use cleanup_api::models::User;
use cleanup_api::state::{AppState, Stores};
use cleanup_api::telemetry::NoopTelemetry;
use reqwest::{Client, Method, RequestBuilder};

const SECRET: &str = "integration-test-secret";

/// An API server running in-process on a free port with in-memory stores.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    keys: JwtKeys,
    pub admin: User,
    pub member: User,
    pub outsider: User,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let stores = Stores::in_memory();
        let admin = stores
            .users
            .add(User::new("auth0|admin", "admin", "admin@example.com").site_admin())
            .await?;
        let member = stores
            .users
            .add(User::new("auth0|member", "member", "member@example.com"))
            .await?;
        let outsider = stores
            .users
            .add(User::new("auth0|outsider", "outsider", "outsider@example.com"))
            .await?;

        let state = AppState::new(
            stores,
            JwtKeys::new(SECRET, 1)?,
            Arc::new(NoopTelemetry),
            None,
            Duration::from_secs(10),
        );
        let router = app(state, &AppConfig::development());

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self {
            base_url,
            client: Client::new(),
            keys: JwtKeys::new(SECRET, 1)?,
            admin,
            member,
            outsider,
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn token_for(&self, subject: &str) -> String {
        self.keys.issue(subject, None).expect("token")
    }

    /// A request carrying a bearer token for `user`, or none when `user` is `None`.
    pub fn request(&self, method: Method, path: &str, user: Option<&User>) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match user {
            Some(user) => builder.bearer_auth(self.token_for(&user.name_identifier)),
            None => builder,
        }
    }
}

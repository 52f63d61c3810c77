//! Shared fixtures for router and dispatch tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::JwtKeys;
use crate::authorization::{AuthorizationError, AuthorizationResource, Authorizer, Policy, PolicyAuthorizer};
use crate::database::{InMemoryKeyedStore, InMemoryPartnerAdmins, InMemoryUsers};
use crate::dispatch::Services;
use crate::managers::{KeyedManager, ManagerError, PartnerAdminRepository, UserRepository};
use crate::middleware::{AuthContext, Principal};
use crate::models::{KeyedModel, User};
use crate::telemetry::Telemetry;

/// Telemetry sink that remembers every event name.
#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<String>>,
}

impl RecordingTelemetry {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl Telemetry for RecordingTelemetry {
    fn track_event(&self, name: &str) {
        self.events.lock().unwrap().push(name.to_string());
    }
}

/// Authorizer whose backing store is always down.
pub struct FailingAuthorizer;

#[async_trait]
impl Authorizer for FailingAuthorizer {
    async fn authorize(
        &self,
        _auth: &AuthContext,
        _resource: &AuthorizationResource,
        _policy: Policy,
    ) -> Result<bool, AuthorizationError> {
        Err(AuthorizationError::Lookup(ManagerError::Database(sqlx::Error::PoolTimedOut)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictMode {
    /// Updates fail with a conflict; the record stays.
    StillExists,
    /// Updates fail with a conflict after the record was removed.
    Vanished,
}

/// In-memory keyed store that counts calls per operation and can be told to
/// lose every update race.
pub struct CountingManager<T> {
    inner: InMemoryKeyedStore<T>,
    calls: Mutex<HashMap<&'static str, usize>>,
    conflict: Mutex<Option<ConflictMode>>,
}

impl<T> Default for CountingManager<T> {
    fn default() -> Self {
        Self {
            inner: InMemoryKeyedStore::default(),
            calls: Mutex::new(HashMap::new()),
            conflict: Mutex::new(None),
        }
    }
}

impl<T: KeyedModel> CountingManager<T> {
    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    pub fn set_conflict(&self, mode: ConflictMode) {
        *self.conflict.lock().unwrap() = Some(mode);
    }

    /// Store an entity as if `owner` had created it, bypassing the counters.
    pub async fn seed(&self, owner: &User, json: Value) -> T {
        let entity: T = serde_json::from_value(json).unwrap();
        self.inner.add(entity, owner.id, &CancellationToken::new()).await.unwrap()
    }

    fn record(&self, op: &'static str) {
        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;
    }
}

#[async_trait]
impl<T: KeyedModel> KeyedManager<T> for CountingManager<T> {
    async fn get_all(&self, token: &CancellationToken) -> Result<Vec<T>, ManagerError> {
        self.record("get_all");
        self.inner.get_all(token).await
    }

    async fn get(&self, id: Uuid, token: &CancellationToken) -> Result<Option<T>, ManagerError> {
        self.record("get");
        self.inner.get(id, token).await
    }

    async fn get_by_parent(&self, parent_id: Uuid, token: &CancellationToken) -> Result<Vec<T>, ManagerError> {
        self.record("get_by_parent");
        self.inner.get_by_parent(parent_id, token).await
    }

    async fn add(&self, entity: T, user_id: Uuid, token: &CancellationToken) -> Result<T, ManagerError> {
        self.record("add");
        self.inner.add(entity, user_id, token).await
    }

    async fn update(&self, entity: T, user_id: Uuid, token: &CancellationToken) -> Result<T, ManagerError> {
        self.record("update");
        let mode = *self.conflict.lock().unwrap();
        match mode {
            Some(ConflictMode::StillExists) => Err(ManagerError::Conflict("injected".into())),
            Some(ConflictMode::Vanished) => {
                self.inner.delete(entity.id(), token).await?;
                Err(ManagerError::Conflict("injected".into()))
            }
            None => self.inner.update(entity, user_id, token).await,
        }
    }

    async fn delete(&self, id: Uuid, token: &CancellationToken) -> Result<u64, ManagerError> {
        self.record("delete");
        self.inner.delete(id, token).await
    }
}

/// Users, services and signing keys wired the way the app wires them.
///
/// `member` administers `partner_id`; `outsider` has no privileges.
pub struct TestHarness {
    pub users: Arc<InMemoryUsers>,
    pub partner_admins: Arc<InMemoryPartnerAdmins>,
    pub telemetry: Arc<RecordingTelemetry>,
    pub services: Services,
    pub keys: Arc<JwtKeys>,
    pub admin: User,
    pub member: User,
    pub outsider: User,
    pub partner_id: Uuid,
}

impl TestHarness {
    pub async fn new() -> Self {
        let users = Arc::new(InMemoryUsers::default());
        let partner_admins = Arc::new(InMemoryPartnerAdmins::default());
        let telemetry = Arc::new(RecordingTelemetry::default());

        let admin = users
            .add(User::new("admin-sub", "admin", "admin@example.com").site_admin())
            .await
            .unwrap();
        let member = users.add(User::new("member-sub", "member", "member@example.com")).await.unwrap();
        let outsider = users
            .add(User::new("outsider-sub", "outsider", "outsider@example.com"))
            .await
            .unwrap();

        let partner_id = Uuid::new_v4();
        partner_admins.add(partner_id, member.id).await.unwrap();

        let services = Services {
            authorizer: Arc::new(PolicyAuthorizer::new(users.clone(), partner_admins.clone())),
            telemetry: telemetry.clone(),
            users: users.clone(),
        };

        Self {
            users,
            partner_admins,
            telemetry,
            services,
            keys: Arc::new(JwtKeys::new("test-secret", 1).unwrap()),
            admin,
            member,
            outsider,
            partner_id,
        }
    }

    /// Context the identity middleware would build for `user`.
    pub fn auth(&self, user: &User) -> AuthContext {
        AuthContext {
            principal: Some(Principal {
                name_identifier: user.name_identifier.clone(),
                email: Some(user.email.clone()),
            }),
            user_id: Some(user.id),
        }
    }

    /// A verified token subject with no user record behind it.
    pub fn unregistered_auth(&self, subject: &str) -> AuthContext {
        AuthContext {
            principal: Some(Principal {
                name_identifier: subject.to_string(),
                email: None,
            }),
            user_id: None,
        }
    }

    pub fn bearer(&self, user: &User) -> String {
        format!("Bearer {}", self.keys.issue(&user.name_identifier, Some(&user.email)).unwrap())
    }
}

/// Build a request with the identity already attached, as the middleware would.
pub fn request(method: Method, uri: &str, auth: Option<AuthContext>, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let mut req = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    if let Some(auth) = auth {
        req.extensions_mut().insert(auth);
    }
    req
}

/// Run one request through `router` and decode the JSON body (`Null` when empty).
pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

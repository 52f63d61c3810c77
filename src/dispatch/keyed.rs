//! Generic authorized CRUD over any [`KeyedModel`].
//!
//! The free functions hold the dispatch rules and are reused by the ad-hoc
//! controllers; [`KeyedRoutes`] mounts them as a standard resource router.

use std::marker::PhantomData;
use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::base::{Collaborators, Services};
use super::extract::{Body, PathParam};
use super::outcome::Outcome;
use crate::authorization::Policy;
use crate::error::ApiError;
use crate::managers::{KeyedManager, ManagerError};
use crate::middleware::{ApiResponse, ApiResult, AuthContext, RequestToken, ValidUser};
use crate::models::KeyedModel;

pub type KeyedCollaborators<T> = Collaborators<dyn KeyedManager<T>>;

/// Policies applied to the mutating operations of one resource.
///
/// Add always requires a valid user at the route layer; `add` is an extra
/// check evaluated against the submitted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyedPolicies {
    pub add: Option<Policy>,
    pub update: Policy,
    pub delete: Policy,
}

impl Default for KeyedPolicies {
    fn default() -> Self {
        Self {
            add: None,
            update: Policy::UserOwnsEntity,
            delete: Policy::UserOwnsEntity,
        }
    }
}

impl KeyedPolicies {
    /// The same policy for add, update and delete.
    pub fn all(policy: Policy) -> Self {
        Self {
            add: Some(policy),
            update: policy,
            delete: policy,
        }
    }
}

pub async fn add<T: KeyedModel>(
    c: &KeyedCollaborators<T>,
    auth: &AuthContext,
    entity: T,
    policy: Option<Policy>,
    token: &CancellationToken,
) -> Result<Outcome<T>, ManagerError> {
    let Some(user_id) = auth.user_id else {
        return Ok(Outcome::Forbidden);
    };

    if let Some(policy) = policy {
        if !c.scope(auth).is_authorized(&entity.resource(), policy).await {
            return Ok(Outcome::Forbidden);
        }
    }

    match c.manager.add(entity, user_id, token).await {
        Ok(saved) => {
            c.track_event(&format!("Add{}", T::NAME));
            Ok(Outcome::Ok(saved))
        }
        Err(ManagerError::Conflict(msg)) => {
            tracing::warn!("Add of {} rejected: {}", T::NAME, msg);
            Ok(Outcome::Duplicate)
        }
        Err(e) => Err(e),
    }
}

pub async fn get_all<T: KeyedModel>(
    c: &KeyedCollaborators<T>,
    token: &CancellationToken,
) -> Result<Vec<T>, ManagerError> {
    let rows = c.manager.get_all(token).await?;
    c.track_event(&format!("Get{}", T::PLURAL));
    Ok(rows)
}

pub async fn get_one<T: KeyedModel>(
    c: &KeyedCollaborators<T>,
    id: Uuid,
    token: &CancellationToken,
) -> Result<Outcome<T>, ManagerError> {
    Ok(match c.manager.get(id, token).await? {
        Some(entity) => Outcome::Ok(entity),
        None => Outcome::NotFound,
    })
}

pub async fn get_by_parent<T: KeyedModel>(
    c: &KeyedCollaborators<T>,
    parent_id: Uuid,
    token: &CancellationToken,
) -> Result<Vec<T>, ManagerError> {
    let rows = c.manager.get_by_parent(parent_id, token).await?;
    c.track_event(&format!("Get{}", T::PLURAL));
    Ok(rows)
}

/// Replace a stored entity. The policy is evaluated against the stored copy,
/// and again against the submitted copy when the update moves the entity to
/// another parent. The stored audit fields win over whatever the caller sent.
pub async fn update<T: KeyedModel>(
    c: &KeyedCollaborators<T>,
    auth: &AuthContext,
    mut entity: T,
    policy: Policy,
    token: &CancellationToken,
) -> Result<Outcome<T>, ManagerError> {
    let id = entity.id();
    let Some(stored) = c.manager.get(id, token).await? else {
        return Ok(Outcome::NotFound);
    };

    if !c.scope(auth).is_authorized(&stored.resource(), policy).await {
        return Ok(Outcome::Forbidden);
    }
    let Some(user_id) = auth.user_id else {
        return Ok(Outcome::Forbidden);
    };

    entity.audit_mut().carry_over(stored.audit());

    let target = entity.resource();
    if target != stored.resource() && !c.scope(auth).is_authorized(&target, policy).await {
        return Ok(Outcome::Forbidden);
    }

    match c.manager.update(entity, user_id, token).await {
        Ok(updated) => {
            c.track_event(&format!("Update{}", T::NAME));
            Ok(Outcome::Ok(updated))
        }
        Err(ManagerError::Conflict(msg)) => {
            tracing::warn!("Update of {} {} lost a race: {}", T::NAME, id, msg);
            if c.manager.get(id, token).await?.is_some() {
                Ok(Outcome::Conflict)
            } else {
                Ok(Outcome::NotFound)
            }
        }
        Err(e) => Err(e),
    }
}

/// Remove a stored entity after checking `policy` against it. Returns the
/// number of removed rows.
pub async fn delete<T: KeyedModel>(
    c: &KeyedCollaborators<T>,
    auth: &AuthContext,
    id: Uuid,
    policy: Policy,
    token: &CancellationToken,
) -> Result<Outcome<u64>, ManagerError> {
    let Some(stored) = c.manager.get(id, token).await? else {
        return Ok(Outcome::NotFound);
    };

    if !c.scope(auth).is_authorized(&stored.resource(), policy).await {
        return Ok(Outcome::Forbidden);
    }

    let removed = c.manager.delete(id, token).await?;
    c.track_event(&format!("Delete{}", T::NAME));
    Ok(Outcome::Ok(removed))
}

/// Route id and body id must agree on `PUT /{id}`.
pub fn ensure_matching_id<T: KeyedModel>(route_id: Uuid, entity: &T) -> Result<(), ApiError> {
    if route_id != entity.id() {
        return Err(ApiError::field_error(
            "id",
            format!("Route id {} does not match body id {}", route_id, entity.id()),
        ));
    }
    Ok(())
}

/// Router state for one keyed resource.
pub struct KeyedState<T: KeyedModel> {
    pub collaborators: KeyedCollaborators<T>,
    pub policies: KeyedPolicies,
}

impl<T: KeyedModel> Clone for KeyedState<T> {
    fn clone(&self) -> Self {
        Self {
            collaborators: self.collaborators.clone(),
            policies: self.policies,
        }
    }
}

/// Builder for the standard routes of a keyed resource:
///
/// - `GET /`, `POST /`, `PUT /`
/// - `GET /{id}`, `PUT /{id}`, `DELETE /{id}`
/// - `GET /{segment}/{parentId}` when [`KeyedRoutes::list_by_parent`] is set
pub struct KeyedRoutes<T> {
    path: &'static str,
    policies: KeyedPolicies,
    parent_segment: Option<&'static str>,
    _model: PhantomData<fn() -> T>,
}

impl<T: KeyedModel> KeyedRoutes<T> {
    pub fn new(path: &'static str) -> Self {
        Self {
            path,
            policies: KeyedPolicies::default(),
            parent_segment: None,
            _model: PhantomData,
        }
    }

    pub fn policies(mut self, policies: KeyedPolicies) -> Self {
        self.policies = policies;
        self
    }

    pub fn list_by_parent(mut self, segment: &'static str) -> Self {
        self.parent_segment = Some(segment);
        self
    }

    pub fn build(self, manager: Arc<dyn KeyedManager<T>>, services: Services) -> Router {
        let state = KeyedState {
            collaborators: Collaborators::new(manager, services),
            policies: self.policies,
        };

        let mut routes = Router::new()
            .route(
                "/",
                get(collection_get::<T>)
                    .post(collection_post::<T>)
                    .put(collection_put::<T>),
            )
            .route(
                "/:id",
                get(record_get::<T>)
                    .put(record_put::<T>)
                    .delete(record_delete::<T>),
            );

        if let Some(segment) = self.parent_segment {
            routes = routes.route(&format!("/{}/:parent_id", segment), get(parent_get::<T>));
        }

        Router::new().nest(self.path, routes.with_state(state))
    }
}

async fn collection_get<T: KeyedModel>(
    State(state): State<KeyedState<T>>,
    RequestToken(token): RequestToken,
) -> ApiResult<Vec<T>> {
    Ok(ApiResponse::success(get_all(&state.collaborators, &token).await?))
}

async fn collection_post<T: KeyedModel>(
    ValidUser(_): ValidUser,
    auth: AuthContext,
    State(state): State<KeyedState<T>>,
    RequestToken(token): RequestToken,
    Body(entity): Body<T>,
) -> ApiResult<()> {
    add(&state.collaborators, &auth, entity, state.policies.add, &token)
        .await?
        .into_result(T::NAME)?;
    Ok(ApiResponse::empty())
}

async fn collection_put<T: KeyedModel>(
    auth: AuthContext,
    State(state): State<KeyedState<T>>,
    RequestToken(token): RequestToken,
    Body(entity): Body<T>,
) -> ApiResult<T> {
    let updated = update(&state.collaborators, &auth, entity, state.policies.update, &token)
        .await?
        .into_result(T::NAME)?;
    Ok(ApiResponse::success(updated))
}

async fn record_get<T: KeyedModel>(
    PathParam(id): PathParam<Uuid>,
    State(state): State<KeyedState<T>>,
    RequestToken(token): RequestToken,
) -> ApiResult<T> {
    let entity = get_one(&state.collaborators, id, &token).await?.into_result(T::NAME)?;
    Ok(ApiResponse::success(entity))
}

async fn record_put<T: KeyedModel>(
    PathParam(id): PathParam<Uuid>,
    auth: AuthContext,
    State(state): State<KeyedState<T>>,
    RequestToken(token): RequestToken,
    Body(entity): Body<T>,
) -> ApiResult<T> {
    ensure_matching_id(id, &entity)?;
    let updated = update(&state.collaborators, &auth, entity, state.policies.update, &token)
        .await?
        .into_result(T::NAME)?;
    Ok(ApiResponse::success(updated))
}

async fn record_delete<T: KeyedModel>(
    PathParam(id): PathParam<Uuid>,
    auth: AuthContext,
    State(state): State<KeyedState<T>>,
    RequestToken(token): RequestToken,
) -> ApiResult<u64> {
    let removed = delete(&state.collaborators, &auth, id, state.policies.delete, &token)
        .await?
        .into_result(T::NAME)?;
    Ok(ApiResponse::success(removed))
}

async fn parent_get<T: KeyedModel>(
    PathParam(parent_id): PathParam<Uuid>,
    State(state): State<KeyedState<T>>,
    RequestToken(token): RequestToken,
) -> ApiResult<Vec<T>> {
    Ok(ApiResponse::success(
        get_by_parent(&state.collaborators, parent_id, &token).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Team;
    use crate::testing::{request, send, ConflictMode, CountingManager, TestHarness};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    fn team_json(name: &str) -> serde_json::Value {
        json!({ "name": name, "description": "Saturday crew", "isPublic": true })
    }

    async fn setup() -> (TestHarness, Arc<CountingManager<Team>>, Router) {
        let h = TestHarness::new().await;
        let manager = Arc::new(CountingManager::<Team>::default());
        let router = KeyedRoutes::<Team>::new("/api/teams").build(manager.clone(), h.services.clone());
        (h, manager, router)
    }

    #[tokio::test]
    async fn add_requires_valid_user() {
        let (_h, manager, router) = setup().await;

        let (status, body) = send(&router, request(Method::POST, "/api/teams", None, Some(team_json("A")))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
        assert_eq!(manager.calls("add"), 0);
    }

    #[tokio::test]
    async fn add_returns_null_data_and_tracks_event() {
        let (h, manager, router) = setup().await;

        let (status, body) = send(
            &router,
            request(Method::POST, "/api/teams", Some(h.auth(&h.member)), Some(team_json("A"))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "data": null }));
        assert_eq!(manager.calls("add"), 1);
        assert_eq!(h.telemetry.events(), vec!["AddTeam"]);
    }

    #[tokio::test]
    async fn get_all_is_anonymous() {
        let (h, manager, router) = setup().await;
        manager.seed(&h.member, team_json("A")).await;
        manager.seed(&h.member, team_json("B")).await;

        let (status, body) = send(&router, request(Method::GET, "/api/teams", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
        assert_eq!(h.telemetry.events(), vec!["GetTeams"]);
    }

    #[tokio::test]
    async fn get_missing_record_is_404() {
        let (_h, _manager, router) = setup().await;
        let uri = format!("/api/teams/{}", Uuid::new_v4());
        let (status, _) = send(&router, request(Method::GET, &uri, None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_id_is_400() {
        let (_h, _manager, router) = setup().await;
        let (status, body) = send(&router, request(Method::GET, "/api/teams/not-a-uuid", None, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);
    }

    #[tokio::test]
    async fn delete_by_non_owner_is_refused_before_the_manager() {
        let (h, manager, router) = setup().await;
        let team = manager.seed(&h.member, team_json("A")).await;
        let uri = format!("/api/teams/{}", team.id);

        let (status, _) = send(&router, request(Method::DELETE, &uri, Some(h.auth(&h.outsider)), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(manager.calls("delete"), 0);

        let (status, _) = send(&router, request(Method::DELETE, &uri, None, None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(manager.calls("delete"), 0);

        let (status, body) = send(&router, request(Method::DELETE, &uri, Some(h.auth(&h.member)), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], 1);
        assert_eq!(manager.calls("delete"), 1);
        assert_eq!(h.telemetry.events(), vec!["DeleteTeam"]);
    }

    #[tokio::test]
    async fn ownership_is_checked_against_the_stored_entity() {
        let (h, manager, router) = setup().await;
        let team = manager.seed(&h.member, team_json("A")).await;

        // The body claims the outsider created it; the stored copy says otherwise.
        let mut body = serde_json::to_value(&team).unwrap();
        body["name"] = json!("Renamed");
        body["createdByUserId"] = json!(h.outsider.id);

        let (status, _) = send(
            &router,
            request(Method::PUT, "/api/teams", Some(h.auth(&h.outsider)), Some(body.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(manager.calls("update"), 0);

        let (status, updated) = send(&router, request(Method::PUT, "/api/teams", Some(h.auth(&h.member)), Some(body))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"]["name"], "Renamed");
        assert_eq!(updated["data"]["createdByUserId"], json!(h.member.id));
    }

    #[tokio::test]
    async fn route_and_body_ids_must_match() {
        let (h, manager, router) = setup().await;
        let team = manager.seed(&h.member, team_json("A")).await;
        let uri = format!("/api/teams/{}", Uuid::new_v4());

        let (status, body) = send(
            &router,
            request(Method::PUT, &uri, Some(h.auth(&h.member)), Some(serde_json::to_value(&team).unwrap())),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(manager.calls("update"), 0);
    }

    #[tokio::test]
    async fn conflict_on_existing_entity_is_500() {
        let (h, manager, router) = setup().await;
        let team = manager.seed(&h.member, team_json("A")).await;
        manager.set_conflict(ConflictMode::StillExists);

        let (status, _) = send(
            &router,
            request(Method::PUT, "/api/teams", Some(h.auth(&h.member)), Some(serde_json::to_value(&team).unwrap())),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn conflict_on_vanished_entity_is_404() {
        let (h, manager, router) = setup().await;
        let team = manager.seed(&h.member, team_json("A")).await;
        manager.set_conflict(ConflictMode::Vanished);

        let (status, _) = send(
            &router,
            request(Method::PUT, "/api/teams", Some(h.auth(&h.member)), Some(serde_json::to_value(&team).unwrap())),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(h.telemetry.events().is_empty());
    }

    #[tokio::test]
    async fn cancelled_request_is_499() {
        let (_h, _manager, router) = setup().await;
        let token = CancellationToken::new();
        token.cancel();

        let mut req = request(Method::GET, "/api/teams", None, None);
        req.extensions_mut().insert(RequestToken(token));

        let (status, body) = send(&router, req).await;
        assert_eq!(status.as_u16(), 499);
        assert_eq!(body["code"], "REQUEST_CANCELLED");
    }

    #[tokio::test]
    async fn add_policy_is_checked_against_the_submitted_entity() {
        let h = TestHarness::new().await;
        let manager = Arc::new(CountingManager::<Team>::default());
        let router = KeyedRoutes::<Team>::new("/api/teams")
            .policies(KeyedPolicies::all(Policy::UserIsAdmin))
            .build(manager.clone(), h.services.clone());

        let (status, _) = send(
            &router,
            request(Method::POST, "/api/teams", Some(h.auth(&h.member)), Some(team_json("A"))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(manager.calls("add"), 0);

        let (status, _) = send(
            &router,
            request(Method::POST, "/api/teams", Some(h.auth(&h.admin)), Some(team_json("A"))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(manager.calls("add"), 1);
    }

    #[tokio::test]
    async fn duplicate_client_id_on_add_is_400() {
        let (h, manager, router) = setup().await;
        let id = Uuid::new_v4();
        let mut team = team_json("Dune crew");
        team["id"] = json!(id);

        let (status, _) = send(
            &router,
            request(Method::POST, "/api/teams", Some(h.auth(&h.member)), Some(team.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &router,
            request(Method::POST, "/api/teams", Some(h.auth(&h.member)), Some(team)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["field_errors"]["id"].is_string());
        assert_eq!(manager.calls("add"), 2);
        assert_eq!(h.telemetry.events(), vec!["AddTeam"]);
    }
}


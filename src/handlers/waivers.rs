use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use uuid::Uuid;

use crate::authorization::Policy;
use crate::dispatch::{keyed, Body, Collaborators, KeyedCollaborators, PathParam, Services};
use crate::managers::KeyedManager;
use crate::middleware::{ApiResponse, ApiResult, AuthContext, RequestToken, ValidUser};
use crate::models::{KeyedModel, Waiver};

type Waivers = KeyedCollaborators<Waiver>;

/// Waivers are readable by any registered user and maintained by site admins.
pub fn routes(manager: Arc<dyn KeyedManager<Waiver>>, services: Services) -> Router {
    Router::new()
        .route("/api/waivers", get(list).post(create).put(update))
        .route("/api/waivers/:id", get(fetch).delete(remove))
        .with_state(Collaborators::new(manager, services))
}

async fn list(
    ValidUser(_): ValidUser,
    State(waivers): State<Waivers>,
    RequestToken(token): RequestToken,
) -> ApiResult<Vec<Waiver>> {
    Ok(ApiResponse::success(keyed::get_all(&waivers, &token).await?))
}

async fn fetch(
    ValidUser(_): ValidUser,
    PathParam(id): PathParam<Uuid>,
    State(waivers): State<Waivers>,
    RequestToken(token): RequestToken,
) -> ApiResult<Waiver> {
    let waiver = keyed::get_one(&waivers, id, &token).await?.into_result(Waiver::NAME)?;
    Ok(ApiResponse::success(waiver))
}

async fn create(
    auth: AuthContext,
    State(waivers): State<Waivers>,
    RequestToken(token): RequestToken,
    Body(waiver): Body<Waiver>,
) -> ApiResult<Waiver> {
    let created = keyed::add(&waivers, &auth, waiver, Some(Policy::UserIsAdmin), &token)
        .await?
        .into_result(Waiver::NAME)?;
    Ok(ApiResponse::success(created))
}

async fn update(
    auth: AuthContext,
    State(waivers): State<Waivers>,
    RequestToken(token): RequestToken,
    Body(waiver): Body<Waiver>,
) -> ApiResult<Waiver> {
    let updated = keyed::update(&waivers, &auth, waiver, Policy::UserIsAdmin, &token)
        .await?
        .into_result(Waiver::NAME)?;
    Ok(ApiResponse::success(updated))
}

async fn remove(
    PathParam(id): PathParam<Uuid>,
    auth: AuthContext,
    State(waivers): State<Waivers>,
    RequestToken(token): RequestToken,
) -> ApiResult<u64> {
    let removed = keyed::delete(&waivers, &auth, id, Policy::UserIsAdmin, &token)
        .await?
        .into_result(Waiver::NAME)?;
    Ok(ApiResponse::success(removed))
}

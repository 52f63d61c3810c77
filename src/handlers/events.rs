use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use uuid::Uuid;

use crate::authorization::Policy;
use crate::dispatch::{keyed, Body, Collaborators, KeyedCollaborators, PathParam, Services};
use crate::managers::KeyedManager;
use crate::middleware::{ApiResponse, ApiResult, AuthContext, RequestToken, ValidUser};
use crate::models::{Event, KeyedModel};

type Events = KeyedCollaborators<Event>;

/// Events are public to read; any registered user may create one and only
/// the creator (or a site admin) may change or remove it.
pub fn routes(manager: Arc<dyn KeyedManager<Event>>, services: Services) -> Router {
    Router::new()
        .route("/api/events", get(list_active).post(create).put(update))
        .route("/api/events/:id", get(fetch).delete(remove))
        .route("/api/events/userevents/:user_id", get(list_for_user))
        .with_state(Collaborators::new(manager, services))
}

/// Events still open for sign-up (active or full).
async fn list_active(State(events): State<Events>, RequestToken(token): RequestToken) -> ApiResult<Vec<Event>> {
    let active: Vec<Event> = keyed::get_all(&events, &token)
        .await?
        .into_iter()
        .filter(Event::is_active)
        .collect();
    Ok(ApiResponse::success(active))
}

async fn list_for_user(
    PathParam(user_id): PathParam<Uuid>,
    State(events): State<Events>,
    RequestToken(token): RequestToken,
) -> ApiResult<Vec<Event>> {
    let created: Vec<Event> = events
        .manager
        .get_all(&token)
        .await?
        .into_iter()
        .filter(|event| event.audit().created_by_user_id == user_id)
        .collect();
    events.track_event("GetUserEvents");
    Ok(ApiResponse::success(created))
}

async fn fetch(
    PathParam(id): PathParam<Uuid>,
    State(events): State<Events>,
    RequestToken(token): RequestToken,
) -> ApiResult<Event> {
    let event = keyed::get_one(&events, id, &token).await?.into_result(Event::NAME)?;
    Ok(ApiResponse::success(event))
}

async fn create(
    ValidUser(_): ValidUser,
    auth: AuthContext,
    State(events): State<Events>,
    RequestToken(token): RequestToken,
    Body(event): Body<Event>,
) -> ApiResult<Event> {
    let created = keyed::add(&events, &auth, event, None, &token)
        .await?
        .into_result(Event::NAME)?;
    Ok(ApiResponse::success(created))
}

async fn update(
    auth: AuthContext,
    State(events): State<Events>,
    RequestToken(token): RequestToken,
    Body(event): Body<Event>,
) -> ApiResult<Event> {
    let updated = keyed::update(&events, &auth, event, Policy::UserOwnsEntity, &token)
        .await?
        .into_result(Event::NAME)?;
    Ok(ApiResponse::success(updated))
}

async fn remove(
    PathParam(id): PathParam<Uuid>,
    auth: AuthContext,
    State(events): State<Events>,
    RequestToken(token): RequestToken,
) -> ApiResult<u64> {
    let removed = keyed::delete(&events, &auth, id, Policy::UserOwnsEntity, &token)
        .await?
        .into_result(Event::NAME)?;
    Ok(ApiResponse::success(removed))
}

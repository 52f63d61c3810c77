use std::collections::HashSet;
use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use futures::future::try_join_all;
use uuid::Uuid;

use crate::authorization::{AuthorizationResource, Policy};
use crate::dispatch::{keyed, Body, Collaborators, KeyedCollaborators, PathParam, Services};
use crate::error::ApiError;
use crate::managers::KeyedManager;
use crate::middleware::{ApiResponse, ApiResult, AuthContext, RequestToken};
use crate::models::{KeyedModel, UserNotificationPreference};

type Preferences = KeyedCollaborators<UserNotificationPreference>;

pub fn routes(manager: Arc<dyn KeyedManager<UserNotificationPreference>>, services: Services) -> Router {
    Router::new()
        .route(
            "/api/usernotificationpreferences/:user_id",
            get(list).put(upsert),
        )
        .with_state(Collaborators::new(manager, services))
}

/// A user's preferences are visible to and editable by that user or a site admin.
async fn ensure_self_or_admin(prefs: &Preferences, auth: &AuthContext, user_id: Uuid) -> Result<Uuid, ApiError> {
    let scope = prefs.scope(auth);
    let caller = scope.user_id()?;
    if !scope
        .is_authorized(&AuthorizationResource::owned_by(user_id), Policy::UserOwnsEntity)
        .await
    {
        return Err(ApiError::forbidden("Not authorized for this user's preferences"));
    }
    Ok(caller)
}

async fn list(
    PathParam(user_id): PathParam<Uuid>,
    auth: AuthContext,
    State(prefs): State<Preferences>,
    RequestToken(token): RequestToken,
) -> ApiResult<Vec<UserNotificationPreference>> {
    ensure_self_or_admin(&prefs, &auth, user_id).await?;
    Ok(ApiResponse::success(keyed::get_by_parent(&prefs, user_id, &token).await?))
}

/// Each notification type may appear once per request; checked before any write.
fn ensure_distinct_types(preferences: &[UserNotificationPreference]) -> Result<(), ApiError> {
    let mut seen = HashSet::new();
    match preferences
        .iter()
        .find(|pref| !seen.insert(pref.user_notification_type_id))
    {
        Some(dup) => Err(ApiError::field_error(
            "userNotificationTypeId",
            format!("Notification type {} appears more than once", dup.user_notification_type_id),
        )),
        None => Ok(()),
    }
}

/// Insert or replace one preference per notification type.
async fn upsert(
    PathParam(user_id): PathParam<Uuid>,
    auth: AuthContext,
    State(prefs): State<Preferences>,
    RequestToken(token): RequestToken,
    Body(preferences): Body<Vec<UserNotificationPreference>>,
) -> ApiResult<Vec<UserNotificationPreference>> {
    let caller = ensure_self_or_admin(&prefs, &auth, user_id).await?;
    ensure_distinct_types(&preferences)?;
    let existing = prefs.manager.get_by_parent(user_id, &token).await?;

    let saves = preferences.into_iter().map(|mut pref| {
        let stored = existing
            .iter()
            .find(|e| e.user_notification_type_id == pref.user_notification_type_id)
            .cloned();
        let manager = &prefs.manager;
        let token = &token;

        async move {
            pref.user_id = user_id;
            match stored {
                Some(stored) => {
                    pref.set_id(stored.id);
                    pref.audit_mut().carry_over(stored.audit());
                    manager.update(pref, caller, token).await
                }
                None => {
                    pref.set_id(Uuid::nil());
                    manager.add(pref, caller, token).await
                }
            }
        }
    });

    let saved = try_join_all(saves).await?;
    prefs.track_event("UpdateUserNotificationPreferences");
    Ok(ApiResponse::success(saved))
}

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{delete, get, post},
    Router,
};
use uuid::Uuid;

use crate::authorization::Policy;
use crate::dispatch::{keyed, Body, Collaborators, KeyedCollaborators, PathParam, Services};
use crate::managers::KeyedManager;
use crate::middleware::{ApiResponse, ApiResult, AuthContext, RequestToken, ValidUser};
use crate::models::{CommunityContact, CommunityNote, KeyedModel};

type Contacts = KeyedCollaborators<CommunityContact>;
type Notes = KeyedCollaborators<CommunityNote>;

pub fn contact_routes(manager: Arc<dyn KeyedManager<CommunityContact>>, services: Services) -> Router {
    Router::new()
        .route("/api/communitycontacts", post(add_contact))
        .route("/api/communitycontacts/:id", delete(remove_contact))
        .route("/api/communitycontacts/bycommunity/:community_id", get(contacts_by_community))
        .with_state(Collaborators::new(manager, services))
}

pub fn note_routes(manager: Arc<dyn KeyedManager<CommunityNote>>, services: Services) -> Router {
    Router::new()
        .route("/api/communitynotes", post(add_note))
        .route("/api/communitynotes/:id", delete(remove_note))
        .route("/api/communitynotes/bycommunity/:community_id", get(notes_by_community))
        .with_state(Collaborators::new(manager, services))
}

/// The caller as resolved from the identity claim, with the internal id taken
/// from the resolved record.
async fn resolved_context(auth: &AuthContext, services: &Services) -> Result<AuthContext, crate::error::ApiError> {
    let caller = services.scope(auth).resolve_caller().await?;
    Ok(AuthContext {
        principal: auth.principal.clone(),
        user_id: Some(caller.id),
    })
}

async fn contacts_by_community(
    ValidUser(_): ValidUser,
    PathParam(community_id): PathParam<Uuid>,
    State(contacts): State<Contacts>,
    RequestToken(token): RequestToken,
) -> ApiResult<Vec<CommunityContact>> {
    Ok(ApiResponse::success(
        keyed::get_by_parent(&contacts, community_id, &token).await?,
    ))
}

/// Only administrators of the contact's community (or site admins) may add contacts.
async fn add_contact(
    auth: AuthContext,
    State(contacts): State<Contacts>,
    RequestToken(token): RequestToken,
    Body(contact): Body<CommunityContact>,
) -> ApiResult<CommunityContact> {
    let caller = resolved_context(&auth, &contacts.services).await?;
    let created = keyed::add(
        &contacts,
        &caller,
        contact,
        Some(Policy::UserIsPartnerUserOrIsAdmin),
        &token,
    )
    .await?
    .into_result(CommunityContact::NAME)?;
    Ok(ApiResponse::success(created))
}

async fn remove_contact(
    PathParam(id): PathParam<Uuid>,
    auth: AuthContext,
    State(contacts): State<Contacts>,
    RequestToken(token): RequestToken,
) -> ApiResult<u64> {
    let removed = keyed::delete(&contacts, &auth, id, Policy::UserIsPartnerUserOrIsAdmin, &token)
        .await?
        .into_result(CommunityContact::NAME)?;
    Ok(ApiResponse::success(removed))
}

async fn notes_by_community(
    ValidUser(_): ValidUser,
    PathParam(community_id): PathParam<Uuid>,
    State(notes): State<Notes>,
    RequestToken(token): RequestToken,
) -> ApiResult<Vec<CommunityNote>> {
    Ok(ApiResponse::success(
        keyed::get_by_parent(&notes, community_id, &token).await?,
    ))
}

/// Any resolved caller may leave a note; there is no further policy check.
async fn add_note(
    auth: AuthContext,
    State(notes): State<Notes>,
    RequestToken(token): RequestToken,
    Body(note): Body<CommunityNote>,
) -> ApiResult<CommunityNote> {
    let caller = resolved_context(&auth, &notes.services).await?;
    let created = keyed::add(&notes, &caller, note, None, &token)
        .await?
        .into_result(CommunityNote::NAME)?;
    Ok(ApiResponse::success(created))
}

async fn remove_note(
    PathParam(id): PathParam<Uuid>,
    auth: AuthContext,
    State(notes): State<Notes>,
    RequestToken(token): RequestToken,
) -> ApiResult<u64> {
    let removed = keyed::delete(&notes, &auth, id, Policy::UserOwnsEntity, &token)
        .await?
        .into_result(CommunityNote::NAME)?;
    Ok(ApiResponse::success(removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{request, send, CountingManager, TestHarness};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    fn contact_json(community_id: Uuid) -> serde_json::Value {
        json!({ "communityId": community_id, "name": "Dana Parks", "email": "dana@lakeside.gov" })
    }

    #[tokio::test]
    async fn unresolved_caller_cannot_add_contact() {
        let h = TestHarness::new().await;
        let manager = Arc::new(CountingManager::<CommunityContact>::default());
        let router = contact_routes(manager.clone(), h.services.clone());

        let (status, _) = send(
            &router,
            request(
                Method::POST,
                "/api/communitycontacts",
                Some(h.unregistered_auth("ghost")),
                Some(contact_json(h.partner_id)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(manager.calls("add"), 0);

        let (status, _) = send(
            &router,
            request(Method::POST, "/api/communitycontacts", None, Some(contact_json(h.partner_id))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(manager.calls("add"), 0);
    }

    #[tokio::test]
    async fn contacts_require_community_membership() {
        let h = TestHarness::new().await;
        let manager = Arc::new(CountingManager::<CommunityContact>::default());
        let router = contact_routes(manager.clone(), h.services.clone());

        let (status, _) = send(
            &router,
            request(
                Method::POST,
                "/api/communitycontacts",
                Some(h.auth(&h.outsider)),
                Some(contact_json(h.partner_id)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(manager.calls("add"), 0);

        let (status, body) = send(
            &router,
            request(
                Method::POST,
                "/api/communitycontacts",
                Some(h.auth(&h.member)),
                Some(contact_json(h.partner_id)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Dana Parks");

        let uri = format!("/api/communitycontacts/bycommunity/{}", h.partner_id);
        let (status, body) = send(&router, request(Method::GET, &uri, Some(h.auth(&h.outsider)), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

        let contact_id = body["data"][0]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/communitycontacts/{}", contact_id);
        let (status, _) = send(&router, request(Method::DELETE, &uri, Some(h.auth(&h.outsider)), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&router, request(Method::DELETE, &uri, Some(h.auth(&h.member)), None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn any_resolved_caller_can_add_a_note() {
        let h = TestHarness::new().await;
        let manager = Arc::new(CountingManager::<CommunityNote>::default());
        let router = note_routes(manager.clone(), h.services.clone());
        let note = json!({ "communityId": h.partner_id, "body": "Called about the spring cleanup." });

        let (status, _) = send(
            &router,
            request(Method::POST, "/api/communitynotes", Some(h.unregistered_auth("ghost")), Some(note.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &router,
            request(Method::POST, "/api/communitynotes", Some(h.auth(&h.outsider)), Some(note)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["createdByUserId"], json!(h.outsider.id));
        assert_eq!(h.telemetry.events(), vec!["AddCommunityNote"]);
    }

    #[tokio::test]
    async fn only_the_author_deletes_a_note() {
        let h = TestHarness::new().await;
        let manager = Arc::new(CountingManager::<CommunityNote>::default());
        let router = note_routes(manager.clone(), h.services.clone());
        let note = manager
            .seed(&h.outsider, json!({ "communityId": h.partner_id, "body": "Left a voicemail." }))
            .await;
        let uri = format!("/api/communitynotes/{}", note.id);

        let (status, _) = send(&router, request(Method::DELETE, &uri, Some(h.auth(&h.member)), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(manager.calls("delete"), 0);

        let (status, _) = send(&router, request(Method::DELETE, &uri, Some(h.auth(&h.outsider)), None)).await;
        assert_eq!(status, StatusCode::OK);
    }
}

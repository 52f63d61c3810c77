use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use uuid::Uuid;

use crate::authorization::Policy;
use crate::dispatch::{keyed, Body, Collaborators, KeyedCollaborators, PathParam, Services};
use crate::managers::KeyedManager;
use crate::middleware::{ApiResponse, ApiResult, AuthContext, RequestToken};
use crate::models::{KeyedModel, Partner};

type Partners = KeyedCollaborators<Partner>;

pub fn routes(manager: Arc<dyn KeyedManager<Partner>>, services: Services) -> Router {
    Router::new()
        .route("/api/partners", get(list).post(create).put(update))
        .route("/api/partners/:id", get(fetch))
        .with_state(Collaborators::new(manager, services))
}

async fn list(State(partners): State<Partners>, RequestToken(token): RequestToken) -> ApiResult<Vec<Partner>> {
    Ok(ApiResponse::success(keyed::get_all(&partners, &token).await?))
}

async fn fetch(
    PathParam(id): PathParam<Uuid>,
    State(partners): State<Partners>,
    RequestToken(token): RequestToken,
) -> ApiResult<Partner> {
    let partner = keyed::get_one(&partners, id, &token).await?.into_result(Partner::NAME)?;
    Ok(ApiResponse::success(partner))
}

/// Onboarding a partner is a site admin task.
async fn create(
    auth: AuthContext,
    State(partners): State<Partners>,
    RequestToken(token): RequestToken,
    Body(partner): Body<Partner>,
) -> ApiResult<Partner> {
    let created = keyed::add(&partners, &auth, partner, Some(Policy::UserIsAdmin), &token)
        .await?
        .into_result(Partner::NAME)?;
    Ok(ApiResponse::success(created))
}

async fn update(
    auth: AuthContext,
    State(partners): State<Partners>,
    RequestToken(token): RequestToken,
    Body(partner): Body<Partner>,
) -> ApiResult<Partner> {
    let updated = keyed::update(&partners, &auth, partner, Policy::UserIsPartnerUserOrIsAdmin, &token)
        .await?
        .into_result(Partner::NAME)?;
    Ok(ApiResponse::success(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{request, send, CountingManager, TestHarness};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn partner_admins_can_update_their_partner() {
        let h = TestHarness::new().await;
        let manager = Arc::new(CountingManager::<Partner>::default());
        let router = routes(manager.clone(), h.services.clone());

        let partner = manager
            .seed(
                &h.admin,
                json!({ "id": h.partner_id, "name": "City of Lakeside", "partnerTypeId": 1, "partnerStatusId": 1 }),
            )
            .await;
        let mut body = serde_json::to_value(&partner).unwrap();
        body["notes"] = json!("Prefers weekend events");

        let (status, _) = send(
            &router,
            request(Method::PUT, "/api/partners", Some(h.auth(&h.outsider)), Some(body.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(manager.calls("update"), 0);

        let (status, updated) = send(&router, request(Method::PUT, "/api/partners", Some(h.auth(&h.member)), Some(body))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"]["notes"], "Prefers weekend events");
    }

    #[tokio::test]
    async fn partners_are_public_to_read() {
        let h = TestHarness::new().await;
        let manager = Arc::new(CountingManager::<Partner>::default());
        let router = routes(manager.clone(), h.services.clone());
        let partner = manager
            .seed(&h.admin, json!({ "name": "Lakeside Hauling", "partnerTypeId": 2, "partnerStatusId": 1 }))
            .await;

        let (status, body) = send(&router, request(Method::GET, "/api/partners", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

        let uri = format!("/api/partners/{}", partner.id);
        let (status, body) = send(&router, request(Method::GET, &uri, None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Lakeside Hauling");
    }

    #[tokio::test]
    async fn only_site_admins_onboard_partners() {
        let h = TestHarness::new().await;
        let manager = Arc::new(CountingManager::<Partner>::default());
        let router = routes(manager.clone(), h.services.clone());
        let partner = json!({ "name": "Lakeside Hauling", "partnerTypeId": 2, "partnerStatusId": 1 });

        let (status, _) = send(
            &router,
            request(Method::POST, "/api/partners", Some(h.auth(&h.member)), Some(partner.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&router, request(Method::POST, "/api/partners", Some(h.auth(&h.admin)), Some(partner))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Lakeside Hauling");
    }
}

use axum::Router;

use crate::authorization::Policy;
use crate::dispatch::{KeyedPolicies, KeyedRoutes, Services};
use crate::models::{JobOpportunity, PartnerDocument, Sponsor, Team};
use crate::state::Stores;

/// Resources served entirely by the generic keyed controller.
pub fn routes(stores: &Stores, services: &Services) -> Router {
    Router::new()
        .merge(KeyedRoutes::<Sponsor>::new("/api/sponsors").build(stores.sponsors.clone(), services.clone()))
        .merge(KeyedRoutes::<Team>::new("/api/teams").build(stores.teams.clone(), services.clone()))
        .merge(
            KeyedRoutes::<JobOpportunity>::new("/api/jobopportunities")
                .policies(KeyedPolicies::all(Policy::UserIsAdmin))
                .build(stores.job_opportunities.clone(), services.clone()),
        )
        .merge(
            KeyedRoutes::<PartnerDocument>::new("/api/partnerdocuments")
                .policies(KeyedPolicies::all(Policy::UserIsPartnerUserOrIsAdmin))
                .list_by_parent("bypartner")
                .build(stores.partner_documents.clone(), services.clone()),
        )
}

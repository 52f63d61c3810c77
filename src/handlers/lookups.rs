use axum::Router;

use crate::dispatch::{lookup_routes, Services};
use crate::state::Stores;

/// Read-only reference data. No authorization on any of these.
pub fn routes(stores: &Stores, services: &Services) -> Router {
    Router::new()
        .merge(lookup_routes("/api/eventtypes", stores.event_types.clone(), services.clone()))
        .merge(lookup_routes("/api/eventstatuses", stores.event_statuses.clone(), services.clone()))
        .merge(lookup_routes("/api/partnertypes", stores.partner_types.clone(), services.clone()))
        .merge(lookup_routes("/api/partnerstatuses", stores.partner_statuses.clone(), services.clone()))
        .merge(lookup_routes("/api/servicetypes", stores.service_types.clone(), services.clone()))
        .merge(lookup_routes(
            "/api/invitationstatuses",
            stores.invitation_statuses.clone(),
            services.clone(),
        ))
}

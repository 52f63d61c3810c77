use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::handlers;
use crate::managers::UserRepository;
use crate::middleware::{jwt_auth_middleware, request_scope_middleware, validate_user_middleware};
use crate::state::AppState;

/// The complete HTTP surface with identity, cancellation and tracing layers.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let users: Arc<dyn UserRepository> = state.stores.users.clone();

    let mut router = Router::new()
        // Public
        .merge(public_routes(state.clone()))
        // Reference data
        .merge(handlers::lookups::routes(&state.stores, &state.services))
        // Resources
        .merge(handlers::keyed::routes(&state.stores, &state.services))
        .merge(resource_routes(&state))
        // Layers run bottom-up: scope, then token, then user resolution.
        .layer(from_fn_with_state(users, validate_user_middleware))
        .layer(from_fn_with_state(state.keys.clone(), jwt_auth_middleware))
        .layer(from_fn_with_state(state.request_timeout, request_scope_middleware));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

fn public_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state)
}

fn resource_routes(state: &AppState) -> Router {
    let stores = &state.stores;
    let services = &state.services;

    Router::new()
        .merge(handlers::waivers::routes(stores.waivers.clone(), services.clone()))
        .merge(handlers::events::routes(stores.events.clone(), services.clone()))
        .merge(handlers::partners::routes(stores.partners.clone(), services.clone()))
        .merge(handlers::community::contact_routes(
            stores.community_contacts.clone(),
            services.clone(),
        ))
        .merge(handlers::community::note_routes(stores.community_notes.clone(), services.clone()))
        .merge(handlers::notification_preferences::routes(
            stores.notification_preferences.clone(),
            services.clone(),
        ))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Cleanup API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Community cleanup events, partners and volunteers",
            "endpoints": {
                "lookups": "/api/eventtypes, /api/eventstatuses, /api/partnertypes, /api/partnerstatuses, /api/servicetypes, /api/invitationstatuses (public)",
                "events": "/api/events[/:id], /api/events/userevents/:userId",
                "partners": "/api/partners[/:id], /api/partnerdocuments[/:id], /api/sponsors[/:id]",
                "community": "/api/communitycontacts, /api/communitynotes",
                "volunteering": "/api/jobopportunities[/:id], /api/teams[/:id], /api/waivers[/:id]",
                "preferences": "/api/usernotificationpreferences/:userId",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let Some(database) = &state.database else {
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "in-memory" }
            })),
        );
    };

    match database.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "Database unavailable",
                    "code": "SERVICE_UNAVAILABLE"
                })),
            )
        }
    }
}

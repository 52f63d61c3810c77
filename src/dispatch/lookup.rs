use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use tokio_util::sync::CancellationToken;

use super::base::{Collaborators, Services};
use crate::managers::{LookupManager, ManagerError};
use crate::middleware::{ApiResponse, ApiResult, RequestToken};
use crate::models::LookupModel;

pub type LookupCollaborators<T> = Collaborators<dyn LookupManager<T>>;

/// All rows of a lookup table, exactly as the manager returns them. Never authorized.
pub async fn get_all<T: LookupModel>(
    c: &LookupCollaborators<T>,
    token: &CancellationToken,
) -> Result<Vec<T>, ManagerError> {
    let rows = c.manager.get_all(token).await?;
    c.track_event(&format!("Get{}", T::PLURAL));
    Ok(rows)
}

/// `GET {path}` for one lookup table.
pub fn lookup_routes<T: LookupModel>(
    path: &'static str,
    manager: Arc<dyn LookupManager<T>>,
    services: Services,
) -> Router {
    Router::new()
        .route(path, get(collection_get::<T>))
        .with_state(Collaborators::new(manager, services))
}

async fn collection_get<T: LookupModel>(
    State(collaborators): State<LookupCollaborators<T>>,
    RequestToken(token): RequestToken,
) -> ApiResult<Vec<T>> {
    Ok(ApiResponse::success(get_all(&collaborators, &token).await?))
}

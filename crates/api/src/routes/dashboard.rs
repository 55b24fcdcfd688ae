//! Shop dashboard endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use document_store::DocumentStore;
use domain::{ShopDashboard, ShopId, ShopScope};

use crate::auth::Actor;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /shops/{shop_id}/dashboard: order counts and revenue for shop managers.
#[tracing::instrument(skip(state, actor))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Path(shop_id): Path<ShopId>,
) -> Result<Json<ShopDashboard>, ApiError> {
    let dashboard = state
        .dashboard
        .shop_dashboard(&actor, &ShopScope::new(shop_id))
        .await?;
    Ok(Json(dashboard))
}

//! Connection requests between customers and physical shops.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use document_store::DocumentStore;
use domain::{ConnectionStatus, CustomerId, Resolution, ShopConnection, ShopId};
use serde::{Deserialize, Serialize};

use crate::auth::Actor;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub approve: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResponse {
    pub shop_id: ShopId,
    pub customer_id: CustomerId,
    pub status: ConnectionStatus,
}

/// POST /shops/{shop_id}/connections: the caller asks to join a physical shop.
#[tracing::instrument(skip(state, actor))]
pub async fn request<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Path(shop_id): Path<ShopId>,
) -> Result<(StatusCode, Json<ShopConnection>), ApiError> {
    let connection = state.connections.request_connection(&actor, &shop_id).await?;
    Ok((StatusCode::CREATED, Json(connection)))
}

/// POST /shops/{shop_id}/connections/{customer_id}: the owner approves or rejects.
#[tracing::instrument(skip(state, actor, req))]
pub async fn resolve<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Path((shop_id, customer_id)): Path<(ShopId, CustomerId)>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ResolutionResponse>, ApiError> {
    let resolution = state
        .connections
        .resolve_connection(&actor, &shop_id, &customer_id, req.approve)
        .await?;

    let status = match resolution {
        Resolution::Approved(connection) => connection.status,
        Resolution::Rejected { .. } => ConnectionStatus::Rejected,
    };
    Ok(Json(ResolutionResponse {
        shop_id,
        customer_id,
        status,
    }))
}

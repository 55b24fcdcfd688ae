//! Cart endpoints for the calling customer.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use document_store::DocumentStore;
use domain::{AddCartItem, CartItem, CartItemId, ShopId};
use serde::Deserialize;

use crate::auth::Actor;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuery {
    pub shop_id: Option<ShopId>,
}

/// GET /cart: the caller's cart, optionally for one shop.
#[tracing::instrument(skip(state, actor))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Query(query): Query<CartQuery>,
) -> Result<Json<Vec<CartItem>>, ApiError> {
    let items = state.cart.list(&actor, query.shop_id.as_ref()).await?;
    Ok(Json(items))
}

/// POST /cart: adds a product or increments the matching line.
#[tracing::instrument(skip(state, actor, req))]
pub async fn add<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Json(req): Json<AddCartItem>,
) -> Result<(StatusCode, Json<CartItem>), ApiError> {
    let item = state.cart.add_item(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// DELETE /cart/{id}
#[tracing::instrument(skip(state, actor))]
pub async fn remove<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Path(id): Path<CartItemId>,
) -> Result<StatusCode, ApiError> {
    state.cart.remove_item(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

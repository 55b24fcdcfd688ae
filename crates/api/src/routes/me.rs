//! Views scoped to the calling customer.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use document_store::DocumentStore;
use domain::{CustomerId, Order, ShopConnection};

use crate::auth::Actor;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /me/orders
#[tracing::instrument(skip(state, actor))]
pub async fn orders<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
) -> Result<Json<Vec<Order>>, ApiError> {
    let customer_id = CustomerId::from(actor.subject.clone());
    let orders = state
        .orders
        .list_customer_orders(&actor, &customer_id)
        .await?;
    Ok(Json(orders))
}

/// GET /me/memberships
#[tracing::instrument(skip(state, actor))]
pub async fn memberships<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
) -> Result<Json<Vec<ShopConnection>>, ApiError> {
    let customer_id = CustomerId::from(actor.subject.clone());
    let memberships = state
        .connections
        .list_memberships(&actor, &customer_id)
        .await?;
    Ok(Json(memberships))
}

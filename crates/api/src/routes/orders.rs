//! Checkout and order management endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use document_store::DocumentStore;
use domain::{
    CartItemId, CustomerId, DeliveryAddress, DomainError, Order, OrderAdjustments, OrderId,
    OrderStatus, PaymentMethod, PlaceOrder, ShopId, ShopScope,
};
use serde::Deserialize;

use crate::auth::Actor;
use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub delivery_address: DeliveryAddress,
    #[serde(default)]
    pub adjustments: OrderAdjustments,
    /// Restricts checkout to these cart items. The whole shop cart is used when absent.
    #[serde(default)]
    pub cart_item_ids: Option<Vec<CartItemId>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
}

// -- Handlers --

/// POST /shops/{shop_id}/orders: turns the caller's cart for this shop into an order.
#[tracing::instrument(skip(state, actor, req))]
pub async fn place<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Path(shop_id): Path<ShopId>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let mut cart = state.cart.list(&actor, Some(&shop_id)).await?;
    if let Some(ids) = &req.cart_item_ids {
        if let Some(missing) = ids.iter().find(|id| !cart.iter().any(|item| &item.id == *id)) {
            return Err(ApiError::BadRequest(format!("unknown cart item {missing}")));
        }
        cart.retain(|item| ids.contains(&item.id));
    }

    let cmd = PlaceOrder {
        customer_id: CustomerId::from(actor.subject.clone()),
        shop_id,
        cart,
        payment_method: req.payment_method,
        delivery_address: req.delivery_address,
        adjustments: req.adjustments,
    };
    let order = state.checkout.place_order(&actor, cmd).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /shops/{shop_id}/orders: the shop's orders, optionally filtered by `?status=`.
#[tracing::instrument(skip(state, actor))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Path(shop_id): Path<ShopId>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(DomainError::from)?;

    let orders = state
        .orders
        .list_shop_orders(&actor, &ShopScope::new(shop_id), status)
        .await?;
    Ok(Json(orders))
}

/// GET /shops/{shop_id}/orders/{id}
#[tracing::instrument(skip(state, actor))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Path((shop_id, id)): Path<(ShopId, OrderId)>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .get_order(&actor, &ShopScope::new(shop_id), &id)
        .await?;
    Ok(Json(order))
}

/// POST /shops/{shop_id}/orders/{id}/status
#[tracing::instrument(skip(state, actor, req))]
pub async fn set_status<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Path((shop_id, id)): Path<(ShopId, OrderId)>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .set_order_status(&actor, &ShopScope::new(shop_id), &id, &req.status)
        .await?;
    Ok(Json(order))
}

/// POST /shops/{shop_id}/orders/{id}/payment
#[tracing::instrument(skip(state, actor, req))]
pub async fn set_payment<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Path((shop_id, id)): Path<(ShopId, OrderId)>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .set_payment_status(&actor, &ShopScope::new(shop_id), &id, &req.status)
        .await?;
    Ok(Json(order))
}

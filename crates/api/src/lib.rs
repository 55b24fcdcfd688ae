//! HTTP API server with observability for the shop core.
//!
//! Exposes carts, checkout, order management, connection requests, banners
//! and shop dashboards over REST, with structured logging (tracing) and
//! Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use document_store::DocumentStore;
use domain::PrincipalResolver;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/cart",
            get(routes::cart::list::<S>).post(routes::cart::add::<S>),
        )
        .route("/cart/{id}", delete(routes::cart::remove::<S>))
        .route(
            "/shops/{shop_id}/orders",
            get(routes::orders::list::<S>).post(routes::orders::place::<S>),
        )
        .route("/shops/{shop_id}/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/shops/{shop_id}/orders/{id}/status",
            post(routes::orders::set_status::<S>),
        )
        .route(
            "/shops/{shop_id}/orders/{id}/payment",
            post(routes::orders::set_payment::<S>),
        )
        .route(
            "/shops/{shop_id}/dashboard",
            get(routes::dashboard::get::<S>),
        )
        .route(
            "/shops/{shop_id}/connections",
            post(routes::connections::request::<S>),
        )
        .route(
            "/shops/{shop_id}/connections/{customer_id}",
            post(routes::connections::resolve::<S>),
        )
        .route("/me/orders", get(routes::me::orders::<S>))
        .route("/me/memberships", get(routes::me::memberships::<S>))
        .route(
            "/banners",
            get(routes::banners::list::<S>).put(routes::banners::create::<S>),
        )
        .route("/banners/active", get(routes::banners::active::<S>))
        .route(
            "/banners/{id}",
            get(routes::banners::get::<S>)
                .put(routes::banners::upsert::<S>)
                .delete(routes::banners::delete::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over `store`.
pub fn create_default_state<S: DocumentStore + Clone + 'static>(
    store: S,
    resolver: Arc<dyn PrincipalResolver>,
) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store, resolver))
}

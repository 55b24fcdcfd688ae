//! Shared application state.

use std::sync::Arc;

use document_store::DocumentStore;
use domain::{
    BannerService, CartService, CheckoutService, ConnectionService, DashboardService,
    OrderService, PrincipalResolver, StoreCatalog,
};

/// Services shared by every handler.
pub struct AppState<S: DocumentStore + Clone> {
    pub cart: CartService<S, StoreCatalog<S>>,
    pub checkout: CheckoutService<S, StoreCatalog<S>>,
    pub orders: OrderService<S>,
    pub connections: ConnectionService<S>,
    pub banners: BannerService<S>,
    pub dashboard: DashboardService<S>,
    pub resolver: Arc<dyn PrincipalResolver>,
}

impl<S: DocumentStore + Clone> AppState<S> {
    /// Wires every service to the same store.
    pub fn new(store: S, resolver: Arc<dyn PrincipalResolver>) -> Self {
        Self {
            cart: CartService::new(store.clone(), StoreCatalog::new(store.clone())),
            checkout: CheckoutService::new(store.clone(), StoreCatalog::new(store.clone())),
            orders: OrderService::new(store.clone()),
            connections: ConnectionService::new(store.clone()),
            banners: BannerService::new(store.clone()),
            dashboard: DashboardService::new(store),
            resolver,
        }
    }
}

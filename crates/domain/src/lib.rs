//! Domain layer of the multi-tenant shop core.
//!
//! This crate provides the workflows that mutate shared shop records:
//! - Cart management and checkout (cart to order in one atomic batch)
//! - The order state machine with its two status axes
//! - Connection requests between customers and physical shops
//! - Banner exclusivity across the platform
//!
//! Every workflow is a service generic over a [`document_store::DocumentStore`]
//! and receives the acting [`Principal`] explicitly.

pub mod banner;
pub mod cart;
pub mod catalog;
pub mod collections;
pub mod connection;
pub mod dashboard;
pub mod error;
pub mod identity;
pub mod money;
pub mod order;
pub mod shop;

use common::DocumentId;

pub use banner::{Banner, BannerDraft, BannerService};
pub use cart::{AddCartItem, CartItem, CartService};
pub use catalog::{Catalog, Product, StoreCatalog, Variant, VariantQuote};
pub use connection::{ConnectionService, ConnectionStatus, Customer, Resolution, ShopConnection};
pub use dashboard::{DashboardService, ShopDashboard};
pub use error::{DomainError, ValidationError};
pub use identity::{Principal, PrincipalResolver, Role, StaticPrincipalResolver};
pub use money::Money;
pub use order::{
    CheckoutService, DeliveryAddress, Order, OrderAdjustments, OrderLine, OrderService,
    OrderStatus, OrderTotals, PaymentMethod, PaymentStatus, PlaceOrder, Transition,
};
pub use shop::{Shop, ShopDirectory, ShopScope, ShopStatus, ShopType};

/// Shop ids key each customer's membership map and may not contain `.`.
pub type ShopId = DocumentId;
pub type CustomerId = DocumentId;
pub type ProductId = DocumentId;
pub type OrderId = DocumentId;
pub type CartItemId = DocumentId;
pub type BannerId = DocumentId;

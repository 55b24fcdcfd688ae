//! Orders: checkout, the status machines, and order reads.

mod checkout;
mod model;
mod service;
mod state;

pub use checkout::{CheckoutService, PlaceOrder};
pub use model::{DeliveryAddress, Order, OrderAdjustments, OrderLine, OrderTotals, PaymentMethod};
pub use service::OrderService;
pub use state::{OrderStatus, PaymentStatus, Transition};

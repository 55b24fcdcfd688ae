//! Cart to order conversion.

use chrono::Utc;
use document_store::{DocumentStore, Precondition, WriteBatch, WriteOp};
use serde::{Deserialize, Serialize};

use super::{
    DeliveryAddress, Order, OrderAdjustments, OrderLine, OrderStatus, OrderTotals, PaymentMethod,
    PaymentStatus,
};
use crate::{
    CustomerId, OrderId, ShopId,
    cart::CartItem,
    catalog::Catalog,
    collections::{CART_ITEMS, ORDERS},
    connection::load_customer,
    error::{DomainError, ValidationError},
    identity::Principal,
    shop::{Shop, ShopDirectory},
};

/// Everything needed to turn a cart into an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub customer_id: CustomerId,
    pub shop_id: ShopId,
    /// The cart items being bought, as read by the caller.
    pub cart: Vec<CartItem>,
    pub payment_method: PaymentMethod,
    pub delivery_address: DeliveryAddress,
    #[serde(default)]
    pub adjustments: OrderAdjustments,
}

/// Service for the checkout workflow.
pub struct CheckoutService<S: DocumentStore, C: Catalog> {
    store: S,
    shops: ShopDirectory<S>,
    catalog: C,
}

impl<S: DocumentStore + Clone, C: Catalog> CheckoutService<S, C> {
    pub fn new(store: S, catalog: C) -> Self {
        Self {
            shops: ShopDirectory::new(store.clone()),
            store,
            catalog,
        }
    }

    /// Places an order for the cart snapshot and empties those cart items.
    ///
    /// The order and the cart deletions are committed in one batch. Every
    /// delete requires its item to still exist, so two checkouts of the same
    /// cart cannot both commit.
    #[tracing::instrument(
        skip(self, actor, cmd),
        fields(customer = %cmd.customer_id, shop = %cmd.shop_id, items = cmd.cart.len())
    )]
    pub async fn place_order(
        &self,
        actor: &Principal,
        cmd: PlaceOrder,
    ) -> Result<Order, DomainError> {
        if !actor.is_customer(&cmd.customer_id) {
            return Err(DomainError::Unauthorized);
        }
        if cmd.cart.is_empty() {
            return Err(ValidationError::InvalidCart("cart is empty".to_string()).into());
        }

        let shop = self.eligible_shop(&cmd.customer_id, &cmd.shop_id).await?;
        let lines = self.order_lines(&cmd).await?;

        let delivery_charge = cmd
            .adjustments
            .delivery_charge
            .unwrap_or(shop.delivery_charge);
        let totals = OrderTotals::compute(
            &lines,
            delivery_charge,
            cmd.adjustments.tax,
            cmd.adjustments.discount,
        )?;

        let now = Utc::now();
        let order = Order {
            id: OrderId::generate(),
            shop_id: shop.id,
            customer_id: cmd.customer_id,
            items: lines,
            totals,
            order_status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_method: cmd.payment_method,
            delivery_address: cmd.delivery_address,
            created_at: now,
            updated_at: now,
        };

        let mut batch = WriteBatch::new().with(
            WriteOp::set_serialized(ORDERS.key(order.id.clone()), &order)?
                .when(Precondition::Missing),
        );
        for item in &cmd.cart {
            batch.push(
                WriteOp::delete(CART_ITEMS.key(item.id.clone())).when(Precondition::Exists),
            );
        }

        if let Err(e) = self.store.commit(batch).await {
            metrics::counter!("checkout_failures_total").increment(1);
            tracing::warn!(error = %e, "checkout batch rejected");
            return Err(e.into());
        }

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("order_total_cents").record(order.total().cents() as f64);
        tracing::info!(order_id = %order.id, total = %order.total(), "order placed");
        Ok(order)
    }

    /// Resolves the shop the order goes to, or fails with NoActiveShop.
    async fn eligible_shop(
        &self,
        customer_id: &CustomerId,
        shop_id: &ShopId,
    ) -> Result<Shop, DomainError> {
        let shop = match self.shops.find(shop_id).await? {
            Some(shop) if shop.is_active() => shop,
            _ => return Err(ValidationError::NoActiveShop.into()),
        };

        if shop.is_physical() {
            let connected = load_customer(&self.store, customer_id)
                .await?
                .is_some_and(|(customer, _)| customer.is_active_member(shop_id));
            if !connected {
                return Err(ValidationError::NoActiveShop.into());
            }
        }

        Ok(shop)
    }

    /// Checks the snapshot and copies it into order lines.
    async fn order_lines(&self, cmd: &PlaceOrder) -> Result<Vec<OrderLine>, DomainError> {
        let mut lines = Vec::with_capacity(cmd.cart.len());
        for (index, item) in cmd.cart.iter().enumerate() {
            if item.customer_id != cmd.customer_id || item.shop_id != cmd.shop_id {
                return Err(ValidationError::InvalidCart(format!(
                    "item {} does not belong to this customer and shop",
                    item.id
                ))
                .into());
            }
            if cmd.cart[..index].iter().any(|other| other.id == item.id) {
                return Err(
                    ValidationError::InvalidCart(format!("item {} listed twice", item.id)).into(),
                );
            }
            if item.quantity == 0 {
                return Err(ValidationError::InvalidQuantity(item.quantity).into());
            }

            self.catalog
                .get_variant(&cmd.shop_id, &item.product_id, Some(&item.sku))
                .await?
                .ok_or_else(|| ValidationError::UnknownProduct(item.product_id.to_string()))?;

            lines.push(OrderLine {
                product_id: item.product_id.clone(),
                name: item.name.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity,
            });
        }
        Ok(lines)
    }
}

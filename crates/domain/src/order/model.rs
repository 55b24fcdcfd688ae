//! Order records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OrderStatus, PaymentStatus};
use crate::{CustomerId, Money, OrderId, ProductId, ShopId, error::ValidationError};

/// A line of an order, copied by value from the cart at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    fn checked_line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    Card,
    Wallet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub recipient: String,
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Optional overrides applied on top of the shop's financial defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderAdjustments {
    /// Replaces the shop's delivery charge.
    #[serde(default)]
    pub delivery_charge: Option<Money>,
    #[serde(default)]
    pub tax: Money,
    #[serde(default)]
    pub discount: Money,
}

/// Monetary breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Money,
    pub delivery_charge: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Computes `total = subtotal + delivery_charge + tax - discount`.
    pub fn compute(
        lines: &[OrderLine],
        delivery_charge: Money,
        tax: Money,
        discount: Money,
    ) -> Result<Self, ValidationError> {
        if delivery_charge.is_negative() || tax.is_negative() || discount.is_negative() {
            return Err(ValidationError::InvalidAdjustment(
                "amounts must not be negative".to_string(),
            ));
        }

        let overflow = || ValidationError::InvalidCart("order amount is out of range".to_string());
        let subtotal = lines.iter().try_fold(Money::zero(), |sum, line| {
            line.checked_line_total()
                .and_then(|amount| sum.checked_add(amount))
        });
        let subtotal = subtotal.ok_or_else(overflow)?;
        let total = subtotal
            .checked_add(delivery_charge)
            .and_then(|amount| amount.checked_add(tax))
            .and_then(|amount| amount.checked_sub(discount))
            .ok_or_else(overflow)?;
        if total.is_negative() {
            return Err(ValidationError::InvalidAdjustment(format!(
                "discount {discount} exceeds the order amount"
            )));
        }

        Ok(Self {
            subtotal,
            delivery_charge,
            discount,
            tax,
            total,
        })
    }
}

/// An order placed with one shop.
///
/// After creation only `order_status`, `payment_status` and `updated_at`
/// change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub shop_id: ShopId,
    pub customer_id: CustomerId,
    pub items: Vec<OrderLine>,
    #[serde(flatten)]
    pub totals: OrderTotals,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub delivery_address: DeliveryAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn total(&self) -> Money {
        self.totals.total
    }
}

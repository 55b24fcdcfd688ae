//! Per-shop order statistics.

use std::collections::BTreeMap;

use document_store::{DocumentQuery, DocumentStore, DocumentStoreExt};
use serde::Serialize;

use crate::{
    Money, ShopId,
    collections::ORDERS,
    error::DomainError,
    identity::Principal,
    order::{Order, OrderStatus, PaymentStatus},
    shop::ShopScope,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopDashboard {
    pub shop_id: ShopId,
    pub total_orders: usize,
    pub by_status: BTreeMap<OrderStatus, usize>,
    pub paid: usize,
    pub unpaid: usize,
    /// Sum of totals of delivered orders.
    pub revenue: Money,
}

impl ShopDashboard {
    fn empty(shop_id: ShopId) -> Self {
        Self {
            shop_id,
            total_orders: 0,
            by_status: OrderStatus::ALL.into_iter().map(|s| (s, 0)).collect(),
            paid: 0,
            unpaid: 0,
            revenue: Money::zero(),
        }
    }

    fn record(&mut self, order: &Order) {
        self.total_orders += 1;
        *self.by_status.entry(order.order_status).or_default() += 1;
        match order.payment_status {
            PaymentStatus::Paid => self.paid += 1,
            PaymentStatus::Unpaid => self.unpaid += 1,
        }
        if order.order_status == OrderStatus::Delivered {
            self.revenue += order.total();
        }
    }
}

pub struct DashboardService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> DashboardService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, actor))]
    pub async fn shop_dashboard(
        &self,
        actor: &Principal,
        scope: &ShopScope,
    ) -> Result<ShopDashboard, DomainError> {
        actor.require_shop_manager(scope.shop_id())?;

        let orders: Vec<Order> = self
            .store
            .query_decoded(DocumentQuery::new(ORDERS).where_eq("shopId", scope.shop_id().as_str()))
            .await?;

        let mut dashboard = ShopDashboard::empty(scope.shop_id().clone());
        for order in &orders {
            dashboard.record(order);
        }
        Ok(dashboard)
    }
}

//! Order service: status changes and order reads.

use document_store::{
    Document, DocumentQuery, DocumentStore, DocumentStoreExt, FieldUpdate, Precondition,
    WriteBatch, WriteOp,
};

use super::{Order, OrderStatus, PaymentStatus, Transition};
use crate::{
    CustomerId, OrderId, collections::ORDERS, error::DomainError, identity::Principal,
    shop::ShopScope,
};

/// Service for managing placed orders.
///
/// Status writes carry a version precondition of the order as read, so a
/// concurrent change makes the later writer fail with `Conflict` instead of
/// silently overwriting.
pub struct OrderService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> OrderService<S> {
    /// Creates a new order service with the given document store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads an order of the scoped shop, hiding orders of other shops.
    async fn load(
        &self,
        scope: &ShopScope,
        order_id: &OrderId,
    ) -> Result<(Order, Document), DomainError> {
        match self
            .store
            .get_decoded::<Order>(&ORDERS.key(order_id.clone()))
            .await?
        {
            Some((order, document)) if &order.shop_id == scope.shop_id() => Ok((order, document)),
            _ => Err(DomainError::not_found("Order", order_id)),
        }
    }

    async fn write_status(
        &self,
        document: &Document,
        field: &'static str,
        value: &'static str,
    ) -> Result<chrono::DateTime<chrono::Utc>, DomainError> {
        let op = WriteOp::update(
            document.key.clone(),
            vec![
                FieldUpdate::set(field, value),
                FieldUpdate::commit_timestamp("updatedAt"),
            ],
        )
        .when(Precondition::Version(document.version));

        let receipt = self.store.commit(WriteBatch::new().with(op)).await?;
        Ok(receipt.committed_at)
    }

    /// Moves an order along its fulfilment path.
    ///
    /// Re-applying the current status is accepted and writes nothing.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.subject))]
    pub async fn set_order_status(
        &self,
        actor: &Principal,
        scope: &ShopScope,
        order_id: &OrderId,
        new_status: &str,
    ) -> Result<Order, DomainError> {
        actor.require_shop_manager(scope.shop_id())?;
        let target: OrderStatus = new_status.parse()?;

        let (mut order, document) = self.load(scope, order_id).await?;
        match order.order_status.transition_to(target)? {
            Transition::Unchanged => Ok(order),
            Transition::Changed { from, to } => {
                order.updated_at = self
                    .write_status(&document, "orderStatus", to.as_str())
                    .await?;
                order.order_status = to;

                metrics::counter!("order_status_transitions_total", "to" => to.as_str())
                    .increment(1);
                tracing::info!(%order_id, %from, %to, "order status changed");
                Ok(order)
            }
        }
    }

    /// Marks an order paid or unpaid.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.subject))]
    pub async fn set_payment_status(
        &self,
        actor: &Principal,
        scope: &ShopScope,
        order_id: &OrderId,
        new_status: &str,
    ) -> Result<Order, DomainError> {
        actor.require_shop_manager(scope.shop_id())?;
        let target: PaymentStatus = new_status.parse()?;

        let (mut order, document) = self.load(scope, order_id).await?;
        match order.payment_status.transition_to(target) {
            Transition::Unchanged => Ok(order),
            Transition::Changed { from, to } => {
                order.updated_at = self
                    .write_status(&document, "paymentStatus", to.as_str())
                    .await?;
                order.payment_status = to;

                metrics::counter!("payment_status_changes_total", "to" => to.as_str())
                    .increment(1);
                tracing::info!(%order_id, %from, %to, "payment status changed");
                Ok(order)
            }
        }
    }

    /// Gets an order. Visible to managers of its shop and to the ordering customer.
    #[tracing::instrument(skip(self, actor))]
    pub async fn get_order(
        &self,
        actor: &Principal,
        scope: &ShopScope,
        order_id: &OrderId,
    ) -> Result<Order, DomainError> {
        let (order, _) = self.load(scope, order_id).await?;
        if actor.can_manage_shop(&order.shop_id) || actor.is_customer(&order.customer_id) {
            Ok(order)
        } else {
            Err(DomainError::Unauthorized)
        }
    }

    /// Lists the orders of one shop, oldest first.
    #[tracing::instrument(skip(self, actor))]
    pub async fn list_shop_orders(
        &self,
        actor: &Principal,
        scope: &ShopScope,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, DomainError> {
        actor.require_shop_manager(scope.shop_id())?;

        let mut query = DocumentQuery::new(ORDERS).where_eq("shopId", scope.shop_id().as_str());
        if let Some(status) = status {
            query = query.where_eq("orderStatus", status.as_str());
        }
        Ok(self.store.query_decoded(query).await?)
    }

    /// Lists the orders placed by a customer across all shops.
    #[tracing::instrument(skip(self, actor))]
    pub async fn list_customer_orders(
        &self,
        actor: &Principal,
        customer_id: &CustomerId,
    ) -> Result<Vec<Order>, DomainError> {
        if !actor.is_customer(customer_id) && !actor.is_admin() {
            return Err(DomainError::Unauthorized);
        }

        let query = DocumentQuery::new(ORDERS).where_eq("customerId", customer_id.as_str());
        Ok(self.store.query_decoded(query).await?)
    }
}

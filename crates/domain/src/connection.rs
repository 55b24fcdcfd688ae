//! Customer memberships of physical shops.
//!
//! A customer document carries a `memberships` map keyed by shop id, so a
//! customer has at most one connection per shop and a connection is
//! addressed by path (`memberships.<shopId>`) rather than by value.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use document_store::{
    DocumentStore, DocumentStoreExt, FieldUpdate, Precondition, WriteBatch, WriteOp, field,
};
use serde::{Deserialize, Serialize};

use crate::{
    CustomerId, ShopId,
    collections::CUSTOMERS,
    error::{DomainError, ValidationError},
    identity::Principal,
    shop::ShopDirectory,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Active,
    Rejected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Active => "active",
            ConnectionStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Membership tuple of one customer with one shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopConnection {
    pub shop_id: ShopId,
    pub shop_name: String,
    pub status: ConnectionStatus,
}

/// The customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    #[serde(default)]
    pub memberships: BTreeMap<ShopId, ShopConnection>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Customer {
    pub fn new(id: CustomerId) -> Self {
        Self {
            id,
            memberships: BTreeMap::new(),
            updated_at: None,
        }
    }

    pub fn membership(&self, shop_id: &ShopId) -> Option<&ShopConnection> {
        self.memberships.get(shop_id)
    }

    /// Returns true if the customer holds an active connection to `shop_id`.
    pub fn is_active_member(&self, shop_id: &ShopId) -> bool {
        self.membership(shop_id)
            .is_some_and(|m| m.status == ConnectionStatus::Active)
    }
}

/// Outcome of resolving a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The entry is now active.
    Approved(ShopConnection),
    /// The entry was removed.
    Rejected { shop_id: ShopId },
}

fn membership_path(shop_id: &ShopId) -> Result<String, DomainError> {
    field::join_path(&["memberships", shop_id.as_str()])
        .ok_or_else(|| ValidationError::InvalidIdentifier(shop_id.to_string()).into())
}

/// Loads a customer record. Missing customers have no memberships.
pub(crate) async fn load_customer<S: DocumentStore>(
    store: &S,
    customer_id: &CustomerId,
) -> Result<Option<(Customer, document_store::Document)>, DomainError> {
    Ok(store
        .get_decoded::<Customer>(&CUSTOMERS.key(customer_id.clone()))
        .await?)
}

/// Service for the connection-request workflow.
pub struct ConnectionService<S: DocumentStore> {
    store: S,
    shops: ShopDirectory<S>,
}

impl<S: DocumentStore + Clone> ConnectionService<S> {
    pub fn new(store: S) -> Self {
        Self {
            shops: ShopDirectory::new(store.clone()),
            store,
        }
    }

    /// Records a pending request from the calling customer to `shop_id`.
    #[tracing::instrument(skip(self, actor), fields(customer = %actor.subject))]
    pub async fn request_connection(
        &self,
        actor: &Principal,
        shop_id: &ShopId,
    ) -> Result<ShopConnection, DomainError> {
        let customer_id = actor.require_customer()?;
        let shop = self.shops.get(shop_id).await?;
        if !shop.is_physical() {
            return Err(ValidationError::ConnectionNotRequired(shop_id.to_string()).into());
        }
        if !shop.is_active() {
            return Err(ValidationError::ShopUnavailable(shop_id.to_string()).into());
        }

        let path = membership_path(shop_id)?;
        let connection = ShopConnection {
            shop_id: shop_id.clone(),
            shop_name: shop.name.clone(),
            status: ConnectionStatus::Pending,
        };
        let key = CUSTOMERS.key(customer_id.clone());

        let op = match load_customer(&self.store, &customer_id).await? {
            Some((customer, document)) => {
                if let Some(existing) = customer.membership(shop_id)
                    && existing.status != ConnectionStatus::Rejected
                {
                    return Err(ValidationError::AlreadyConnected {
                        shop_id: shop_id.to_string(),
                        status: existing.status.to_string(),
                    }
                    .into());
                }
                WriteOp::update(
                    key,
                    vec![
                        FieldUpdate::set_serialized(path, &connection)?,
                        FieldUpdate::commit_timestamp("updatedAt"),
                    ],
                )
                .when(Precondition::Version(document.version))
            }
            None => {
                let mut customer = Customer::new(customer_id.clone());
                customer.memberships.insert(shop_id.clone(), connection.clone());
                customer.updated_at = Some(Utc::now());
                WriteOp::set_serialized(key, &customer)?.when(Precondition::Missing)
            }
        };

        self.store.commit(WriteBatch::new().with(op)).await?;

        metrics::counter!("connection_requests_total").increment(1);
        tracing::info!(%customer_id, %shop_id, "connection requested");
        Ok(connection)
    }

    /// Approves or rejects a pending request of `customer_id` to `shop_id`.
    ///
    /// Approval replaces the entry with an active one; rejection removes it.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.subject))]
    pub async fn resolve_connection(
        &self,
        actor: &Principal,
        shop_id: &ShopId,
        customer_id: &CustomerId,
        approve: bool,
    ) -> Result<Resolution, DomainError> {
        actor.require_shop_owner(shop_id)?;
        let path = membership_path(shop_id)?;

        let (customer, document) = load_customer(&self.store, customer_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Customer", customer_id))?;

        let pending = customer
            .membership(shop_id)
            .filter(|m| m.status == ConnectionStatus::Pending)
            .ok_or_else(|| {
                DomainError::not_found("Connection request", format!("{customer_id}/{shop_id}"))
            })?;

        let (update, resolution) = if approve {
            let active = ShopConnection {
                status: ConnectionStatus::Active,
                ..pending.clone()
            };
            (
                FieldUpdate::set_serialized(path, &active)?,
                Resolution::Approved(active),
            )
        } else {
            (
                FieldUpdate::delete(path),
                Resolution::Rejected {
                    shop_id: shop_id.clone(),
                },
            )
        };

        let op = WriteOp::update(
            CUSTOMERS.key(customer_id.clone()),
            vec![update, FieldUpdate::commit_timestamp("updatedAt")],
        )
        .when(Precondition::Version(document.version));
        self.store.commit(WriteBatch::new().with(op)).await?;

        metrics::counter!("connection_resolutions_total", "approved" => approve.to_string())
            .increment(1);
        tracing::info!(%customer_id, %shop_id, approve, "connection resolved");
        Ok(resolution)
    }

    /// Lists the memberships of a customer. Readable by that customer and by admins.
    #[tracing::instrument(skip(self, actor))]
    pub async fn list_memberships(
        &self,
        actor: &Principal,
        customer_id: &CustomerId,
    ) -> Result<Vec<ShopConnection>, DomainError> {
        if !actor.is_customer(customer_id) && !actor.is_admin() {
            return Err(DomainError::Unauthorized);
        }

        Ok(load_customer(&self.store, customer_id)
            .await?
            .map(|(customer, _)| customer.memberships.into_values().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Money,
        shop::{Shop, ShopStatus, ShopType},
    };
    use document_store::InMemoryDocumentStore;

    fn shop(id: &str, shop_type: ShopType) -> Shop {
        Shop {
            id: ShopId::new(id),
            name: format!("Shop {id}"),
            shop_type,
            owner_id: "owner".to_string(),
            currency: "USD".to_string(),
            delivery_charge: Money::zero(),
            tax_rate_bps: 0,
            status: ShopStatus::Active,
        }
    }

    async fn service() -> ConnectionService<InMemoryDocumentStore> {
        let store = InMemoryDocumentStore::new();
        store
            .commit(
                WriteBatch::new()
                    .with(shop("s1", ShopType::Physical).to_write_op().unwrap())
                    .with(shop("web", ShopType::Online).to_write_op().unwrap()),
            )
            .await
            .unwrap();
        ConnectionService::new(store)
    }

    fn customer() -> Principal {
        Principal::customer("c1")
    }

    fn owner() -> Principal {
        Principal::owner("owner", "s1")
    }

    #[tokio::test]
    async fn request_then_approve_leaves_one_active_entry() {
        let service = service().await;
        let s1 = ShopId::new("s1");
        let c1 = CustomerId::new("c1");

        let pending = service.request_connection(&customer(), &s1).await.unwrap();
        assert_eq!(pending.status, ConnectionStatus::Pending);
        assert_eq!(pending.shop_name, "Shop s1");

        let resolution = service
            .resolve_connection(&owner(), &s1, &c1, true)
            .await
            .unwrap();
        assert!(matches!(resolution, Resolution::Approved(_)));

        let memberships = service.list_memberships(&customer(), &c1).await.unwrap();
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].status, ConnectionStatus::Active);
    }

    #[tokio::test]
    async fn reject_removes_the_entry() {
        let service = service().await;
        let s1 = ShopId::new("s1");
        let c1 = CustomerId::new("c1");

        service.request_connection(&customer(), &s1).await.unwrap();
        service
            .resolve_connection(&owner(), &s1, &c1, false)
            .await
            .unwrap();

        let memberships = service.list_memberships(&customer(), &c1).await.unwrap();
        assert!(memberships.is_empty());

        // A rejected customer may ask again.
        service.request_connection(&customer(), &s1).await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_request_is_rejected() {
        let service = service().await;
        let s1 = ShopId::new("s1");

        service.request_connection(&customer(), &s1).await.unwrap();
        let err = service
            .request_connection(&customer(), &s1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::AlreadyConnected { .. })
        ));
    }

    #[tokio::test]
    async fn online_shop_needs_no_connection() {
        let service = service().await;
        let err = service
            .request_connection(&customer(), &ShopId::new("web"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::ConnectionNotRequired(_))
        ));
    }

    #[tokio::test]
    async fn only_the_shop_owner_resolves() {
        let service = service().await;
        let s1 = ShopId::new("s1");
        let c1 = CustomerId::new("c1");
        service.request_connection(&customer(), &s1).await.unwrap();

        for actor in [
            Principal::staff("st", "s1"),
            Principal::owner("other", "s2"),
            customer(),
        ] {
            let err = service
                .resolve_connection(&actor, &s1, &c1, true)
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::Unauthorized));
        }
    }

    #[tokio::test]
    async fn resolving_without_pending_request_is_not_found() {
        let service = service().await;
        let s1 = ShopId::new("s1");
        let c1 = CustomerId::new("c1");
        service.request_connection(&customer(), &s1).await.unwrap();
        service
            .resolve_connection(&owner(), &s1, &c1, true)
            .await
            .unwrap();

        let err = service
            .resolve_connection(&owner(), &s1, &c1, true)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn memberships_are_private() {
        let service = service().await;
        let err = service
            .list_memberships(&Principal::customer("c2"), &CustomerId::new("c1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized));
    }
}

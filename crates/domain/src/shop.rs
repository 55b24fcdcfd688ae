//! Shops and the explicit scope shop-level operations run against.

use document_store::{DocumentStore, DocumentStoreExt, WriteOp};
use serde::{Deserialize, Serialize};

use crate::{
    Money, ShopId,
    collections::SHOPS,
    error::{DomainError, ValidationError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShopType {
    /// Sells to any customer.
    Online,
    /// Sells only to customers with an active connection.
    Physical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShopStatus {
    Active,
    #[default]
    Pending,
    Blocked,
}

/// A tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    #[serde(rename = "type")]
    pub shop_type: ShopType,
    pub owner_id: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub delivery_charge: Money,
    /// Tax rate in basis points (1/100 of a percent).
    #[serde(default)]
    pub tax_rate_bps: u32,
    #[serde(default)]
    pub status: ShopStatus,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Shop {
    pub fn is_active(&self) -> bool {
        self.status == ShopStatus::Active
    }

    pub fn is_physical(&self) -> bool {
        self.shop_type == ShopType::Physical
    }

    /// Returns the write that stores this shop.
    ///
    /// The id becomes a key of each customer's membership map, so it must be
    /// a single field-path segment: non-blank and without `.`.
    pub fn to_write_op(&self) -> Result<WriteOp, DomainError> {
        if self.id.is_blank() || self.id.as_str().contains('.') {
            return Err(ValidationError::InvalidIdentifier(self.id.to_string()).into());
        }
        Ok(WriteOp::set_serialized(SHOPS.key(self.id.clone()), self)?)
    }
}

/// The shop a query or mutation is evaluated against.
///
/// There is no implicit "current shop": every shop-level operation is handed
/// one of these explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShopScope(ShopId);

impl ShopScope {
    pub fn new(shop_id: impl Into<ShopId>) -> Self {
        Self(shop_id.into())
    }

    pub fn shop_id(&self) -> &ShopId {
        &self.0
    }
}

impl std::fmt::Display for ShopScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read access to shop records.
#[derive(Clone)]
pub struct ShopDirectory<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> ShopDirectory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads a shop, or None if it does not exist.
    pub async fn find(&self, shop_id: &ShopId) -> Result<Option<Shop>, DomainError> {
        Ok(self
            .store
            .get_decoded::<Shop>(&SHOPS.key(shop_id.clone()))
            .await?
            .map(|(shop, _)| shop))
    }

    /// Loads a shop, failing with NotFound if it does not exist.
    pub async fn get(&self, shop_id: &ShopId) -> Result<Shop, DomainError> {
        self.find(shop_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Shop", shop_id))
    }
}

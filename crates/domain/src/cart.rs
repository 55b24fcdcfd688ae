//! Customer carts.

use chrono::{DateTime, Utc};
use document_store::{
    DocumentQuery, DocumentStore, DocumentStoreExt, FieldUpdate, Precondition, WriteBatch, WriteOp,
};
use serde::{Deserialize, Serialize};

use crate::{
    CartItemId, CustomerId, Money, ProductId, ShopId,
    catalog::Catalog,
    collections::CART_ITEMS,
    error::{DomainError, ValidationError},
    identity::Principal,
};

/// One line of a customer's cart.
///
/// Prices are captured when the item is added and copied into the order at
/// checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub customer_id: CustomerId,
    pub shop_id: ShopId,
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Returns unit price times quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Request to put a product into the caller's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItem {
    pub shop_id: ShopId,
    pub product_id: ProductId,
    #[serde(default)]
    pub sku: Option<String>,
    pub quantity: u32,
}

/// Service for cart operations.
pub struct CartService<S: DocumentStore, C: Catalog> {
    store: S,
    catalog: C,
}

impl<S: DocumentStore, C: Catalog> CartService<S, C> {
    pub fn new(store: S, catalog: C) -> Self {
        Self { store, catalog }
    }

    /// Adds a product to the caller's cart, or increments the matching line.
    #[tracing::instrument(skip(self, actor), fields(customer = %actor.subject))]
    pub async fn add_item(
        &self,
        actor: &Principal,
        cmd: AddCartItem,
    ) -> Result<CartItem, DomainError> {
        let customer_id = actor.require_customer()?;
        if cmd.quantity == 0 {
            return Err(ValidationError::InvalidQuantity(cmd.quantity).into());
        }

        let quote = self
            .catalog
            .get_variant(&cmd.shop_id, &cmd.product_id, cmd.sku.as_deref())
            .await?
            .ok_or_else(|| ValidationError::UnknownProduct(cmd.product_id.to_string()))?;

        let existing = match self
            .store
            .query(
                DocumentQuery::new(CART_ITEMS)
                    .where_eq("customerId", customer_id.as_str())
                    .where_eq("shopId", cmd.shop_id.as_str())
                    .where_eq("productId", cmd.product_id.as_str())
                    .where_eq("sku", quote.sku.as_str())
                    .limit(1),
            )
            .await?
            .into_iter()
            .next()
        {
            Some(document) => Some((document.decode::<CartItem>()?, document)),
            None => None,
        };

        let requested = match &existing {
            Some((item, _)) => item
                .quantity
                .checked_add(cmd.quantity)
                .ok_or(ValidationError::InvalidQuantity(cmd.quantity))?,
            None => cmd.quantity,
        };
        if requested > quote.stock_quantity {
            return Err(ValidationError::InsufficientStock {
                product_id: cmd.product_id.to_string(),
                requested,
                available: quote.stock_quantity,
            }
            .into());
        }

        let (item, op) = match existing {
            Some((mut item, document)) => {
                item.quantity = requested;
                let op = WriteOp::update(
                    document.key,
                    vec![FieldUpdate::set("quantity", requested)],
                )
                .when(Precondition::Version(document.version));
                (item, op)
            }
            None => {
                let item = CartItem {
                    id: CartItemId::generate(),
                    customer_id,
                    shop_id: cmd.shop_id,
                    product_id: quote.product_id,
                    sku: quote.sku,
                    name: quote.name,
                    unit_price: quote.price,
                    quantity: requested,
                    image: quote.image,
                    added_at: Utc::now(),
                };
                let op = WriteOp::set_serialized(CART_ITEMS.key(item.id.clone()), &item)?
                    .when(Precondition::Missing);
                (item, op)
            }
        };

        self.store.commit(WriteBatch::new().with(op)).await?;
        tracing::debug!(item_id = %item.id, quantity = item.quantity, "cart item stored");
        Ok(item)
    }

    /// Removes one item from the caller's cart.
    #[tracing::instrument(skip(self, actor), fields(customer = %actor.subject))]
    pub async fn remove_item(
        &self,
        actor: &Principal,
        item_id: &CartItemId,
    ) -> Result<(), DomainError> {
        let customer_id = actor.require_customer()?;
        let key = CART_ITEMS.key(item_id.clone());

        let (item, document) = self
            .store
            .get_decoded::<CartItem>(&key)
            .await?
            .ok_or_else(|| DomainError::not_found("Cart item", item_id))?;

        // Someone else's item is reported as missing.
        if item.customer_id != customer_id {
            return Err(DomainError::not_found("Cart item", item_id));
        }

        self.store
            .commit(
                WriteBatch::new()
                    .with(WriteOp::delete(key).when(Precondition::Version(document.version))),
            )
            .await?;
        Ok(())
    }

    /// Lists the caller's cart, optionally restricted to one shop.
    #[tracing::instrument(skip(self, actor), fields(customer = %actor.subject))]
    pub async fn list(
        &self,
        actor: &Principal,
        shop_id: Option<&ShopId>,
    ) -> Result<Vec<CartItem>, DomainError> {
        let customer_id = actor.require_customer()?;
        let mut query =
            DocumentQuery::new(CART_ITEMS).where_eq("customerId", customer_id.as_str());
        if let Some(shop_id) = shop_id {
            query = query.where_eq("shopId", shop_id.as_str());
        }

        Ok(self.store.query_decoded(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Product, StoreCatalog, Variant};
    use document_store::InMemoryDocumentStore;

    async fn service() -> CartService<InMemoryDocumentStore, StoreCatalog<InMemoryDocumentStore>>
    {
        let store = InMemoryDocumentStore::new();
        let product = Product {
            id: ProductId::new("p1"),
            shop_id: ShopId::new("s1"),
            name: "Mug".to_string(),
            category: "kitchen".to_string(),
            image: Some("mug.png".to_string()),
            variants: vec![Variant {
                sku: "MUG".to_string(),
                price: Money::from_cents(1000),
                stock_quantity: 5,
            }],
        };
        store.commit_op(product.to_write_op().unwrap()).await.unwrap();
        CartService::new(store.clone(), StoreCatalog::new(store))
    }

    fn add(quantity: u32) -> AddCartItem {
        AddCartItem {
            shop_id: ShopId::new("s1"),
            product_id: ProductId::new("p1"),
            sku: None,
            quantity,
        }
    }

    #[tokio::test]
    async fn add_copies_price_from_catalog() {
        let service = service().await;
        let item = service
            .add_item(&Principal::customer("c1"), add(2))
            .await
            .unwrap();

        assert_eq!(item.unit_price, Money::from_cents(1000));
        assert_eq!(item.line_total(), Money::from_cents(2000));
        assert_eq!(item.sku, "MUG");
    }

    #[tokio::test]
    async fn adding_same_product_increments_quantity() {
        let service = service().await;
        let customer = Principal::customer("c1");

        let first = service.add_item(&customer, add(1)).await.unwrap();
        let second = service.add_item(&customer, add(2)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 3);
        assert_eq!(service.list(&customer, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_zero_quantity_and_overselling() {
        let service = service().await;
        let customer = Principal::customer("c1");

        let err = service.add_item(&customer, add(0)).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::InvalidQuantity(0))
        ));

        let err = service.add_item(&customer, add(6)).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::InsufficientStock { available: 5, .. })
        ));
    }

    #[tokio::test]
    async fn increment_past_u32_range_is_rejected() {
        let service = service().await;
        let customer = Principal::customer("c1");
        let item = service.add_item(&customer, add(1)).await.unwrap();

        let err = service
            .add_item(&customer, add(u32::MAX))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::InvalidQuantity(u32::MAX))
        ));

        let items = service.list(&customer, None).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, item.id);
        assert_eq!(items[0].quantity, 1);
    }

    #[tokio::test]
    async fn unknown_product_is_rejected() {
        let service = service().await;
        let mut cmd = add(1);
        cmd.product_id = ProductId::new("ghost");

        let err = service
            .add_item(&Principal::customer("c1"), cmd)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::UnknownProduct(_))
        ));
    }

    #[tokio::test]
    async fn remove_only_own_items() {
        let service = service().await;
        let owner = Principal::customer("c1");
        let item = service.add_item(&owner, add(1)).await.unwrap();

        let err = service
            .remove_item(&Principal::customer("c2"), &item.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        service.remove_item(&owner, &item.id).await.unwrap();
        assert!(service.list(&owner, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn staff_have_no_cart() {
        let service = service().await;
        let err = service
            .add_item(&Principal::staff("u1", "s1"), add(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized));
    }
}

//! Read-only product catalog.

use async_trait::async_trait;
use document_store::{DocumentStore, DocumentStoreExt, WriteOp};
use serde::{Deserialize, Serialize};

use crate::{Money, ProductId, ShopId, collections::PRODUCTS, error::DomainError};

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub sku: String,
    pub price: Money,
    pub stock_quantity: u32,
}

/// A product listed by one shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub shop_id: ShopId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    pub variants: Vec<Variant>,
}

impl Product {
    /// Looks up a variant by sku, or the first variant when no sku is given.
    pub fn variant(&self, sku: Option<&str>) -> Option<&Variant> {
        match sku {
            Some(sku) => self.variants.iter().find(|v| v.sku == sku),
            None => self.variants.first(),
        }
    }

    /// Returns the write that stores this product.
    pub fn to_write_op(&self) -> Result<WriteOp, serde_json::Error> {
        WriteOp::set_serialized(PRODUCTS.key(self.id.clone()), self)
    }
}

/// Price and availability of one variant, as seen at lookup time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantQuote {
    pub product_id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub sku: String,
    pub price: Money,
    pub stock_quantity: u32,
}

/// Catalog lookups consumed by the cart and checkout workflows.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Returns the variant of a product listed by `shop_id`, or None if the
    /// product, the variant, or the listing shop does not match.
    async fn get_variant(
        &self,
        shop_id: &ShopId,
        product_id: &ProductId,
        sku: Option<&str>,
    ) -> Result<Option<VariantQuote>, DomainError>;
}

/// Catalog reading the `products` collection.
#[derive(Clone)]
pub struct StoreCatalog<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> StoreCatalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: DocumentStore> Catalog for StoreCatalog<S> {
    #[tracing::instrument(skip(self))]
    async fn get_variant(
        &self,
        shop_id: &ShopId,
        product_id: &ProductId,
        sku: Option<&str>,
    ) -> Result<Option<VariantQuote>, DomainError> {
        let Some((product, _)) = self
            .store
            .get_decoded::<Product>(&PRODUCTS.key(product_id.clone()))
            .await?
        else {
            return Ok(None);
        };

        if &product.shop_id != shop_id {
            return Ok(None);
        }

        Ok(product.variant(sku).map(|variant| VariantQuote {
            product_id: product.id.clone(),
            name: product.name.clone(),
            image: product.image.clone(),
            sku: variant.sku.clone(),
            price: variant.price,
            stock_quantity: variant.stock_quantity,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document_store::InMemoryDocumentStore;

    fn tea() -> Product {
        Product {
            id: ProductId::new("p1"),
            shop_id: ShopId::new("s1"),
            name: "Green tea".to_string(),
            category: "drinks".to_string(),
            image: None,
            variants: vec![
                Variant {
                    sku: "TEA-S".to_string(),
                    price: Money::from_cents(400),
                    stock_quantity: 10,
                },
                Variant {
                    sku: "TEA-L".to_string(),
                    price: Money::from_cents(650),
                    stock_quantity: 0,
                },
            ],
        }
    }

    async fn catalog() -> StoreCatalog<InMemoryDocumentStore> {
        let store = InMemoryDocumentStore::new();
        store.commit_op(tea().to_write_op().unwrap()).await.unwrap();
        StoreCatalog::new(store)
    }

    #[tokio::test]
    async fn finds_variant_by_sku() {
        let catalog = catalog().await;
        let quote = catalog
            .get_variant(&ShopId::new("s1"), &ProductId::new("p1"), Some("TEA-L"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(quote.price, Money::from_cents(650));
        assert_eq!(quote.stock_quantity, 0);
    }

    #[tokio::test]
    async fn defaults_to_first_variant() {
        let catalog = catalog().await;
        let quote = catalog
            .get_variant(&ShopId::new("s1"), &ProductId::new("p1"), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(quote.sku, "TEA-S");
    }

    #[tokio::test]
    async fn product_of_another_shop_is_absent() {
        let catalog = catalog().await;
        let quote = catalog
            .get_variant(&ShopId::new("s2"), &ProductId::new("p1"), None)
            .await
            .unwrap();
        assert!(quote.is_none());

        let missing = catalog
            .get_variant(&ShopId::new("s1"), &ProductId::new("nope"), None)
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}

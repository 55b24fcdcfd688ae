//! Names of the collections the domain persists into.

use document_store::Collection;

pub const CART_ITEMS: Collection = Collection::new("cart_items");
pub const ORDERS: Collection = Collection::new("orders");
pub const SHOPS: Collection = Collection::new("shops");
pub const CUSTOMERS: Collection = Collection::new("customers");
pub const BANNERS: Collection = Collection::new("banners");
pub const PRODUCTS: Collection = Collection::new("products");

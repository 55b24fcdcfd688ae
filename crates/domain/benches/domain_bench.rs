use criterion::{Criterion, criterion_group, criterion_main};
use document_store::{InMemoryDocumentStore, WriteBatch, store::DocumentStore};
use domain::{
    AddCartItem, BannerDraft, BannerService, CartService, CheckoutService, CustomerId,
    DeliveryAddress, Money, OrderAdjustments, OrderService, PaymentMethod, PlaceOrder, Principal,
    Product, ProductId, Shop, ShopId, ShopScope, ShopStatus, ShopType, StoreCatalog, Variant,
};

async fn seeded_store() -> InMemoryDocumentStore {
    let store = InMemoryDocumentStore::new();
    let shop = Shop {
        id: ShopId::new("s1"),
        name: "Bench shop".to_string(),
        shop_type: ShopType::Online,
        owner_id: "owner".to_string(),
        currency: "USD".to_string(),
        delivery_charge: Money::from_cents(150),
        tax_rate_bps: 0,
        status: ShopStatus::Active,
    };
    let mut batch = WriteBatch::new().with(shop.to_write_op().unwrap());
    for i in 0..5 {
        let product = Product {
            id: ProductId::new(format!("p{i}")),
            shop_id: ShopId::new("s1"),
            name: format!("Product {i}"),
            category: "bench".to_string(),
            image: None,
            variants: vec![Variant {
                sku: format!("SKU-{i}"),
                price: Money::from_cents(1000),
                stock_quantity: u32::MAX,
            }],
        };
        batch.push(product.to_write_op().unwrap());
    }
    store.commit(batch).await.unwrap();
    store
}

fn bench_checkout_five_items(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = rt.block_on(seeded_store());
    let cart = CartService::new(store.clone(), StoreCatalog::new(store.clone()));
    let checkout = CheckoutService::new(store.clone(), StoreCatalog::new(store.clone()));
    let customer = Principal::customer("c1");

    c.bench_function("domain/checkout_five_items", |b| {
        b.iter(|| {
            rt.block_on(async {
                for i in 0..5 {
                    cart.add_item(
                        &customer,
                        AddCartItem {
                            shop_id: ShopId::new("s1"),
                            product_id: ProductId::new(format!("p{i}")),
                            sku: None,
                            quantity: 1,
                        },
                    )
                    .await
                    .unwrap();
                }
                let items = cart.list(&customer, None).await.unwrap();
                checkout
                    .place_order(
                        &customer,
                        PlaceOrder {
                            customer_id: CustomerId::new("c1"),
                            shop_id: ShopId::new("s1"),
                            cart: items,
                            payment_method: PaymentMethod::Card,
                            delivery_address: DeliveryAddress::default(),
                            adjustments: OrderAdjustments::default(),
                        },
                    )
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_payment_toggle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = rt.block_on(seeded_store());
    let cart = CartService::new(store.clone(), StoreCatalog::new(store.clone()));
    let checkout = CheckoutService::new(store.clone(), StoreCatalog::new(store.clone()));
    let orders = OrderService::new(store.clone());
    let customer = Principal::customer("c1");
    let owner = Principal::owner("owner", "s1");
    let scope = ShopScope::new("s1");

    let order = rt.block_on(async {
        cart.add_item(
            &customer,
            AddCartItem {
                shop_id: ShopId::new("s1"),
                product_id: ProductId::new("p0"),
                sku: None,
                quantity: 1,
            },
        )
        .await
        .unwrap();
        checkout
            .place_order(
                &customer,
                PlaceOrder {
                    customer_id: CustomerId::new("c1"),
                    shop_id: ShopId::new("s1"),
                    cart: cart.list(&customer, None).await.unwrap(),
                    payment_method: PaymentMethod::Card,
                    delivery_address: DeliveryAddress::default(),
                    adjustments: OrderAdjustments::default(),
                },
            )
            .await
            .unwrap()
    });

    let mut paid = false;
    c.bench_function("domain/payment_toggle", |b| {
        b.iter(|| {
            paid = !paid;
            let target = if paid { "Paid" } else { "Unpaid" };
            rt.block_on(async {
                orders
                    .set_payment_status(&owner, &scope, &order.id, target)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_banner_activation(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let banners = BannerService::new(InMemoryDocumentStore::new());
    let admin = Principal::admin("root");

    let mut next = 0;
    c.bench_function("domain/banner_activation_of_20", |b| {
        b.iter(|| {
            next = (next + 1) % 20;
            let draft = BannerDraft {
                id: Some(format!("b{next}").into()),
                title: "Bench".to_string(),
                ..Default::default()
            };
            rt.block_on(async {
                banners.upsert_banner(&admin, draft, true).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_checkout_five_items,
    bench_payment_toggle,
    bench_banner_activation
);
criterion_main!(benches);

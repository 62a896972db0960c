//! Guest-to-remote cart migration on login.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use rust_decimal::dec;
use storefront_core::{CartItem, Product, ProductId};
use storefront_client::{Credentials, Storage, StorageExt, storage::keys};
use storefront_integration_tests::{Harness, cart_row_json, product_json, user_json};

fn product(id: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        base_price: dec!(10.00),
        discount_price: None,
        description: None,
        category: None,
        stock: None,
        is_available: true,
    }
}

async fn login(harness: &Harness) {
    Mock::given(method("POST"))
        .and(path("/users/token/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "access": "a1", "refresh": "r1" })),
        )
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/user/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([user_json(3, "asha@example.com")])),
        )
        .mount(&harness.server)
        .await;

    harness
        .shop
        .auth
        .login(&Credentials::new("asha@example.com", "hunter2!"))
        .await
        .expect("login");
}

#[tokio::test]
async fn login_merges_every_guest_line_then_discards_the_guest_copy() {
    let harness = Harness::new().await;

    harness
        .shop
        .cart
        .add_to_cart(product(7).into(), 2, None)
        .await
        .expect("guest add");
    harness
        .shop
        .cart
        .add_to_cart(product(8).into(), 1, None)
        .await
        .expect("guest add");

    login(&harness).await;

    Mock::given(method("POST"))
        .and(path("/cart/cart/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(2)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cart/cart/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            cart_row_json(21, product_json(7, "10.00"), 2),
            cart_row_json(22, product_json(8, "10.00"), 1),
        ])))
        .mount(&harness.server)
        .await;

    harness.shop.cart.merge_guest_cart().await.expect("merge");

    assert!(harness.storage.get(keys::GUEST_CART).is_none());
    let items = harness.shop.cart.items();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|line| line.id.is_some()));

    // A second merge finds no guest cart and issues no further adds; the
    // POST mock's expect(2) is verified on shutdown.
    harness.shop.cart.merge_guest_cart().await.expect("re-merge");
}

#[tokio::test]
async fn partial_merge_failure_keeps_the_unmerged_lines_for_retry() {
    let harness = Harness::new().await;

    harness
        .shop
        .cart
        .add_to_cart(product(7).into(), 2, None)
        .await
        .expect("guest add");
    harness
        .shop
        .cart
        .add_to_cart(product(8).into(), 1, None)
        .await
        .expect("guest add");

    login(&harness).await;

    Mock::given(method("POST"))
        .and(path("/cart/cart/"))
        .and(body_partial_json(json!({ "product_id": 7 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cart/cart/"))
        .and(body_partial_json(json!({ "product_id": 8 })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "detail": "Out of stock" })))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cart/cart/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cart_row_json(
            21,
            product_json(7, "10.00"),
            2
        )])))
        .mount(&harness.server)
        .await;

    harness.shop.cart.merge_guest_cart().await.expect("merge");

    // Only the rejected line survives in the guest copy.
    let remaining: Vec<CartItem> = harness
        .storage
        .get_json(keys::GUEST_CART)
        .expect("guest cart retained");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].product.id(), ProductId::new(8));
}

#[tokio::test]
async fn merging_an_empty_guest_cart_touches_nothing() {
    let harness = Harness::new().await;
    harness.storage.set(keys::GUEST_CART, "[]");

    login(&harness).await;

    // No cart mocks mounted: any cart request would 404 and fail the merge.
    harness.shop.cart.merge_guest_cart().await.expect("merge");
    assert!(harness.storage.get(keys::GUEST_CART).is_none());
}

#[tokio::test]
async fn authenticated_zero_quantity_update_is_rejected_before_any_request() {
    let harness = Harness::new().await;
    login(&harness).await;

    // Populate the remote cart signal.
    Mock::given(method("GET"))
        .and(path("/cart/cart/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cart_row_json(
            5,
            product_json(7, "10.00"),
            2
        )])))
        .mount(&harness.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/cart/cart/5/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.server)
        .await;

    harness.shop.cart.refresh().await.expect("cart refresh");
    let line = harness.shop.cart.items().remove(0);

    let result = harness.shop.cart.update_item(&line, 0).await;
    assert!(result.is_err());
    assert_eq!(harness.shop.cart.items()[0].quantity, 2);
}

#[tokio::test]
async fn session_watcher_restores_the_guest_cart_on_logout() {
    let harness = Harness::new().await;

    harness
        .shop
        .cart
        .add_to_cart(product(7).into(), 2, None)
        .await
        .expect("guest add");

    let watcher = harness.shop.spawn_session_watcher();

    login(&harness).await;

    Mock::given(method("POST"))
        .and(path("/cart/cart/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cart/cart/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cart_row_json(
            21,
            product_json(7, "10.00"),
            2
        )])))
        .mount(&harness.server)
        .await;

    // Wait for the watcher to react to the login transition.
    let mut items = harness.shop.cart.items_signal().subscribe();
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        loop {
            if items.borrow_and_update().iter().any(|line| line.id.is_some()) {
                break;
            }
            items.changed().await.expect("signal alive");
        }
    })
    .await
    .expect("merge within deadline");

    harness.shop.auth.logout();

    // The guest copy was consumed by the merge, so logout lands on an
    // empty cart.
    let mut items = harness.shop.cart.items_signal().subscribe();
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        loop {
            if items.borrow_and_update().is_empty() {
                break;
            }
            items.changed().await.expect("signal alive");
        }
    })
    .await
    .expect("guest cart restored within deadline");

    watcher.abort();
}

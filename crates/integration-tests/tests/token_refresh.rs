//! 401 handling: coordinated refresh, replay, and session teardown.

use reqwest::Method;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use storefront_client::{ApiError, AuthError, Storage};
use storefront_integration_tests::{Harness, cart_row_json, product_json, user_json};

/// Mounts the refresh endpoint: `r1` for a fresh access token, anything
/// else rejected.
async fn mount_refresh(harness: &Harness, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/users/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "fresh" })))
        .expect(expected_calls)
        .mount(&harness.server)
        .await;
}

#[tokio::test]
async fn expired_token_is_refreshed_and_the_request_replayed() {
    let harness = Harness::new_authenticated("stale", "r1").await;
    mount_refresh(&harness, 1).await;

    Mock::given(method("GET"))
        .and(path("/users/user/"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired" })))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/user/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([user_json(3, "asha@example.com")])),
        )
        .mount(&harness.server)
        .await;

    let profile = harness.shop.auth.profile().await.expect("replayed profile");
    assert_eq!(profile.email, "asha@example.com");

    // The new access token is persisted; the refresh token survives when
    // the backend does not rotate it.
    assert_eq!(harness.stored_access_token().as_deref(), Some("fresh"));
    assert_eq!(harness.stored_refresh_token().as_deref(), Some("r1"));
}

#[tokio::test]
async fn concurrent_401s_share_a_single_refresh() {
    let harness = Harness::new_authenticated("stale", "r1").await;
    mount_refresh(&harness, 1).await;

    for endpoint in ["/users/user/", "/cart/cart/", "/catalog/wishlist/"] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .and(header("authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired" })))
            .mount(&harness.server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/users/user/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([user_json(3, "asha@example.com")])),
        )
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cart/cart/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catalog/wishlist/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&harness.server)
        .await;

    let (profile, cart, wishlist) = tokio::join!(
        harness.shop.auth.profile(),
        harness.shop.cart.refresh(),
        harness.shop.wishlist.refresh(),
    );

    // All three callers replay against the shared refreshed token; the
    // refresh endpoint's expect(1) is verified on server shutdown.
    profile.expect("profile replayed");
    cart.expect("cart replayed");
    wishlist.expect("wishlist replayed");
    assert!(harness.shop.auth.is_authenticated());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_401s_all_fail_together_when_the_refresh_fails() {
    let harness = Harness::new_authenticated("stale", "r1").await;

    // One refresh attempt total, even with callers racing on separate
    // workers; expect(1) is verified on server shutdown.
    Mock::given(method("POST"))
        .and(path("/users/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "token blacklisted" })),
        )
        .expect(1)
        .mount(&harness.server)
        .await;
    for endpoint in ["/users/user/", "/cart/cart/", "/catalog/wishlist/"] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired" })))
            .mount(&harness.server)
            .await;
    }

    let auth = harness.shop.auth.clone();
    let cart = harness.shop.cart.clone();
    let wishlist = harness.shop.wishlist.clone();
    let (profile, cart_result, wishlist_result) = tokio::join!(
        tokio::spawn(async move { auth.profile().await }),
        tokio::spawn(async move { cart.refresh().await }),
        tokio::spawn(async move { wishlist.refresh().await }),
    );

    // The refresh outcome is shared: every caller fails with the session
    // error, none replays.
    let profile = profile.expect("task");
    let cart_result = cart_result.expect("task");
    let wishlist_result = wishlist_result.expect("task");
    assert!(matches!(profile, Err(ApiError::Auth(_))), "{profile:?}");
    assert!(matches!(cart_result, Err(ApiError::Auth(_))), "{cart_result:?}");
    assert!(
        matches!(wishlist_result, Err(ApiError::Auth(_))),
        "{wishlist_result:?}"
    );

    assert!(!harness.shop.auth.is_authenticated());
    assert!(harness.stored_access_token().is_none());
    assert!(harness.shop.session().redirect_signal().get().is_some());
}

#[tokio::test]
async fn failed_refresh_drops_the_session_and_publishes_a_redirect() {
    let harness = Harness::new_authenticated("stale", "r1").await;

    Mock::given(method("GET"))
        .and(path("/users/user/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired" })))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "token blacklisted" })),
        )
        .mount(&harness.server)
        .await;

    let result = harness.shop.auth.profile().await;
    match result {
        Err(ApiError::Auth(AuthError::RefreshFailed(message))) => {
            assert_eq!(message, "token blacklisted");
        }
        other => panic!("expected RefreshFailed, got {other:?}"),
    }

    assert!(!harness.shop.auth.is_authenticated());
    assert!(harness.stored_access_token().is_none());
    let redirect = harness
        .shop
        .session()
        .redirect_signal()
        .get()
        .expect("redirect published");
    assert_eq!(redirect.return_to.as_deref(), Some("/users/user/"));
}

#[tokio::test]
async fn missing_refresh_token_fails_without_calling_the_refresh_endpoint() {
    let harness = Harness::new().await;
    harness.storage.set("auth_token", "stale");
    Mock::given(method("POST"))
        .and(path("/users/token/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/user/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired" })))
        .mount(&harness.server)
        .await;

    let result = harness.shop.auth.profile().await;
    assert!(matches!(
        result,
        Err(ApiError::Auth(AuthError::NoRefreshToken))
    ));
    assert!(!harness.shop.auth.is_authenticated());
}

#[tokio::test]
async fn public_endpoint_401_drops_the_session_without_a_refresh() {
    let harness = Harness::new_authenticated("a1", "r1").await;

    Mock::given(method("POST"))
        .and(path("/users/token/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catalog/products/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "nope" })))
        .mount(&harness.server)
        .await;

    let result = harness.shop.catalog.products().await;
    assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    assert!(!harness.shop.auth.is_authenticated());
    assert!(harness.shop.session().redirect_signal().get().is_some());
}

#[tokio::test]
async fn login_endpoint_401_publishes_no_redirect() {
    let harness = Harness::new().await;

    Mock::given(method("POST"))
        .and(path("/users/token/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "bad password" })))
        .mount(&harness.server)
        .await;

    let result = harness
        .shop
        .api()
        .send(Method::POST, "/users/token/", Some(json!({})))
        .await;
    assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    assert!(harness.shop.session().redirect_signal().get().is_none());
}

#[tokio::test]
async fn public_requests_carry_no_authorization_header() {
    let harness = Harness::new_authenticated("a1", "r1").await;

    // Matches only when the request has no authorization header at all.
    Mock::given(method("GET"))
        .and(path("/catalog/products/7/"))
        .and(wiremock::matchers::header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catalog/products/7/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_json(7, "9.50")))
        .mount(&harness.server)
        .await;

    let product = harness
        .shop
        .catalog
        .product(storefront_core::ProductId::new(7))
        .await
        .expect("product");
    assert_eq!(i64::from(product.id), 7);
}

#[tokio::test]
async fn protected_requests_attach_the_stored_token() {
    let harness = Harness::new_authenticated("a1", "r1").await;

    Mock::given(method("GET"))
        .and(path("/cart/cart/"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cart_row_json(
            11,
            product_json(7, "9.50"),
            2
        )])))
        .expect(1)
        .mount(&harness.server)
        .await;

    harness.shop.cart.refresh().await.expect("cart refresh");
    let items = harness.shop.cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
}

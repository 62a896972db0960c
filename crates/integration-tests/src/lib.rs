//! Integration tests for the storefront client SDK.
//!
//! Every test runs the full SDK against a [`wiremock`] mock of the
//! storefront backend, so the interceptor, the auth session, and the cart
//! are exercised end to end without a live server.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth_session` - Login, logout, and identity resolution
//! - `token_refresh` - 401 handling, refresh coordination, replay
//! - `cart_merge` - Guest-to-remote cart migration on login
//! - `checkout_flow` - Address capture and order placement
//! - `catalog_wishlist` - Cached reads and optimistic toggles

use std::sync::Arc;

use serde_json::{Value, json};
use url::Url;
use wiremock::MockServer;

use storefront_client::{ClientConfig, MemoryStorage, Storage, Storefront, storage::keys};

/// A wired-up SDK pointed at a fresh mock backend.
pub struct Harness {
    pub server: MockServer,
    pub shop: Storefront,
    pub storage: Arc<MemoryStorage>,
}

/// Install a test subscriber honoring `RUST_LOG`. Safe to call from every
/// test; only the first call wins.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl Harness {
    /// Start a mock backend and build the SDK against it, anonymous.
    pub async fn new() -> Self {
        init_tracing();
        let server = MockServer::start().await;
        let storage = Arc::new(MemoryStorage::default());
        let dyn_storage: Arc<dyn Storage> = Arc::<MemoryStorage>::clone(&storage);

        let base = Url::parse(&server.uri()).expect("mock server uri");
        let shop =
            Storefront::new(ClientConfig::new(base), dyn_storage).expect("build storefront");

        Self {
            server,
            shop,
            storage,
        }
    }

    /// Like [`Self::new`], but with a token set already in storage, as if
    /// a previous session had logged in.
    pub async fn new_authenticated(access: &str, refresh: &str) -> Self {
        init_tracing();
        let server = MockServer::start().await;
        let storage = Arc::new(MemoryStorage::default());
        storage.set(keys::ACCESS_TOKEN, access);
        storage.set(keys::REFRESH_TOKEN, refresh);
        storage.set(keys::TOKEN_PREFIX, "Bearer");
        let dyn_storage: Arc<dyn Storage> = Arc::<MemoryStorage>::clone(&storage);

        let base = Url::parse(&server.uri()).expect("mock server uri");
        let shop =
            Storefront::new(ClientConfig::new(base), dyn_storage).expect("build storefront");

        Self {
            server,
            shop,
            storage,
        }
    }

    /// The access token currently in storage, if any.
    pub fn stored_access_token(&self) -> Option<String> {
        self.storage.get(keys::ACCESS_TOKEN)
    }

    /// The refresh token currently in storage, if any.
    pub fn stored_refresh_token(&self) -> Option<String> {
        self.storage.get(keys::REFRESH_TOKEN)
    }
}

/// A minimal profile record as returned by the profile endpoint.
pub fn user_json(id: i64, email: &str) -> Value {
    json!({ "id": id, "name": format!("User {id}"), "email": email })
}

/// A minimal product record; DRF serializes decimals as strings.
pub fn product_json(id: i64, base_price: &str) -> Value {
    json!({ "id": id, "name": format!("Product {id}"), "base_price": base_price })
}

/// A remote cart row embedding its product snapshot.
pub fn cart_row_json(row_id: i64, product: Value, quantity: u32) -> Value {
    json!({ "id": row_id, "product": product, "quantity": quantity })
}

//! Headless storefront client SDK.
//!
//! This crate owns the storefront's client-side session/cart subsystem:
//! token persistence and refresh, a request interceptor with coordinated
//! 401 refresh-and-replay, a guest/authenticated cart with one-time merge
//! on login, checkout orchestration, and thin typed services for the
//! catalog, wishlist, orders, and contact endpoints.
//!
//! The SDK is UI-agnostic. State is exposed through [`signal::Signal`]
//! containers the host subscribes to, and "redirect to login" is a
//! published navigation event rather than an actual navigation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use storefront_client::{ClientConfig, Credentials, MemoryStorage, Storefront};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let shop = Storefront::new(config, Arc::new(MemoryStorage::default()))?;
//!
//! shop.auth
//!     .login(&Credentials::new("user@example.com", "hunter2!"))
//!     .await?;
//! let products = shop.catalog.products().await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod contact;
pub mod error;
pub mod http;
pub mod orders;
pub mod signal;
pub mod storage;
pub mod wishlist;

use std::sync::Arc;

pub use auth::{
    AuthError, AuthService, Credentials, LoginRedirect, ProfileUpdate, Session, Token, TokenPrefix,
};
pub use cart::CartManager;
pub use catalog::CatalogService;
pub use checkout::{CheckoutError, CheckoutFlow};
pub use config::{ClientConfig, ConfigError};
pub use contact::{ContactForm, ContactMessage, ContactService};
pub use error::ApiError;
pub use http::ApiClient;
pub use orders::OrdersService;
pub use signal::Signal;
pub use storage::{FileStorage, MemoryStorage, Storage, StorageExt};
pub use wishlist::{WishlistEntry, WishlistService};

/// Wired-up client with every service sharing one HTTP client, session,
/// and storage backend.
///
/// Mirrors the app-wide singletons of a browser storefront: construct one
/// per process and clone the services out of it as needed.
pub struct Storefront {
    api: ApiClient,
    pub auth: AuthService,
    pub cart: CartManager,
    pub checkout: CheckoutFlow,
    pub catalog: CatalogService,
    pub wishlist: WishlistService,
    pub orders: OrdersService,
    pub contact: ContactService,
}

impl Storefront {
    /// Assemble the SDK against the given backend and storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: ClientConfig, storage: Arc<dyn Storage>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let session = Session::new(&config, client.clone(), Arc::clone(&storage));
        let api = ApiClient::new(config, client, session);

        let auth = AuthService::new(api.clone());
        let cart = CartManager::new(api.clone(), Arc::clone(&storage));
        let orders = OrdersService::new(api.clone());
        let checkout = CheckoutFlow::new(cart.clone(), orders.clone(), Arc::clone(&storage));
        let catalog = CatalogService::new(api.clone());
        let wishlist = WishlistService::new(api.clone());
        let contact = ContactService::new(api.clone());

        Ok(Self {
            api,
            auth,
            cart,
            checkout,
            catalog,
            wishlist,
            orders,
            contact,
        })
    }

    /// The shared auth session.
    #[must_use]
    pub fn session(&self) -> &Session {
        self.api.session()
    }

    /// The shared intercepted API client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Spawn the background task that reacts to login/logout transitions:
    /// merge + reload the cart on login, restore the guest cart on logout.
    pub fn spawn_session_watcher(&self) -> tokio::task::JoinHandle<()> {
        self.cart.spawn_session_watcher()
    }
}

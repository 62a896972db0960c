//! Cart state across the guest/authenticated boundary.
//!
//! Anonymous visitors get a purely local cart persisted under the guest
//! key; authenticated users operate on the remote cart through the
//! interceptor. On login the guest cart merges into the remote one
//! exactly once, then the guest copy is discarded.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use storefront_core::{CartItem, Listing, ProductId, ProductRef, UserId, VariantId};

use crate::auth::AuthError;
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::signal::Signal;
use crate::storage::{Storage, StorageExt, keys};

#[derive(Serialize)]
struct AddItemRequest {
    product_id: ProductId,
    quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    variant_id: Option<VariantId>,
}

/// Shared cart state. Cheap to clone.
#[derive(Clone)]
pub struct CartManager {
    inner: Arc<CartInner>,
}

struct CartInner {
    api: ApiClient,
    storage: Arc<dyn Storage>,
    items: Signal<Vec<CartItem>>,
}

impl CartManager {
    /// Create the manager, restoring the guest cart from storage when the
    /// session starts out anonymous. An authenticated session starts from
    /// the last persisted cart snapshot until the first [`Self::refresh`]
    /// replaces it with the remote cart.
    pub(crate) fn new(api: ApiClient, storage: Arc<dyn Storage>) -> Self {
        let initial = if api.session().is_authenticated() {
            storage.get_json(keys::CART_SNAPSHOT).unwrap_or_default()
        } else {
            storage.get_json(keys::GUEST_CART).unwrap_or_default()
        };

        Self {
            inner: Arc::new(CartInner {
                api,
                storage,
                items: Signal::new(initial),
            }),
        }
    }

    /// Current cart lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.inner.items.get()
    }

    /// Cart signal for subscribers.
    #[must_use]
    pub fn items_signal(&self) -> Signal<Vec<CartItem>> {
        self.inner.items.clone()
    }

    fn is_authenticated(&self) -> bool {
        self.inner.api.session().is_authenticated()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a product to the cart, or bump the quantity of the matching
    /// (product, variant) line.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for a zero quantity; otherwise transport
    /// and backend errors from the remote cart when authenticated. The
    /// guest path cannot fail past validation.
    #[instrument(skip(self, product), fields(product = %product.id(), quantity))]
    pub async fn add_to_cart(
        &self,
        product: ProductRef,
        quantity: u32,
        variant: Option<VariantId>,
    ) -> Result<(), ApiError> {
        if quantity == 0 {
            return Err(ApiError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }

        if !self.is_authenticated() {
            let mut items = self.items();
            if let Some(line) = items
                .iter_mut()
                .find(|line| line.matches(product.id(), variant))
            {
                line.quantity += quantity;
            } else {
                items.push(CartItem {
                    id: None,
                    product,
                    variant_id: variant,
                    quantity,
                });
            }
            self.save_guest(items);
            return Ok(());
        }

        let user = self.resolve_user().await?;
        debug!(user = %user, "adding line to remote cart");
        self.inner
            .api
            .post_json_unit(
                "/cart/cart/",
                &AddItemRequest {
                    product_id: product.id(),
                    quantity,
                    variant_id: variant,
                },
            )
            .await?;
        self.refresh_logged().await;
        Ok(())
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for a quantity below 1 (no network call
    /// is made); otherwise remote cart errors when authenticated.
    pub async fn update_item(&self, item: &CartItem, quantity: u32) -> Result<(), ApiError> {
        if quantity < 1 {
            return Err(ApiError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }

        if !self.is_authenticated() {
            let mut items = self.items();
            if let Some(line) = items.iter_mut().find(|line| line.key() == item.key()) {
                line.quantity = quantity;
            }
            self.save_guest(items);
            return Ok(());
        }

        let id = item.id.ok_or_else(|| {
            ApiError::Validation("cart line has no remote id".to_string())
        })?;
        self.inner
            .api
            .patch_json_unit(
                &format!("/cart/cart/{id}/"),
                &serde_json::json!({ "quantity": quantity }),
            )
            .await?;
        self.refresh_logged().await;
        Ok(())
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Remote cart errors when authenticated; the guest path is
    /// infallible.
    pub async fn remove_item(&self, item: &CartItem) -> Result<(), ApiError> {
        if !self.is_authenticated() {
            let mut items = self.items();
            items.retain(|line| line.key() != item.key());
            self.save_guest(items);
            return Ok(());
        }

        let id = item.id.ok_or_else(|| {
            ApiError::Validation("cart line has no remote id".to_string())
        })?;
        self.inner.api.delete(&format!("/cart/cart/{id}/")).await?;
        self.refresh_logged().await;
        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Remote cart errors when authenticated.
    pub async fn clear(&self) -> Result<(), ApiError> {
        if !self.is_authenticated() {
            self.save_guest(Vec::new());
            return Ok(());
        }

        self.inner.api.delete("/cart/clear/").await?;
        self.refresh_logged().await;
        Ok(())
    }

    // =========================================================================
    // Synchronisation
    // =========================================================================

    /// Re-fetch the remote cart and publish it.
    ///
    /// # Errors
    ///
    /// Transport and backend errors from the cart endpoint.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let listing: Listing<CartItem> = self.inner.api.get_json("/cart/cart/").await?;
        self.publish(listing.into_vec());
        Ok(())
    }

    /// Merge any persisted guest cart into the remote cart.
    ///
    /// Each guest line becomes one add request; the requests run in
    /// parallel. The guest copy is deleted only when every line made it
    /// across, so a partial failure leaves the remainder for a later
    /// retry (re-running is safe: adds are quantity-additive, and only
    /// failed lines are retained).
    ///
    /// # Errors
    ///
    /// Identity resolution and transport errors. Individual line failures
    /// are logged, not returned.
    #[instrument(skip(self))]
    pub async fn merge_guest_cart(&self) -> Result<(), ApiError> {
        let Some(guest) = self
            .inner
            .storage
            .get_json::<Vec<CartItem>>(keys::GUEST_CART)
        else {
            return Ok(());
        };
        if guest.is_empty() {
            self.inner.storage.remove(keys::GUEST_CART);
            return Ok(());
        }

        // Resolve identity once up front rather than per line.
        self.resolve_user().await?;

        let mut requests = JoinSet::new();
        let total = guest.len();
        for line in guest {
            let api = self.inner.api.clone();
            requests.spawn(async move {
                let request = AddItemRequest {
                    product_id: line.product.id(),
                    quantity: line.quantity,
                    variant_id: line.variant_id,
                };
                api.post_json_unit("/cart/cart/", &request)
                    .await
                    .map_err(|error| (line, error))
            });
        }

        let mut failed = Vec::new();
        while let Some(joined) = requests.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err((line, error))) => {
                    warn!(product = %line.product.id(), %error, "guest cart line failed to merge");
                    failed.push(line);
                }
                Err(error) => warn!(%error, "guest cart merge task panicked"),
            }
        }

        if failed.is_empty() {
            debug!(lines = total, "guest cart merged");
            self.inner.storage.remove(keys::GUEST_CART);
        } else {
            warn!(
                failed = failed.len(),
                total, "guest cart merge incomplete, keeping unmerged lines"
            );
            self.inner.storage.set_json(keys::GUEST_CART, &failed);
        }

        self.refresh().await
    }

    /// Reload the guest cart from storage and publish it. Used when the
    /// session drops back to anonymous.
    pub fn load_guest(&self) {
        let items: Vec<CartItem> = self
            .inner
            .storage
            .get_json(keys::GUEST_CART)
            .unwrap_or_default();
        self.publish(items);
    }

    /// Follow the auth signal: merge and refresh on login, fall back to
    /// the guest cart on logout. Runs until the session is dropped.
    pub fn spawn_session_watcher(&self) -> tokio::task::JoinHandle<()> {
        let cart = self.clone();
        let mut auth = cart.inner.api.session().auth_signal().subscribe();

        tokio::spawn(async move {
            while auth.changed().await.is_ok() {
                let authenticated = *auth.borrow_and_update();
                if authenticated {
                    if let Err(error) = cart.merge_guest_cart().await {
                        warn!(%error, "cart sync after login failed");
                    }
                } else {
                    cart.load_guest();
                }
            }
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Post-mutation refresh. The mutation itself already succeeded, so a
    /// failed re-fetch only costs signal freshness and is logged.
    async fn refresh_logged(&self) {
        if let Err(error) = self.refresh().await {
            warn!(%error, "cart refresh after mutation failed");
        }
    }

    async fn resolve_user(&self) -> Result<UserId, ApiError> {
        if let Some(id) = self.inner.api.session().user_id() {
            return Ok(id);
        }
        let user = crate::auth::fetch_profile(&self.inner.api).await?;
        user.id.ok_or(ApiError::Auth(AuthError::UnknownIdentity))
    }

    fn save_guest(&self, items: Vec<CartItem>) {
        self.inner.storage.set_json(keys::GUEST_CART, &items);
        self.publish(items);
    }

    fn publish(&self, items: Vec<CartItem>) {
        self.inner.storage.set_json(keys::CART_SNAPSHOT, &items);
        self.inner.items.set(items);
    }
}

//! Wishlist with optimistic toggling.
//!
//! Toggles publish the expected state to the signal before the request
//! goes out and roll it back if the backend rejects it, so the heart icon
//! flips instantly.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use storefront_core::{Listing, Product, ProductId, ProductRef, UserId, VariantId, WishlistEntryId};

use crate::auth::AuthError;
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::signal::{Signal, optimistic};

/// One wishlist row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub id: WishlistEntryId,
    pub product: ProductRef,
    #[serde(default)]
    pub variant: Option<VariantId>,
}

#[derive(Serialize)]
struct ToggleRequest {
    user: UserId,
    product: ProductId,
}

/// Typed wrapper over the wishlist endpoints.
#[derive(Clone)]
pub struct WishlistService {
    api: ApiClient,
    items: Signal<Vec<WishlistEntry>>,
}

impl WishlistService {
    pub(crate) fn new(api: ApiClient) -> Self {
        Self {
            api,
            items: Signal::new(Vec::new()),
        }
    }

    /// Current wishlist entries.
    #[must_use]
    pub fn items(&self) -> Vec<WishlistEntry> {
        self.items.get()
    }

    /// Wishlist signal for subscribers.
    #[must_use]
    pub fn items_signal(&self) -> Signal<Vec<WishlistEntry>> {
        self.items.clone()
    }

    /// Re-fetch the wishlist and publish it.
    ///
    /// # Errors
    ///
    /// Transport and backend errors from the wishlist endpoint.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let listing: Listing<WishlistEntry> = self.api.get_json("/catalog/wishlist/").await?;
        self.items.set(listing.into_vec());
        Ok(())
    }

    /// Toggle a product's wishlist membership. Returns `true` when the
    /// product ended up on the list.
    ///
    /// The local state flips immediately and is rolled back if the
    /// backend rejects the toggle. A follow-up refresh swaps the local
    /// placeholder for the backend's row.
    ///
    /// # Errors
    ///
    /// Identity resolution failures and toggle endpoint errors. The local
    /// state is unchanged when an error is returned.
    #[instrument(skip(self, product), fields(product = %product.id))]
    pub async fn toggle(&self, product: &Product) -> Result<bool, ApiError> {
        let user = match self.api.session().user_id() {
            Some(id) => id,
            None => {
                let profile = crate::auth::fetch_profile(&self.api).await?;
                profile.id.ok_or(ApiError::Auth(AuthError::UnknownIdentity))?
            }
        };

        let product_id = product.id;
        let added = !self
            .items
            .get()
            .iter()
            .any(|entry| entry.product.id() == product_id);

        let snapshot = product.clone();
        optimistic(
            &self.items,
            move |items| {
                if added {
                    // Placeholder row until the refresh lands.
                    items.push(WishlistEntry {
                        id: WishlistEntryId::new(0),
                        product: snapshot.into(),
                        variant: None,
                    });
                } else {
                    items.retain(|entry| entry.product.id() != product_id);
                }
            },
            self.api.post_json_unit(
                "/catalog/wishlist/toggle/",
                &ToggleRequest {
                    user,
                    product: product_id,
                },
            ),
        )
        .await?;

        if let Err(error) = self.refresh().await {
            debug!(%error, "wishlist refresh after toggle failed");
        }
        Ok(added)
    }

    /// Remove an entry by id.
    ///
    /// # Errors
    ///
    /// Transport and backend errors from the wishlist endpoint.
    pub async fn remove(&self, entry: WishlistEntryId) -> Result<(), ApiError> {
        self.api.delete(&format!("/catalog/wishlist/{entry}/")).await?;
        self.items.update(|items| items.retain(|e| e.id != entry));
        Ok(())
    }
}

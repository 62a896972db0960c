//! Checkout: shipping address capture and order placement.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{instrument, warn};

use storefront_core::{Order, OrderItem, ShippingAddress, UserId};

use crate::cart::CartManager;
use crate::error::ApiError;
use crate::orders::OrdersService;
use crate::storage::{Storage, StorageExt, keys};

/// Order numbers are capped at this length by the backend schema.
const ORDER_NUMBER_MAX_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No shipping address has been captured for this checkout.
    #[error("A shipping address is required before placing an order")]
    AddressRequired,

    /// The cart has no lines to order.
    #[error("Cannot place an order with an empty cart")]
    EmptyCart,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Drives a checkout from address capture to a placed order.
#[derive(Clone)]
pub struct CheckoutFlow {
    inner: Arc<CheckoutInner>,
}

struct CheckoutInner {
    cart: CartManager,
    orders: OrdersService,
    storage: Arc<dyn Storage>,
    address: RwLock<Option<ShippingAddress>>,
}

impl CheckoutFlow {
    pub(crate) fn new(cart: CartManager, orders: OrdersService, storage: Arc<dyn Storage>) -> Self {
        Self {
            inner: Arc::new(CheckoutInner {
                cart,
                orders,
                storage,
                address: RwLock::new(None),
            }),
        }
    }

    /// Capture the shipping address for this checkout. Persisted so an
    /// interrupted checkout resumes on the review step.
    pub fn set_shipping_address(&self, address: ShippingAddress) {
        self.inner.storage.set_json(keys::CHECKOUT_ADDRESS, &address);
        if let Ok(mut slot) = self.inner.address.write() {
            *slot = Some(address);
        }
    }

    /// The captured shipping address, restoring a persisted one if this
    /// flow has none in memory yet.
    #[must_use]
    pub fn shipping_address(&self) -> Option<ShippingAddress> {
        if let Ok(slot) = self.inner.address.read()
            && slot.is_some()
        {
            return slot.clone();
        }

        let stored: Option<ShippingAddress> = self.inner.storage.get_json(keys::CHECKOUT_ADDRESS);
        if let (Some(address), Ok(mut slot)) = (&stored, self.inner.address.write()) {
            *slot = Some(address.clone());
        }
        stored
    }

    /// Drop any in-progress checkout state.
    pub fn clear_checkout_data(&self) {
        self.inner.storage.remove(keys::CHECKOUT_ADDRESS);
        if let Ok(mut slot) = self.inner.address.write() {
            *slot = None;
        }
    }

    /// Place an order for the current cart contents.
    ///
    /// Validates locally first: an address must be captured and the cart
    /// must be non-empty, and neither failure reaches the network. On
    /// success the cart and checkout state are cleared.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::AddressRequired`], [`CheckoutError::EmptyCart`],
    /// or the order endpoint's [`ApiError`].
    #[instrument(skip(self))]
    pub async fn place_order(&self) -> Result<Order, CheckoutError> {
        let Some(_address) = self.shipping_address() else {
            return Err(CheckoutError::AddressRequired);
        };

        let lines = self.inner.cart.items();
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let total_amount: Decimal = lines.iter().map(storefront_core::CartItem::line_total).sum();
        let items: Vec<OrderItem> = lines
            .iter()
            .map(|line| OrderItem {
                product: line.product.id(),
                quantity: line.quantity,
                price: line.unit_price(),
                variant: line.variant_id,
            })
            .collect();

        let user = self.inner.orders.session_user_id();
        let order = Order {
            id: None,
            user,
            order_number: generate_order_number(user),
            total_amount,
            items,
            status: None,
            created_at: None,
        };

        let placed = self.inner.orders.create(&order).await?;

        // The order exists now; local cleanup failures must not turn a
        // placed order into a reported error.
        if let Err(error) = self.inner.cart.clear().await {
            warn!(%error, "failed to clear cart after placing order");
        }
        self.clear_checkout_data();

        Ok(placed)
    }
}

/// `ORD-<last 8 digits of the epoch-millis timestamp>-<user id or GS>`,
/// truncated to the backend's column width.
fn generate_order_number(user: Option<UserId>) -> String {
    let millis = Utc::now().timestamp_millis().unsigned_abs().to_string();
    let tail = millis
        .get(millis.len().saturating_sub(8)..)
        .unwrap_or(&millis);
    let suffix = user.map_or_else(|| "GS".to_string(), |id| id.to_string());

    format!("ORD-{tail}-{suffix}")
        .chars()
        .take(ORDER_NUMBER_MAX_LEN)
        .collect()
}

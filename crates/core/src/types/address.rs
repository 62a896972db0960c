//! Shipping address captured during checkout.

use serde::{Deserialize, Serialize};

/// Shipping address for an order.
///
/// Held in memory during the checkout flow and persisted locally so a page
/// refresh between the address and payment steps does not lose it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pincode: String,
}

//! Order records.
//!
//! The client constructs the order payload (number, lines, total) but the
//! server is authoritative for persisted order state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderId, ProductId, UserId, VariantId};

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    /// Any status string this client build does not know about.
    #[serde(other)]
    Unknown,
}

/// One line of an order, as sent to and returned by the order endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: ProductId,
    pub quantity: u32,
    /// Unit price at the time of ordering.
    pub price: Decimal,
    #[serde(default)]
    pub variant: Option<VariantId>,
}

/// An order, client-constructed before submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub id: Option<OrderId>,
    #[serde(default)]
    pub user: Option<UserId>,
    pub order_number: String,
    pub total_amount: Decimal,
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One entry of an order's tracking history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusEvent {
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn unknown_status_strings_do_not_fail_decoding() {
        let status: OrderStatus = serde_json::from_str(r#""on_hold""#).expect("decode");
        assert_eq!(status, OrderStatus::Unknown);

        let known: OrderStatus = serde_json::from_str(r#""cancelled""#).expect("decode");
        assert_eq!(known, OrderStatus::Cancelled);
    }

    #[test]
    fn order_payload_shape_matches_backend_contract() {
        let order = Order {
            id: None,
            user: Some(UserId::new(3)),
            order_number: "ORD-12345678-3".into(),
            total_amount: dec!(24.00),
            items: vec![OrderItem {
                product: ProductId::new(7),
                quantity: 3,
                price: dec!(8.00),
                variant: None,
            }],
            status: None,
            created_at: None,
        };

        let value = serde_json::to_value(&order).expect("serialize");
        assert_eq!(value["order_number"], "ORD-12345678-3");
        assert_eq!(value["items"][0]["product"], 7);
        assert_eq!(value["items"][0]["quantity"], 3);
    }
}

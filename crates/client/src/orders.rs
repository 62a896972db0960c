//! Order placement, history, and cancellation.

use storefront_core::{Listing, Order, OrderId, OrderStatusEvent, UserId};

use crate::error::ApiError;
use crate::http::ApiClient;

/// Typed wrapper over the order endpoints.
#[derive(Clone)]
pub struct OrdersService {
    api: ApiClient,
}

impl OrdersService {
    pub(crate) fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub(crate) fn session_user_id(&self) -> Option<UserId> {
        self.api.session().user_id()
    }

    /// The authenticated user's orders.
    ///
    /// # Errors
    ///
    /// Transport and backend errors from the order endpoint.
    pub async fn list(&self) -> Result<Vec<Order>, ApiError> {
        let listing: Listing<Order> = self.api.get_json("/orders/order/").await?;
        Ok(listing.into_vec())
    }

    /// A single order.
    ///
    /// # Errors
    ///
    /// Transport and backend errors, including 404 for an unknown id.
    pub async fn get(&self, id: OrderId) -> Result<Order, ApiError> {
        self.api.get_json(&format!("/orders/order/{id}/")).await
    }

    /// Submit a new order. The backend fills in the id and status.
    ///
    /// # Errors
    ///
    /// [`ApiError::Api`] with the backend's message on rejection (stock
    /// shortfalls, total mismatches).
    pub async fn create(&self, order: &Order) -> Result<Order, ApiError> {
        self.api.post_json("/orders/order/", order).await
    }

    /// Cancel an order that has not shipped yet.
    ///
    /// # Errors
    ///
    /// [`ApiError::Api`] when the order is past the point of cancellation.
    pub async fn cancel(&self, id: OrderId) -> Result<Order, ApiError> {
        self.api
            .patch_json(
                &format!("/orders/order/{id}/"),
                &serde_json::json!({ "status": "cancelled" }),
            )
            .await
    }

    /// The status timeline for an order.
    ///
    /// # Errors
    ///
    /// Transport and backend errors from the history endpoint.
    pub async fn history(&self, id: OrderId) -> Result<Vec<OrderStatusEvent>, ApiError> {
        let listing: Listing<OrderStatusEvent> = self
            .api
            .get_json(&format!("/orders/order/{id}/history/"))
            .await?;
        Ok(listing.into_vec())
    }
}

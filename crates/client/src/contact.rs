//! Contact form submission and message administration.

use serde::{Deserialize, Serialize};

use storefront_core::{ContactMessageId, Listing};

use crate::error::ApiError;
use crate::http::ApiClient;

/// A contact form submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// A stored contact message, as returned by the admin listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactMessage {
    pub id: ContactMessageId,
    #[serde(flatten)]
    pub form: ContactForm,
    #[serde(default)]
    pub resolved: bool,
}

/// Typed wrapper over the contact endpoints.
#[derive(Clone)]
pub struct ContactService {
    api: ApiClient,
}

impl ContactService {
    pub(crate) fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Submit a contact form. Public, works for anonymous visitors.
    ///
    /// # Errors
    ///
    /// Transport and backend validation errors.
    pub async fn submit(&self, form: &ContactForm) -> Result<(), ApiError> {
        self.api.post_json_unit("/contact/contact/", form).await
    }

    /// All stored contact messages (staff only).
    ///
    /// # Errors
    ///
    /// Transport and backend errors, including 403 for non-staff users.
    pub async fn list(&self) -> Result<Vec<ContactMessage>, ApiError> {
        let listing: Listing<ContactMessage> = self.api.get_json("/contact/contact/").await?;
        Ok(listing.into_vec())
    }

    /// Mark a message resolved or unresolved (staff only).
    ///
    /// # Errors
    ///
    /// Transport and backend errors.
    pub async fn set_resolved(&self, id: ContactMessageId, resolved: bool) -> Result<(), ApiError> {
        self.api
            .patch_json_unit(
                &format!("/contact/contact/{id}/"),
                &serde_json::json!({ "resolved": resolved }),
            )
            .await
    }
}

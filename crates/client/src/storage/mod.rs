//! Client-local persistent storage.
//!
//! The browser storefront kept its durable client state in
//! `localStorage`: plain JSON strings under fixed keys. [`Storage`] is
//! that contract as a trait, with an in-memory backend for tests and
//! ephemeral use and a file backend for durable host processes.
//!
//! Writes are best-effort: a storage failure is logged, never fatal, so a
//! broken disk degrades to session-only state instead of breaking the
//! shop.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Fixed keys for everything the client persists locally.
pub mod keys {
    /// Access token.
    pub const ACCESS_TOKEN: &str = "auth_token";
    /// Refresh token.
    pub const REFRESH_TOKEN: &str = "auth_refresh_token";
    /// Authorization scheme label (`Bearer`/`Token`).
    pub const TOKEN_PREFIX: &str = "auth_token_prefix";
    /// Email of the last successful login, for identity resolution.
    pub const LAST_LOGIN_EMAIL: &str = "last_user_email";
    /// Guest cart lines awaiting merge.
    pub const GUEST_CART: &str = "guest_cart";
    /// Snapshot of the current cart, whichever backend owns it. Restored
    /// at startup for authenticated sessions until the first refetch.
    pub const CART_SNAPSHOT: &str = "cart_items";
    /// Shipping address saved between checkout steps.
    pub const CHECKOUT_ADDRESS: &str = "checkout_address";
}

/// String key-value store with `localStorage` semantics.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);
    /// Delete `key` if present.
    fn remove(&self, key: &str);
}

/// JSON helpers over any [`Storage`].
pub trait StorageExt: Storage {
    /// Read and decode a JSON value; decode failures are logged and
    /// treated as absent (the stored value is from an older build).
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(key, %error, "discarding unreadable stored value");
                None
            }
        }
    }

    /// Encode and store a value as JSON.
    fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, &raw),
            Err(error) => tracing::warn!(key, %error, "failed to encode value for storage"),
        }
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}

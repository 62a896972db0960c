//! Core types for the storefront client.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod cart;
pub mod id;
pub mod listing;
pub mod order;
pub mod product;
pub mod user;

pub use address::ShippingAddress;
pub use cart::{CartItem, ProductRef};
pub use id::*;
pub use listing::Listing;
pub use order::{Order, OrderItem, OrderStatus, OrderStatusEvent};
pub use product::{Category, Product, ProductVariant};
pub use user::User;

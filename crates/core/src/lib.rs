//! Storefront Core - Shared domain types.
//!
//! This crate provides the common types used across the storefront client
//! SDK: type-safe IDs, users, products, cart lines, orders, and shipping
//! addresses, plus the [`Listing`] union that absorbs the backend's
//! inconsistent collection response shapes.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
